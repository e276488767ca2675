//! Session error types.

use std::fmt;

use thiserror::Error;

use crate::bolt::BoltError;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced to session callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Malformed bytes, unexpected message, version mismatch
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server rejected the credentials
    #[error("Authentication failed: {code} - {message}")]
    AuthFailed {
        /// Server error code
        code: String,
        /// Server message
        message: String,
    },

    /// The server rejected a query
    #[error("Query failed: {code} - {message}")]
    QueryFailed {
        /// Server error code
        code: String,
        /// Server message
        message: String,
    },

    /// Operation not allowed in the current phase
    #[error("Bad call: {0}")]
    BadCall(String),

    /// Connect, read or write failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Caller-facing error class of a [`SessionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// [`SessionError::Protocol`]
    Protocol,
    /// [`SessionError::AuthFailed`]
    AuthFailed,
    /// [`SessionError::QueryFailed`]
    QueryFailed,
    /// [`SessionError::BadCall`]
    BadCall,
    /// [`SessionError::Transport`]
    Transport,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Protocol => "PROTOCOL_ERROR",
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::QueryFailed => "QUERY_FAILED",
            ErrorCode::BadCall => "BAD_CALL",
            ErrorCode::Transport => "TRANSPORT_ERROR",
        };
        f.write_str(name)
    }
}

impl SessionError {
    /// Protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Authentication failure.
    pub fn auth_failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthFailed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Query failure.
    pub fn query_failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Call made in the wrong phase.
    pub fn bad_call(msg: impl Into<String>) -> Self {
        Self::BadCall(msg.into())
    }

    /// Transport failure.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Error class.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::Protocol(_) => ErrorCode::Protocol,
            SessionError::AuthFailed { .. } => ErrorCode::AuthFailed,
            SessionError::QueryFailed { .. } => ErrorCode::QueryFailed,
            SessionError::BadCall(_) => ErrorCode::BadCall,
            SessionError::Transport(_) => ErrorCode::Transport,
        }
    }

    /// Server error code for auth and query failures.
    pub fn server_code(&self) -> Option<&str> {
        match self {
            SessionError::AuthFailed { code, .. } | SessionError::QueryFailed { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<BoltError> for SessionError {
    fn from(err: BoltError) -> Self {
        if err.is_transport() {
            SessionError::Transport(err.to_string())
        } else {
            SessionError::Protocol(err.to_string())
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::from(BoltError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::error::HandshakeError;
    use crate::bolt::packstream::PackStreamError;
    use std::io;

    #[test]
    fn test_codes() {
        assert_eq!(SessionError::bad_call("pull").code(), ErrorCode::BadCall);
        assert_eq!(SessionError::query_failed("c", "m").code(), ErrorCode::QueryFailed);
        assert_eq!(ErrorCode::BadCall.to_string(), "BAD_CALL");
    }

    #[test]
    fn test_from_bolt_error() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(SessionError::from(BoltError::Io(io_err)).code(), ErrorCode::Transport);
        assert_eq!(SessionError::from(BoltError::ConnectionClosed).code(), ErrorCode::Transport);
        assert_eq!(
            SessionError::from(BoltError::Handshake(HandshakeError::ConnectionClosed)).code(),
            ErrorCode::Transport
        );
        assert_eq!(
            SessionError::from(BoltError::Handshake(HandshakeError::NoCompatibleVersion)).code(),
            ErrorCode::Protocol
        );
        assert_eq!(
            SessionError::from(BoltError::PackStream(PackStreamError::UnexpectedEof)).code(),
            ErrorCode::Protocol
        );
        assert_eq!(
            SessionError::from(BoltError::MessageTooLarge { size: 10, max: 5 }).code(),
            ErrorCode::Protocol
        );
    }

    #[test]
    fn test_display() {
        let err = SessionError::query_failed("Neo.ClientError.Statement.SyntaxError", "bad");
        assert_eq!(err.to_string(), "Query failed: Neo.ClientError.Statement.SyntaxError - bad");
        assert_eq!(err.server_code(), Some("Neo.ClientError.Statement.SyntaxError"));
    }
}
