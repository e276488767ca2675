//! Bolt protocol error types.

use std::fmt;
use std::io;

use super::packstream::PackStreamError;

/// Result type for Bolt operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Errors raised below the session layer: framing, handshake, PackStream
/// and message shape.
#[derive(Debug)]
pub enum BoltError {
    /// I/O error on the transport
    Io(io::Error),

    /// Version negotiation failed
    Handshake(HandshakeError),

    /// PackStream decoding or encoding failed
    PackStream(PackStreamError),

    /// Message with an unexpected tag or shape
    Protocol(String),

    /// Message exceeds the configured limit
    MessageTooLarge {
        /// Size accumulated so far
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Peer closed the connection
    ConnectionClosed,
}

impl BoltError {
    /// Whether the error came from the transport rather than from the bytes
    /// it delivered.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BoltError::Io(_)
                | BoltError::ConnectionClosed
                | BoltError::Handshake(HandshakeError::ConnectionClosed)
        )
    }
}

impl fmt::Display for BoltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoltError::Io(e) => write!(f, "I/O error: {}", e),
            BoltError::Handshake(e) => write!(f, "Handshake error: {}", e),
            BoltError::PackStream(e) => write!(f, "PackStream error: {}", e),
            BoltError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            BoltError::MessageTooLarge { size, max } => {
                write!(f, "Message too large: {} bytes (max: {})", size, max)
            }
            BoltError::ConnectionClosed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for BoltError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoltError::Io(e) => Some(e),
            BoltError::Handshake(e) => Some(e),
            BoltError::PackStream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BoltError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => BoltError::ConnectionClosed,
            _ => BoltError::Io(err),
        }
    }
}

impl From<HandshakeError> for BoltError {
    fn from(err: HandshakeError) -> Self {
        BoltError::Handshake(err)
    }
}

impl From<PackStreamError> for BoltError {
    fn from(err: PackStreamError) -> Self {
        BoltError::PackStream(err)
    }
}

/// Handshake-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Client sent something other than the Bolt preamble
    InvalidMagic {
        /// The Bolt magic
        expected: [u8; 4],
        /// What arrived instead
        received: [u8; 4],
    },

    /// Server and client share no protocol version
    NoCompatibleVersion,

    /// Server answered with a version this client never proposed
    UnexpectedVersion([u8; 4]),

    /// Connection closed during handshake
    ConnectionClosed,
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::InvalidMagic { expected, received } => write!(
                f,
                "Invalid magic number: expected {:02X?}, received {:02X?}",
                expected, received
            ),
            HandshakeError::NoCompatibleVersion => write!(f, "No compatible protocol version found"),
            HandshakeError::UnexpectedVersion(bytes) => {
                write!(f, "Server chose a version that was not proposed: {:02X?}", bytes)
            }
            HandshakeError::ConnectionClosed => write!(f, "Connection closed during handshake"),
        }
    }
}

impl std::error::Error for HandshakeError {}

/// Well-known server error codes.
pub struct BoltErrorCode;

#[allow(missing_docs)]
impl BoltErrorCode {
    pub const AUTHENTICATION_FAILED: &'static str = "Neo.ClientError.Security.Unauthorized";
    pub const AUTHORIZATION_EXPIRED: &'static str = "Neo.ClientError.Security.AuthorizationExpired";
    pub const TOKEN_EXPIRED: &'static str = "Neo.ClientError.Security.TokenExpired";
    pub const SYNTAX_ERROR: &'static str = "Neo.ClientError.Statement.SyntaxError";
    pub const REQUEST_INVALID: &'static str = "Neo.ClientError.Request.Invalid";

    /// Prefix shared by errors about malformed or out-of-order requests.
    pub const REQUEST_PREFIX: &'static str = "Neo.ClientError.Request.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_error_display() {
        let err = HandshakeError::InvalidMagic {
            expected: [0x60, 0x60, 0xB0, 0x17],
            received: [0x47, 0x45, 0x54, 0x20],
        };
        assert!(err.to_string().contains("Invalid magic"));
        assert!(HandshakeError::NoCompatibleVersion.to_string().contains("No compatible"));
    }

    #[test]
    fn test_eof_means_closed() {
        let err: BoltError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, BoltError::ConnectionClosed));
        assert!(err.is_transport());

        let err: BoltError = io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into();
        assert!(matches!(err, BoltError::Io(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_decode_errors_are_not_transport_errors() {
        let err: BoltError = PackStreamError::UnexpectedEof.into();
        assert!(!err.is_transport());
        assert!(!BoltError::Handshake(HandshakeError::NoCompatibleVersion).is_transport());
    }
}
