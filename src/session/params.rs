//! Connection parameters.

use std::fmt;

use crate::bolt::codec::DEFAULT_MAX_MESSAGE_SIZE;
use crate::bolt::message::AuthToken;
use crate::bolt::packstream::DEFAULT_MAX_DEPTH;

/// Whether the connection must be encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain TCP
    #[default]
    Disable,
    /// TLS required
    Require,
}

/// Credentials.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Auth {
    /// No authentication
    #[default]
    None,
    /// Username and password
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
        /// Realm
        realm: Option<String>,
    },
    /// Bearer token
    Bearer(String),
}

impl Auth {
    /// Username and password without a realm.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
            realm: None,
        }
    }

    /// Wire form.
    pub fn to_token(&self) -> AuthToken {
        match self {
            Auth::None => AuthToken::none(),
            Auth::Basic {
                username,
                password,
                realm,
            } => {
                let token = AuthToken::basic(username, password);
                match realm {
                    Some(realm) => token.with_realm(realm),
                    None => token,
                }
            }
            Auth::Bearer(token) => AuthToken::bearer(token),
        }
    }

    /// Scheme name, safe to log.
    pub fn scheme(&self) -> &'static str {
        match self {
            Auth::None => "none",
            Auth::Basic { .. } => "basic",
            Auth::Bearer(_) => "bearer",
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => write!(f, "None"),
            Auth::Basic { username, realm, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("realm", realm)
                .finish(),
            Auth::Bearer(_) => write!(f, "Bearer(<redacted>)"),
        }
    }
}

/// Everything a session needs to connect.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Encryption requirement
    pub ssl_mode: SslMode,
    /// Credentials
    pub auth: Auth,
    /// User agent sent in HELLO
    pub user_agent: String,
    /// Records per PULL, -1 for all
    pub fetch_size: i64,
    /// Largest accepted message in bytes
    pub max_message_size: usize,
    /// Deepest accepted value nesting
    pub max_depth: usize,
}

impl SessionParams {
    /// Start a builder from the defaults.
    pub fn builder() -> SessionParamsBuilder {
        SessionParamsBuilder {
            params: Self::default(),
        }
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7687,
            ssl_mode: SslMode::Disable,
            auth: Auth::None,
            user_agent: format!("mgbolt/{}", env!("CARGO_PKG_VERSION")),
            fetch_size: -1,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Builder for [`SessionParams`].
#[derive(Debug, Clone)]
pub struct SessionParamsBuilder {
    params: SessionParams,
}

impl SessionParamsBuilder {
    /// Server host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.params.host = host.into();
        self
    }

    /// Server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.params.port = port;
        self
    }

    /// Encryption requirement.
    pub fn with_ssl_mode(mut self, mode: SslMode) -> Self {
        self.params.ssl_mode = mode;
        self
    }

    /// Credentials.
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.params.auth = auth;
        self
    }

    /// User agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.params.user_agent = user_agent.into();
        self
    }

    /// Records per PULL. Zero and other negative values mean "all".
    pub fn with_fetch_size(mut self, size: i64) -> Self {
        self.params.fetch_size = if size > 0 { size } else { -1 };
        self
    }

    /// Message size limit.
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.params.max_message_size = bytes;
        self
    }

    /// Value nesting limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.params.max_depth = depth;
        self
    }

    /// Finish.
    pub fn build(self) -> SessionParams {
        self.params
    }
}
