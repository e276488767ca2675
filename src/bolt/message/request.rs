//! Bolt protocol request messages.
//!
//! Request messages are sent from the client to the server. Their field
//! layout depends on the negotiated [`BoltVersion`], so encoding takes the
//! version as an argument; decoding (used by server-side test doubles)
//! recognises either layout from the field count.

use std::collections::HashMap;
use std::fmt;

use super::tag;
use crate::bolt::handshake::BoltVersion;
use crate::bolt::packstream::{Fields, PackStreamError, PackStreamStructure, PackStreamValue};

/// Credentials sent during authentication.
#[derive(Clone, PartialEq)]
pub struct AuthToken {
    /// Authentication scheme ("none", "basic", "bearer")
    pub scheme: String,
    /// Principal (username)
    pub principal: Option<String>,
    /// Credentials (password or token)
    pub credentials: Option<String>,
    /// Realm
    pub realm: Option<String>,
}

impl AuthToken {
    /// No authentication.
    pub fn none() -> Self {
        Self {
            scheme: "none".to_string(),
            principal: None,
            credentials: None,
            realm: None,
        }
    }

    /// Username and password.
    pub fn basic(principal: &str, credentials: &str) -> Self {
        Self {
            scheme: "basic".to_string(),
            principal: Some(principal.to_string()),
            credentials: Some(credentials.to_string()),
            realm: None,
        }
    }

    /// Bearer token (SSO).
    pub fn bearer(token: &str) -> Self {
        Self {
            scheme: "bearer".to_string(),
            principal: None,
            credentials: Some(token.to_string()),
            realm: None,
        }
    }

    /// Set the realm.
    pub fn with_realm(mut self, realm: &str) -> Self {
        self.realm = Some(realm.to_string());
        self
    }

    /// Auth entries as sent on the wire.
    pub fn to_map(&self) -> HashMap<String, PackStreamValue> {
        let mut map = HashMap::new();
        map.insert("scheme".to_string(), PackStreamValue::from(self.scheme.as_str()));
        let optional = [
            ("principal", &self.principal),
            ("credentials", &self.credentials),
            ("realm", &self.realm),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                map.insert(key.to_string(), PackStreamValue::from(v.as_str()));
            }
        }
        map
    }

    /// Read auth entries out of a HELLO, INIT or LOGON map.
    pub fn from_map(map: &HashMap<String, PackStreamValue>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Self {
            scheme: get("scheme").unwrap_or_else(|| "none".to_string()),
            principal: get("principal"),
            credentials: get("credentials"),
            realm: get("realm"),
        }
    }
}

impl Default for AuthToken {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("scheme", &self.scheme)
            .field("principal", &self.principal)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("realm", &self.realm)
            .finish()
    }
}

/// All Bolt request messages this client sends.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltRequest {
    /// HELLO / INIT - open the session
    Hello(HelloMessage),
    /// LOGON - authenticate (Bolt 5.1+)
    Logon(LogonMessage),
    /// GOODBYE - close the connection gracefully
    Goodbye,
    /// RESET - return the server to its ready state
    Reset,
    /// ACK_FAILURE - acknowledge a failure (Bolt 1)
    AckFailure,
    /// RUN - submit a query
    Run(RunMessage),
    /// PULL / PULL_ALL - fetch records
    Pull(PullMessage),
    /// DISCARD / DISCARD_ALL - drop records
    Discard(DiscardMessage),
}

impl BoltRequest {
    /// Message tag.
    pub fn tag(&self) -> u8 {
        match self {
            BoltRequest::Hello(_) => tag::HELLO,
            BoltRequest::Logon(_) => tag::LOGON,
            BoltRequest::Goodbye => tag::GOODBYE,
            BoltRequest::Reset => tag::RESET,
            BoltRequest::AckFailure => tag::ACK_FAILURE,
            BoltRequest::Run(_) => tag::RUN,
            BoltRequest::Pull(_) => tag::PULL,
            BoltRequest::Discard(_) => tag::DISCARD,
        }
    }

    /// Message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltRequest::Hello(_) => "HELLO",
            BoltRequest::Logon(_) => "LOGON",
            BoltRequest::Goodbye => "GOODBYE",
            BoltRequest::Reset => "RESET",
            BoltRequest::AckFailure => "ACK_FAILURE",
            BoltRequest::Run(_) => "RUN",
            BoltRequest::Pull(_) => "PULL",
            BoltRequest::Discard(_) => "DISCARD",
        }
    }

    /// Encode for `version`.
    pub fn to_structure(&self, version: BoltVersion) -> PackStreamStructure {
        match self {
            BoltRequest::Hello(msg) => msg.to_structure(version),
            BoltRequest::Logon(msg) => msg.to_structure(),
            BoltRequest::Run(msg) => msg.to_structure(version),
            BoltRequest::Pull(msg) => PackStreamStructure::new(tag::PULL, msg.0.fields(version)),
            BoltRequest::Discard(msg) => PackStreamStructure::new(tag::DISCARD, msg.0.fields(version)),
            BoltRequest::Goodbye | BoltRequest::Reset | BoltRequest::AckFailure => {
                PackStreamStructure::empty(self.tag())
            }
        }
    }

    /// Decode a request in either the Bolt 1 or the 4.x/5.x layout.
    pub fn from_structure(s: PackStreamStructure) -> Result<Self, PackStreamError> {
        match s.tag {
            tag::HELLO => Ok(BoltRequest::Hello(HelloMessage::from_structure(s)?)),
            tag::LOGON => Ok(BoltRequest::Logon(LogonMessage::from_structure(s)?)),
            tag::GOODBYE => Ok(BoltRequest::Goodbye),
            tag::RESET => Ok(BoltRequest::Reset),
            tag::ACK_FAILURE => Ok(BoltRequest::AckFailure),
            tag::RUN => Ok(BoltRequest::Run(RunMessage::from_structure(s)?)),
            tag::PULL => Ok(BoltRequest::Pull(PullMessage(StreamLimit::from_structure("PULL", s)?))),
            tag::DISCARD => Ok(BoltRequest::Discard(DiscardMessage(StreamLimit::from_structure(
                "DISCARD", s,
            )?))),
            other => Err(PackStreamError::InvalidStructure(format!(
                "Unknown request message tag: 0x{:02X}",
                other
            ))),
        }
    }
}

/// HELLO message (INIT in Bolt 1).
#[derive(Debug, Clone, PartialEq)]
pub struct HelloMessage {
    /// User agent string
    pub user_agent: String,
    /// Credentials, unless they go in a separate LOGON
    pub auth: Option<AuthToken>,
    /// Other extra entries
    pub extra: HashMap<String, PackStreamValue>,
}

impl HelloMessage {
    /// Create a HELLO without credentials.
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            auth: None,
            extra: HashMap::new(),
        }
    }

    /// Attach credentials.
    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Encode as INIT(user_agent, auth) for Bolt 1 and HELLO(extra) otherwise.
    pub fn to_structure(&self, version: BoltVersion) -> PackStreamStructure {
        if version.is_legacy() {
            let auth = self.auth.clone().unwrap_or_default();
            return PackStreamStructure::new(
                tag::HELLO,
                vec![
                    PackStreamValue::from(self.user_agent.as_str()),
                    PackStreamValue::Map(auth.to_map()),
                ],
            );
        }

        let mut extra = self.extra.clone();
        extra.insert("user_agent".to_string(), PackStreamValue::from(self.user_agent.as_str()));
        if let Some(auth) = &self.auth {
            extra.extend(auth.to_map());
        }
        PackStreamStructure::new(tag::HELLO, vec![PackStreamValue::Map(extra)])
    }

    /// Decode either layout.
    pub fn from_structure(s: PackStreamStructure) -> Result<Self, PackStreamError> {
        let mut fields = Fields::new("HELLO", s, 1..=2)?;
        if fields.remaining() == 2 {
            let user_agent = fields.string("user_agent")?;
            let auth = AuthToken::from_map(&fields.map("auth")?);
            return Ok(Self {
                user_agent,
                auth: Some(auth),
                extra: HashMap::new(),
            });
        }

        let mut extra = fields.map("extra")?;
        let user_agent = extra
            .remove("user_agent")
            .and_then(PackStreamValue::into_string)
            .unwrap_or_default();
        let auth = extra.contains_key("scheme").then(|| AuthToken::from_map(&extra));
        for key in ["scheme", "principal", "credentials", "realm"] {
            extra.remove(key);
        }
        Ok(Self {
            user_agent,
            auth,
            extra,
        })
    }
}

/// LOGON message (Bolt 5.1+).
#[derive(Debug, Clone, PartialEq)]
pub struct LogonMessage {
    /// Credentials
    pub auth: AuthToken,
}

impl LogonMessage {
    /// Create a LOGON.
    pub fn new(auth: AuthToken) -> Self {
        Self { auth }
    }

    /// Encode.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::LOGON, vec![PackStreamValue::Map(self.auth.to_map())])
    }

    /// Decode.
    pub fn from_structure(s: PackStreamStructure) -> Result<Self, PackStreamError> {
        let mut fields = Fields::new("LOGON", s, 1..=1)?;
        Ok(Self::new(AuthToken::from_map(&fields.map("auth")?)))
    }
}

/// RUN message.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMessage {
    /// Query text
    pub query: String,
    /// Query parameters
    pub parameters: HashMap<String, PackStreamValue>,
    /// Extra metadata (`db`, `tx_metadata`, ...); not sent in Bolt 1
    pub extra: HashMap<String, PackStreamValue>,
}

impl RunMessage {
    /// Create a RUN without parameters.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            parameters: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    /// Set query parameters.
    pub fn with_parameters(mut self, params: HashMap<String, PackStreamValue>) -> Self {
        self.parameters = params;
        self
    }

    /// Set extra metadata.
    pub fn with_extra(mut self, extra: HashMap<String, PackStreamValue>) -> Self {
        self.extra = extra;
        self
    }

    /// Encode for `version`.
    pub fn to_structure(&self, version: BoltVersion) -> PackStreamStructure {
        let mut fields = vec![
            PackStreamValue::from(self.query.as_str()),
            PackStreamValue::Map(self.parameters.clone()),
        ];
        if version.has_extra_fields() {
            fields.push(PackStreamValue::Map(self.extra.clone()));
        }
        PackStreamStructure::new(tag::RUN, fields)
    }

    /// Decode either layout.
    pub fn from_structure(s: PackStreamStructure) -> Result<Self, PackStreamError> {
        let mut fields = Fields::new("RUN", s, 2..=3)?;
        let query = fields.string("query")?;
        let parameters = fields.map("parameters")?;
        let extra = if fields.remaining() > 0 {
            fields.map("extra")?
        } else {
            HashMap::new()
        };
        Ok(Self {
            query,
            parameters,
            extra,
        })
    }
}

/// How many records a PULL or DISCARD covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimit {
    /// Record count, -1 for all
    pub n: i64,
    /// Query id, for explicit transactions
    pub qid: Option<i64>,
}

impl StreamLimit {
    fn fields(&self, version: BoltVersion) -> Vec<PackStreamValue> {
        if !version.has_extra_fields() {
            return Vec::new();
        }
        let mut extra = HashMap::new();
        extra.insert("n".to_string(), PackStreamValue::Integer(self.n));
        if let Some(qid) = self.qid {
            extra.insert("qid".to_string(), PackStreamValue::Integer(qid));
        }
        vec![PackStreamValue::Map(extra)]
    }

    fn from_structure(name: &'static str, s: PackStreamStructure) -> Result<Self, PackStreamError> {
        let mut fields = Fields::new(name, s, 0..=1)?;
        if fields.remaining() == 0 {
            return Ok(Self { n: -1, qid: None });
        }
        let extra = fields.map("extra")?;
        Ok(Self {
            n: extra.get("n").and_then(PackStreamValue::as_int).unwrap_or(-1),
            qid: extra.get("qid").and_then(PackStreamValue::as_int),
        })
    }
}

/// PULL message (PULL_ALL in Bolt 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullMessage(pub StreamLimit);

impl PullMessage {
    /// Pull everything.
    pub fn all() -> Self {
        Self::with_n(-1)
    }

    /// Pull at most `n` records (-1 for all).
    pub fn with_n(n: i64) -> Self {
        Self(StreamLimit { n, qid: None })
    }

    /// Record count.
    pub fn n(&self) -> i64 {
        self.0.n
    }
}

/// DISCARD message (DISCARD_ALL in Bolt 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardMessage(pub StreamLimit);

impl DiscardMessage {
    /// Discard everything.
    pub fn all() -> Self {
        Self(StreamLimit { n: -1, qid: None })
    }
}
