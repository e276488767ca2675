//! Bolt protocol response messages.
//!
//! Response messages are sent from the server to the client. Encoding is
//! only needed by in-process test servers.

use std::collections::HashMap;
use std::fmt;

use super::tag;
use crate::bolt::error::BoltErrorCode;
use crate::bolt::packstream::{Fields, PackStreamError, PackStreamStructure, PackStreamValue};

/// All Bolt response messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltResponse {
    /// SUCCESS - the request completed
    Success(SuccessMessage),
    /// RECORD - one result row
    Record(RecordMessage),
    /// FAILURE - the request failed
    Failure(FailureMessage),
    /// IGNORED - the request was skipped (connection in a failed state)
    Ignored,
}

impl BoltResponse {
    /// Message tag.
    pub fn tag(&self) -> u8 {
        match self {
            BoltResponse::Success(_) => tag::SUCCESS,
            BoltResponse::Record(_) => tag::RECORD,
            BoltResponse::Failure(_) => tag::FAILURE,
            BoltResponse::Ignored => tag::IGNORED,
        }
    }

    /// Message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    /// Encode.
    pub fn to_structure(&self) -> PackStreamStructure {
        match self {
            BoltResponse::Success(msg) => {
                PackStreamStructure::new(tag::SUCCESS, vec![PackStreamValue::Map(msg.metadata.clone())])
            }
            BoltResponse::Record(msg) => {
                PackStreamStructure::new(tag::RECORD, vec![PackStreamValue::List(msg.fields.clone())])
            }
            BoltResponse::Failure(msg) => msg.to_structure(),
            BoltResponse::Ignored => PackStreamStructure::empty(tag::IGNORED),
        }
    }

    /// Decode.
    pub fn from_structure(s: PackStreamStructure) -> Result<Self, PackStreamError> {
        match s.tag {
            tag::SUCCESS => {
                let mut fields = Fields::new("SUCCESS", s, 0..=1)?;
                let metadata = if fields.remaining() > 0 {
                    fields.map("metadata")?
                } else {
                    HashMap::new()
                };
                Ok(BoltResponse::Success(SuccessMessage::with_metadata(metadata)))
            }
            tag::RECORD => {
                let mut fields = Fields::new("RECORD", s, 1..=1)?;
                Ok(BoltResponse::Record(RecordMessage::new(fields.list("fields")?)))
            }
            tag::FAILURE => Ok(BoltResponse::Failure(FailureMessage::from_structure(s)?)),
            tag::IGNORED => Ok(BoltResponse::Ignored),
            other => Err(PackStreamError::InvalidStructure(format!(
                "Unknown response message tag: 0x{:02X}",
                other
            ))),
        }
    }
}

/// SUCCESS message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: HashMap<String, PackStreamValue>,
}

impl SuccessMessage {
    /// SUCCESS with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// SUCCESS with metadata.
    pub fn with_metadata(metadata: HashMap<String, PackStreamValue>) -> Self {
        Self { metadata }
    }

    /// Add a metadata entry.
    pub fn add(&mut self, key: &str, value: impl Into<PackStreamValue>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Metadata entry.
    pub fn get(&self, key: &str) -> Option<&PackStreamValue> {
        self.metadata.get(key)
    }

    /// Server agent from a HELLO reply.
    pub fn server(&self) -> Option<&str> {
        self.get("server").and_then(|v| v.as_str())
    }

    /// Connection id from a HELLO reply.
    pub fn connection_id(&self) -> Option<&str> {
        self.get("connection_id").and_then(|v| v.as_str())
    }

    /// Column names from a RUN reply.
    ///
    /// Returns `None` if the entry is missing or is not a list of strings.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.get("fields")?
            .as_list()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Query id from a RUN reply.
    pub fn qid(&self) -> Option<i64> {
        self.get("qid").and_then(|v| v.as_int())
    }

    /// Whether a PULL left records on the server.
    pub fn has_more(&self) -> bool {
        self.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Milliseconds until the first record was available.
    pub fn t_first(&self) -> Option<i64> {
        self.get("t_first")
            .or_else(|| self.get("result_available_after"))
            .and_then(|v| v.as_int())
    }

    /// Milliseconds until the last record was consumed.
    pub fn t_last(&self) -> Option<i64> {
        self.get("t_last")
            .or_else(|| self.get("result_consumed_after"))
            .and_then(|v| v.as_int())
    }

    /// Query type: "r", "w", "rw" or "s".
    pub fn query_type(&self) -> Option<&str> {
        self.get("type").and_then(|v| v.as_str())
    }

    /// Update counters.
    pub fn stats(&self) -> Option<&HashMap<String, PackStreamValue>> {
        self.get("stats").and_then(|v| v.as_map())
    }

    /// Bookmark.
    pub fn bookmark(&self) -> Option<&str> {
        self.get("bookmark").and_then(|v| v.as_str())
    }

    /// Database the query ran against.
    pub fn db(&self) -> Option<&str> {
        self.get("db").and_then(|v| v.as_str())
    }

    /// A HELLO reply.
    pub fn hello_success(server: &str, connection_id: &str) -> Self {
        let mut msg = Self::new();
        msg.add("server", server);
        msg.add("connection_id", connection_id);
        msg
    }

    /// A RUN reply.
    pub fn run_success(fields: &[&str]) -> Self {
        let mut msg = Self::new();
        let list: Vec<PackStreamValue> = fields.iter().map(|f| PackStreamValue::from(*f)).collect();
        msg.add("fields", list);
        msg.add("t_first", 0i64);
        msg
    }

    /// A PULL or DISCARD reply.
    pub fn streaming_success(has_more: bool) -> Self {
        let mut msg = Self::new();
        if has_more {
            msg.add("has_more", true);
        } else {
            msg.add("t_last", 0i64);
        }
        msg
    }
}

/// RECORD message.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMessage {
    /// Field values, one per column
    pub fields: Vec<PackStreamValue>,
}

impl RecordMessage {
    /// Create a RECORD.
    pub fn new(fields: Vec<PackStreamValue>) -> Self {
        Self { fields }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// FAILURE message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    /// Server error code, e.g. `Neo.ClientError.Statement.SyntaxError`
    pub code: String,
    /// Human readable message
    pub message: String,
}

impl FailureMessage {
    /// Create a FAILURE.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Syntax error.
    pub fn syntax_error(message: &str) -> Self {
        Self::new(BoltErrorCode::SYNTAX_ERROR, message)
    }

    /// Authentication error.
    pub fn auth_error(message: &str) -> Self {
        Self::new(BoltErrorCode::AUTHENTICATION_FAILED, message)
    }

    /// Classification part of the code, e.g. "ClientError".
    pub fn classification(&self) -> &str {
        self.code.split('.').nth(1).unwrap_or("Unknown")
    }

    /// Whether RESET cannot bring the connection back.
    ///
    /// Malformed requests and expired credentials leave the server side of
    /// the connection unusable.
    pub fn is_fatal(&self) -> bool {
        self.code.starts_with(BoltErrorCode::REQUEST_PREFIX)
            || self.code == BoltErrorCode::AUTHORIZATION_EXPIRED
            || self.code == BoltErrorCode::TOKEN_EXPIRED
    }

    /// Encode.
    pub fn to_structure(&self) -> PackStreamStructure {
        let mut metadata = HashMap::new();
        metadata.insert("code".to_string(), PackStreamValue::from(self.code.as_str()));
        metadata.insert("message".to_string(), PackStreamValue::from(self.message.as_str()));
        PackStreamStructure::new(tag::FAILURE, vec![PackStreamValue::Map(metadata)])
    }

    /// Decode. Missing entries become empty strings.
    pub fn from_structure(s: PackStreamStructure) -> Result<Self, PackStreamError> {
        let mut fields = Fields::new("FAILURE", s, 1..=1)?;
        let metadata = fields.map("metadata")?;
        let get = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Ok(Self {
            code: get("code"),
            message: get("message"),
        })
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
