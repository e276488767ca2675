//! # Bolt Protocol
//!
//! The wire layer under [`crate::session`]:
//!
//! - [`packstream`] - binary serialization of every value Bolt carries
//! - [`message`] - request and response messages (INIT/HELLO, RUN, PULL, ...)
//! - [`handshake`] - version negotiation
//! - [`codec`] - chunked message framing
//! - [`error`] - protocol error types
//!
//! ## Protocol Versions
//!
//! Bolt 1, 4.0 through 4.4 and 5.0 through 5.2 are understood. The
//! differences that matter here are message layout (Bolt 1 has no extra
//! maps), authentication (LOGON from 5.1), element ids and UTC datetimes
//! (from 5.0).

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;

pub use codec::{BoltCodec, BoltRequestCodec, BoltResponseCodec};
pub use error::{BoltError, BoltErrorCode, BoltResult, HandshakeError};
pub use handshake::{BoltVersion, VersionRange, BOLT_MAGIC, HANDSHAKE_RESPONSE_SIZE, HANDSHAKE_SIZE};
pub use message::{
    AuthToken, BoltRequest, BoltResponse, DiscardMessage, FailureMessage, HelloMessage,
    LogonMessage, Notification, PullMessage, QueryStats, QueryType, RecordMessage, RunMessage,
    SuccessMessage,
};
pub use packstream::{PackStreamError, PackStreamStructure, PackStreamValue};
