//! # Session
//!
//! A blocking client session over one Bolt connection.
//!
//! ```text
//! Disconnected -> Connecting -> Ready -> Streaming -> Ready -> ... -> Disconnected
//!                                  \________ Failed ________/
//! ```
//!
//! - [`Session::run`] is allowed in `Ready`, [`Session::pull`] and
//!   [`Session::discard`] in `Streaming`. Anything else is a
//!   [`SessionError::BadCall`] and sends nothing.
//! - A query failure is answered with RESET and leaves the session `Ready`.
//! - Transport and decode errors close the connection and leave it `Failed`.

mod client;
mod cursor;
mod error;
mod params;
mod record;
mod transport;

pub use client::{Phase, Session};
pub use cursor::{Fetch, ResultCursor, ResultSummary, Row, ServerInfo};
pub use error::{ErrorCode, SessionError, SessionResult};
pub use params::{Auth, SessionParams, SessionParamsBuilder, SslMode};
pub use record::{QueryResult, Record};
pub use transport::{BoltConnection, Transport};
