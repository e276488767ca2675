//! # mgbolt
//!
//! A blocking client core for Bolt-speaking graph databases such as
//! Memgraph.
//!
//! ## Features
//!
//! - **Bolt 1, 4.0-4.4, 5.0-5.2** - version negotiation and the message shapes of each
//! - **PackStream** - bounded decoder and encoder for the wire format
//! - **Values** - nodes, relationships, paths, temporal and spatial types
//! - **Session** - an explicit phase machine with a one-row result cursor
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use mgbolt::session::{Auth, Fetch, Session, SessionParams};
//! use mgbolt::value::Value;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let params = SessionParams::builder()
//!         .with_host("localhost")
//!         .with_auth(Auth::basic("memgraph", "password"))
//!         .build();
//!     let mut session = Session::connect(params)?;
//!
//!     let mut args = HashMap::new();
//!     args.insert("name".to_string(), Value::from("Alice"));
//!     session.run("CREATE (n:Person {name: $name}) RETURN n", Some(args))?;
//!
//!     while let Fetch::Row(row) = session.pull()? {
//!         println!("{}", row.values()[0]);
//!     }
//!
//!     session.disconnect()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`session`] - connection parameters, the session and its cursor
//! - [`value`] - the value model
//! - [`bolt`] - low-level Bolt protocol implementation
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bolt;
pub mod session;
pub mod value;

// Re-exports for convenience
pub use session::{
    Auth, ErrorCode, Fetch, Phase, QueryResult, Record, ResultCursor, ResultSummary, Row,
    ServerInfo, Session, SessionError, SessionParams, SessionResult, SslMode,
};
pub use value::{Value, ValueType};

pub use bolt::{BoltError, BoltVersion, PackStreamValue};
