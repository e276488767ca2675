//! PackStream serialization format.
//!
//! PackStream is the binary format Bolt uses for every value it carries.
//! A value is a marker byte, an optional size field and a payload; lists,
//! maps and structures nest recursively.
//!
//! # Core Types
//!
//! - **Null**, **Boolean**, **Integer** (i64), **Float** (f64)
//! - **Bytes**, **String** (UTF-8)
//! - **List**, **Map** (string keys)
//! - **Structure**: a tag byte plus fields
//!
//! Structures are interpreted one level up: graph entities, temporal and
//! spatial values live in [`crate::value`], protocol messages in
//! [`crate::bolt::message`].

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod structures;
pub mod types;

pub use decoder::{decode, PackStreamDecoder, DEFAULT_MAX_DEPTH};
pub use encoder::{encode, PackStreamEncoder};
pub use structures::{tag, Fields};
pub use types::{PackStreamStructure, PackStreamValue};

use std::fmt;

/// PackStream errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PackStreamError {
    /// Input ended in the middle of a value
    UnexpectedEof,
    /// Marker byte with no assigned meaning
    UnknownMarker(u8),
    /// String payload is not UTF-8
    InvalidUtf8(String),
    /// Map key is not a string
    InvalidMapKey,
    /// A declared size does not fit in the remaining input
    SizeMismatch {
        /// Kind of value being read
        what: &'static str,
        /// Size announced by the header
        declared: usize,
        /// Bytes left in the input
        available: usize,
    },
    /// Nesting went deeper than the configured limit
    DepthExceeded(usize),
    /// Bytes left over after a complete value
    TrailingBytes(usize),
    /// Value too large to encode
    ValueTooLarge(&'static str, usize),
    /// Structure with an unexpected shape
    InvalidStructure(String),
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamError::UnexpectedEof => write!(f, "Unexpected end of PackStream data"),
            PackStreamError::UnknownMarker(m) => write!(f, "Unknown PackStream marker: 0x{:02X}", m),
            PackStreamError::InvalidUtf8(e) => write!(f, "Invalid UTF-8 in string: {}", e),
            PackStreamError::InvalidMapKey => write!(f, "Map keys must be strings"),
            PackStreamError::SizeMismatch { what, declared, available } => write!(
                f,
                "{} declares {} items but only {} bytes remain",
                what, declared, available
            ),
            PackStreamError::DepthExceeded(max) => write!(f, "Nesting deeper than {} levels", max),
            PackStreamError::TrailingBytes(n) => write!(f, "{} trailing bytes after value", n),
            PackStreamError::ValueTooLarge(t, s) => write!(f, "{} too large: {}", t, s),
            PackStreamError::InvalidStructure(msg) => write!(f, "Invalid structure: {}", msg),
        }
    }
}

impl std::error::Error for PackStreamError {}
