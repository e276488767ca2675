//! Bolt protocol message types.
//!
//! Requests know how to shape themselves for the negotiated version
//! (Bolt 1 INIT/PULL_ALL style or the 4.x/5.x map-based style); responses
//! look the same in every supported version.

pub mod metadata;
pub mod request;
pub mod response;

pub use metadata::*;
pub use request::*;
pub use response::*;

/// Bolt message tags.
pub mod tag {
    /// HELLO (INIT in Bolt 1)
    pub const HELLO: u8 = 0x01;
    /// GOODBYE
    pub const GOODBYE: u8 = 0x02;
    /// ACK_FAILURE (Bolt 1 only)
    pub const ACK_FAILURE: u8 = 0x0E;
    /// RESET
    pub const RESET: u8 = 0x0F;
    /// RUN
    pub const RUN: u8 = 0x10;
    /// DISCARD (DISCARD_ALL in Bolt 1)
    pub const DISCARD: u8 = 0x2F;
    /// PULL (PULL_ALL in Bolt 1)
    pub const PULL: u8 = 0x3F;
    /// LOGON (Bolt 5.1+)
    pub const LOGON: u8 = 0x6A;

    /// SUCCESS
    pub const SUCCESS: u8 = 0x70;
    /// RECORD
    pub const RECORD: u8 = 0x71;
    /// IGNORED
    pub const IGNORED: u8 = 0x7E;
    /// FAILURE
    pub const FAILURE: u8 = 0x7F;
}
