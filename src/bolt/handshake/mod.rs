//! Bolt protocol handshake.
//!
//! 1. Client sends the 4-byte magic `0x6060B017`
//! 2. Client sends 4 version proposals, each `[0, range, minor, major]`
//! 3. Server answers with the chosen version `[0, 0, minor, major]`, or
//!    four zero bytes if none is acceptable

mod negotiation;
mod version;

pub use negotiation::{
    build_client_handshake, default_proposals, parse_server_response, Handshake, HandshakeResult,
};
pub use version::{BoltVersion, VersionRange};

pub use super::error::HandshakeError;

/// Bolt protocol magic number
pub const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Size of the client preamble (magic + 4 proposals)
pub const HANDSHAKE_SIZE: usize = 20;

/// Size of the server answer
pub const HANDSHAKE_RESPONSE_SIZE: usize = 4;
