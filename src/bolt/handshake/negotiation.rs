//! Bolt handshake negotiation.

use super::version::VersionRange;
use super::{BoltVersion, HandshakeError, BOLT_MAGIC, HANDSHAKE_SIZE};

/// Proposals sent by the client, newest first: 5.2 down to 5.0, 4.4 down
/// to 4.0, then 1.
pub fn default_proposals() -> [VersionRange; 3] {
    [
        VersionRange::down_to(BoltVersion::V5_2, 0),
        VersionRange::down_to(BoltVersion::V4_4, 0),
        VersionRange::exact(BoltVersion::V1),
    ]
}

/// Build the 20 byte client preamble: magic followed by up to four
/// proposals, padded with zero slots.
pub fn build_client_handshake(proposals: &[VersionRange]) -> [u8; HANDSHAKE_SIZE] {
    let mut data = [0u8; HANDSHAKE_SIZE];
    data[0..4].copy_from_slice(&BOLT_MAGIC);
    for (i, proposal) in proposals.iter().take(4).enumerate() {
        let offset = 4 + i * 4;
        data[offset..offset + 4].copy_from_slice(&proposal.to_bytes());
    }
    data
}

/// Interpret the server's 4 byte answer to `proposals`.
pub fn parse_server_response(
    response: [u8; 4],
    proposals: &[VersionRange],
) -> Result<BoltVersion, HandshakeError> {
    if response == [0; 4] {
        return Err(HandshakeError::NoCompatibleVersion);
    }
    match BoltVersion::from_bytes(response) {
        Some(version) if proposals.iter().any(|p| p.contains(version)) => Ok(version),
        _ => Err(HandshakeError::UnexpectedVersion(response)),
    }
}

/// Result of a server-side negotiation.
#[derive(Debug, Clone)]
pub struct HandshakeResult {
    /// Negotiated protocol version
    pub version: BoltVersion,
    /// What the client proposed, in order
    pub proposals: Vec<VersionRange>,
}

/// The server half of the handshake.
///
/// Used by in-process test servers; a real client only needs
/// [`build_client_handshake`] and [`parse_server_response`].
#[derive(Debug)]
pub struct Handshake {
    supported_versions: Vec<BoltVersion>,
}

impl Handshake {
    /// Accept every version this crate knows.
    pub fn new() -> Self {
        Self::with_versions(BoltVersion::ALL.to_vec())
    }

    /// Accept only `versions`.
    pub fn with_versions(versions: Vec<BoltVersion>) -> Self {
        Self {
            supported_versions: versions,
        }
    }

    /// Validate a client preamble and pick a version.
    ///
    /// Proposals are tried in client order; within a range the highest
    /// supported minor wins.
    pub fn process(&self, data: &[u8; HANDSHAKE_SIZE]) -> Result<HandshakeResult, HandshakeError> {
        let magic = [data[0], data[1], data[2], data[3]];
        if magic != BOLT_MAGIC {
            return Err(HandshakeError::InvalidMagic {
                expected: BOLT_MAGIC,
                received: magic,
            });
        }

        let proposals: Vec<VersionRange> = data[4..]
            .chunks_exact(4)
            .filter_map(|c| VersionRange::from_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let version = proposals
            .iter()
            .find_map(|p| {
                self.supported_versions
                    .iter()
                    .copied()
                    .filter(|v| p.contains(*v))
                    .max()
            })
            .ok_or(HandshakeError::NoCompatibleVersion)?;

        Ok(HandshakeResult { version, proposals })
    }

    /// The 4 bytes to send back: the version, or zeros on failure.
    pub fn response(result: &Result<HandshakeResult, HandshakeError>) -> [u8; 4] {
        match result {
            Ok(hr) => hr.version.to_bytes(),
            Err(_) => [0; 4],
        }
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_preamble_layout() {
        let data = build_client_handshake(&default_proposals());
        assert_eq!(
            data,
            [
                0x60, 0x60, 0xB0, 0x17, // magic
                0x00, 0x02, 0x02, 0x05, // 5.2 down to 5.0
                0x00, 0x04, 0x04, 0x04, // 4.4 down to 4.0
                0x00, 0x00, 0x00, 0x01, // 1.0
                0x00, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn test_server_picks_highest_in_first_matching_range() {
        let data = build_client_handshake(&default_proposals());
        let result = Handshake::new().process(&data).unwrap();
        assert_eq!(result.version, BoltVersion::V5_2);
        assert_eq!(result.proposals.len(), 3);
    }

    #[test]
    fn test_memgraph_like_server() {
        // Supports 1, 4.0, 4.1, 4.3 and 5.0 but not 5.1/5.2.
        let server = Handshake::with_versions(vec![
            BoltVersion::V1,
            BoltVersion::V4_0,
            BoltVersion::V4_1,
            BoltVersion::V4_3,
            BoltVersion::V5_0,
        ]);
        let data = build_client_handshake(&default_proposals());
        assert_eq!(server.process(&data).unwrap().version, BoltVersion::V5_0);
    }

    #[test]
    fn test_legacy_only_server() {
        let server = Handshake::with_versions(vec![BoltVersion::V1]);
        let data = build_client_handshake(&default_proposals());
        let result = server.process(&data);
        assert_eq!(Handshake::response(&result), [0, 0, 0, 1]);
    }

    #[test]
    fn test_no_common_version() {
        let server = Handshake::with_versions(vec![BoltVersion::V4_4]);
        let data = build_client_handshake(&[VersionRange::exact(BoltVersion::V1)]);
        let result = server.process(&data);
        assert!(matches!(result, Err(HandshakeError::NoCompatibleVersion)));
        assert_eq!(Handshake::response(&result), [0; 4]);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = build_client_handshake(&default_proposals());
        data[0..4].copy_from_slice(b"GET ");
        assert!(matches!(
            Handshake::new().process(&data),
            Err(HandshakeError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_parse_server_response() {
        let proposals = default_proposals();
        assert_eq!(parse_server_response([0, 0, 3, 4], &proposals), Ok(BoltVersion::V4_3));
        assert_eq!(parse_server_response([0, 0, 0, 1], &proposals), Ok(BoltVersion::V1));
        assert_eq!(
            parse_server_response([0; 4], &proposals),
            Err(HandshakeError::NoCompatibleVersion)
        );
        assert_eq!(
            parse_server_response([0, 0, 0, 3], &proposals),
            Err(HandshakeError::UnexpectedVersion([0, 0, 0, 3]))
        );
        // HTTP server answering a Bolt preamble
        assert!(parse_server_response(*b"HTTP", &proposals).is_err());
    }
}
