//! Bolt protocol version definitions.

use std::fmt;

/// Bolt protocol versions understood by this client.
///
/// Declaration order is chronological, so the derived `Ord` compares
/// versions the way the protocol does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoltVersion {
    /// Bolt 1: INIT, PULL_ALL, DISCARD_ALL, ACK_FAILURE
    V1,
    /// Bolt 4.0: HELLO, RUN extra map, PULL/DISCARD with `n`
    V4_0,
    /// Bolt 4.1
    V4_1,
    /// Bolt 4.2
    V4_2,
    /// Bolt 4.3
    V4_3,
    /// Bolt 4.4
    V4_4,
    /// Bolt 5.0: element ids, UTC datetimes
    V5_0,
    /// Bolt 5.1: authentication moves to LOGON
    V5_1,
    /// Bolt 5.2
    V5_2,
}

impl BoltVersion {
    /// All supported versions, newest first.
    pub const ALL: [BoltVersion; 9] = [
        BoltVersion::V5_2,
        BoltVersion::V5_1,
        BoltVersion::V5_0,
        BoltVersion::V4_4,
        BoltVersion::V4_3,
        BoltVersion::V4_2,
        BoltVersion::V4_1,
        BoltVersion::V4_0,
        BoltVersion::V1,
    ];

    /// Look up a version by number.
    pub fn new(major: u8, minor: u8) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.major() == major && v.minor() == minor)
    }

    /// Major version number.
    pub fn major(self) -> u8 {
        match self {
            BoltVersion::V1 => 1,
            BoltVersion::V4_0
            | BoltVersion::V4_1
            | BoltVersion::V4_2
            | BoltVersion::V4_3
            | BoltVersion::V4_4 => 4,
            BoltVersion::V5_0 | BoltVersion::V5_1 | BoltVersion::V5_2 => 5,
        }
    }

    /// Minor version number.
    pub fn minor(self) -> u8 {
        match self {
            BoltVersion::V1 | BoltVersion::V4_0 | BoltVersion::V5_0 => 0,
            BoltVersion::V4_1 | BoltVersion::V5_1 => 1,
            BoltVersion::V4_2 | BoltVersion::V5_2 => 2,
            BoltVersion::V4_3 => 3,
            BoltVersion::V4_4 => 4,
        }
    }

    /// Encode as a 4-byte handshake word: `[0, 0, minor, major]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [0, 0, self.minor(), self.major()]
    }

    /// Parse a server's handshake answer. The range byte is ignored.
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        Self::new(bytes[3], bytes[2])
    }

    /// Bolt 1 handshakes with INIT and recovers with ACK_FAILURE.
    pub fn is_legacy(self) -> bool {
        self == BoltVersion::V1
    }

    /// RUN carries an extra map and PULL/DISCARD carry `{n}`.
    pub fn has_extra_fields(self) -> bool {
        self >= BoltVersion::V4_0
    }

    /// GOODBYE is understood.
    pub fn supports_goodbye(self) -> bool {
        self >= BoltVersion::V4_0
    }

    /// Credentials are sent in LOGON instead of HELLO.
    pub fn supports_logon(self) -> bool {
        self >= BoltVersion::V5_1
    }

    /// Nodes and relationships carry string element ids.
    pub fn uses_element_ids(self) -> bool {
        self >= BoltVersion::V5_0
    }

    /// Datetimes are sent as UTC seconds instead of local wall-clock seconds.
    pub fn uses_utc_datetime(self) -> bool {
        self >= BoltVersion::V5_0
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// A handshake proposal: a version plus how many earlier minor versions
/// of the same major version are also acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    /// Major version
    pub major: u8,
    /// Highest minor version
    pub minor: u8,
    /// Number of additional minor versions below `minor`
    pub range: u8,
}

impl VersionRange {
    /// A proposal for exactly one version.
    pub fn exact(version: BoltVersion) -> Self {
        Self::down_to(version, version.minor())
    }

    /// A proposal for `version` and every minor version down to `lowest_minor`.
    pub fn down_to(version: BoltVersion, lowest_minor: u8) -> Self {
        Self {
            major: version.major(),
            minor: version.minor(),
            range: version.minor().saturating_sub(lowest_minor),
        }
    }

    /// Wire form: `[0, range, minor, major]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [0, self.range, self.minor, self.major]
    }

    /// Parse a wire proposal. The all-zero filler slot yields `None`.
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        if bytes == [0; 4] {
            return None;
        }
        Some(Self {
            major: bytes[3],
            minor: bytes[2],
            range: bytes[1],
        })
    }

    /// Whether `version` falls within this proposal.
    pub fn contains(self, version: BoltVersion) -> bool {
        version.major() == self.major
            && version.minor() <= self.minor
            && version.minor() >= self.minor.saturating_sub(self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_numbers() {
        assert_eq!(BoltVersion::new(4, 3), Some(BoltVersion::V4_3));
        assert_eq!(BoltVersion::new(1, 0), Some(BoltVersion::V1));
        assert_eq!(BoltVersion::new(3, 0), None);
        assert_eq!(BoltVersion::V5_1.to_string(), "5.1");
        assert_eq!(BoltVersion::V1.to_string(), "1.0");
    }

    #[test]
    fn test_wire_layout() {
        assert_eq!(BoltVersion::V4_3.to_bytes(), [0x00, 0x00, 0x03, 0x04]);
        assert_eq!(BoltVersion::from_bytes([0, 0, 3, 4]), Some(BoltVersion::V4_3));
        assert_eq!(BoltVersion::from_bytes([0, 0, 0, 1]), Some(BoltVersion::V1));
        assert_eq!(BoltVersion::from_bytes([0, 0, 0, 0]), None);
    }

    #[test]
    fn test_ordering() {
        assert!(BoltVersion::V5_0 > BoltVersion::V4_4);
        assert!(BoltVersion::V4_0 > BoltVersion::V1);
        assert_eq!(BoltVersion::ALL.iter().max(), Some(&BoltVersion::V5_2));
    }

    #[test]
    fn test_feature_gates() {
        assert!(BoltVersion::V1.is_legacy());
        assert!(!BoltVersion::V1.has_extra_fields());
        assert!(!BoltVersion::V1.supports_goodbye());
        assert!(BoltVersion::V4_0.has_extra_fields());
        assert!(!BoltVersion::V5_0.supports_logon());
        assert!(BoltVersion::V5_1.supports_logon());
        assert!(!BoltVersion::V4_4.uses_element_ids());
        assert!(BoltVersion::V5_0.uses_utc_datetime());
    }

    #[test]
    fn test_range_proposal() {
        let range = VersionRange::down_to(BoltVersion::V4_4, 0);
        assert_eq!(range.to_bytes(), [0x00, 0x04, 0x04, 0x04]);
        assert!(range.contains(BoltVersion::V4_0));
        assert!(range.contains(BoltVersion::V4_4));
        assert!(!range.contains(BoltVersion::V5_0));

        let exact = VersionRange::exact(BoltVersion::V1);
        assert_eq!(exact.to_bytes(), [0, 0, 0, 1]);
        assert!(exact.contains(BoltVersion::V1));

        assert_eq!(VersionRange::from_bytes([0, 2, 2, 5]), Some(VersionRange::down_to(BoltVersion::V5_2, 0)));
        assert_eq!(VersionRange::from_bytes([0; 4]), None);
    }
}
