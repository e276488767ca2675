//! Temporal values without a direct chrono counterpart.

use std::fmt;

use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

/// A time of day with a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetTime {
    /// Wall-clock time
    pub time: NaiveTime,
    /// Offset from UTC in seconds
    pub offset_seconds: i32,
}

impl OffsetTime {
    /// Create an offset time.
    pub fn new(time: NaiveTime, offset_seconds: i32) -> Self {
        Self { time, offset_seconds }
    }

    /// The offset, if it is within +/- 24 hours.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.offset_seconds)
    }
}

impl fmt::Display for OffsetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset() {
            Some(offset) => write!(f, "{}{}", self.time, offset),
            None => write!(f, "{}{:+}s", self.time, self.offset_seconds),
        }
    }
}

/// How the seconds of a [`ZonedDateTime`] are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneBasis {
    /// Local wall-clock seconds since the epoch (before Bolt 5)
    Local,
    /// UTC seconds since the epoch (Bolt 5+)
    Utc,
}

/// A datetime in a named time zone.
///
/// Converting between local and UTC seconds needs a time zone database,
/// so the value keeps the seconds exactly as the server counted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonedDateTime {
    /// Seconds since the epoch, counted per `basis`
    pub seconds: i64,
    /// Nanoseconds within the second
    pub nanoseconds: i64,
    /// Zone name, e.g. "Europe/Zagreb"
    pub zone_id: String,
    /// Local or UTC seconds
    pub basis: ZoneBasis,
}

impl ZonedDateTime {
    /// Create a zoned datetime.
    pub fn new(seconds: i64, nanoseconds: i64, zone_id: &str, basis: ZoneBasis) -> Self {
        Self {
            seconds,
            nanoseconds,
            zone_id: zone_id.to_string(),
            basis,
        }
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}[{}]", self.seconds, self.nanoseconds, self.zone_id)
    }
}

/// A duration in months, days, seconds and nanoseconds.
///
/// The components are kept apart because months and days have no fixed
/// length in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Duration {
    /// Months
    pub months: i64,
    /// Days
    pub days: i64,
    /// Seconds
    pub seconds: i64,
    /// Nanoseconds
    pub nanoseconds: i32,
}

impl Duration {
    /// Create a duration.
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i32) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }

    /// A duration of whole seconds.
    pub fn from_seconds(seconds: i64) -> Self {
        Self::new(0, 0, seconds, 0)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}M{}DT{}", self.months, self.days, self.seconds)?;
        if self.nanoseconds != 0 {
            write!(f, ".{:09}", self.nanoseconds)?;
        }
        write!(f, "S")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_time_display() {
        let t = OffsetTime::new(NaiveTime::from_hms_opt(10, 30, 0).unwrap(), 3600);
        assert_eq!(t.to_string(), "10:30:00+01:00");
        assert!(OffsetTime::new(t.time, 200_000).offset().is_none());
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(Duration::new(14, 3, 60, 0).to_string(), "P14M3DT60S");
        assert_eq!(Duration::new(0, 0, 1, 500_000_000).to_string(), "P0M0DT1.500000000S");
        assert_eq!(Duration::from_seconds(5).seconds, 5);
    }

    #[test]
    fn test_zoned_display() {
        let z = ZonedDateTime::new(1_700_000_000, 5, "Europe/Zagreb", ZoneBasis::Utc);
        assert_eq!(z.to_string(), "1700000000.000000005[Europe/Zagreb]");
    }
}
