//! # Values
//!
//! [`Value`] is the closed set of things a query can send as a parameter
//! or get back in a row: scalars, strings, bytes, lists, maps, graph
//! entities, temporal and spatial values.
//!
//! Two families of accessors exist. `as_*` returns `None` on a type
//! mismatch. `expect_*` treats a mismatch as a programming error and
//! panics with a message naming both types:
//!
//! ```
//! use mgbolt::value::Value;
//!
//! let v = Value::Integer(1);
//! assert_eq!(v.as_bool(), None);
//! assert_eq!(v.expect_integer(), 1);
//! ```
//!
//! [`Value::from_packstream`] and [`Value::to_packstream`] convert to and
//! from the wire representation for a given protocol version.

mod convert;
mod graph;
mod spatial;
mod temporal;

pub use convert::to_packstream_map;
pub use graph::{Node, Path, Relationship, UnboundRelationship};
pub use spatial::Point;
pub use temporal::{Duration, OffsetTime, ZoneBasis, ZonedDateTime};

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A value carried by the Bolt protocol.
///
/// Serialized externally tagged, `{"Integer": 1}`, so the variant
/// survives a round trip through formats such as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Byte array
    Bytes(Vec<u8>),
    /// Ordered list
    List(Vec<Value>),
    /// String-keyed map
    Map(HashMap<String, Value>),
    /// Node
    Node(Node),
    /// Relationship
    Relationship(Relationship),
    /// Relationship without endpoints
    UnboundRelationship(UnboundRelationship),
    /// Path
    Path(Path),
    /// Date
    Date(NaiveDate),
    /// Time with offset
    Time(OffsetTime),
    /// Time without offset
    LocalTime(NaiveTime),
    /// Datetime with fixed offset
    DateTime(DateTime<FixedOffset>),
    /// Datetime in a named zone
    DateTimeZoneId(ZonedDateTime),
    /// Datetime without zone
    LocalDateTime(NaiveDateTime),
    /// Duration
    Duration(Duration),
    /// Point
    Point(Point),
}

/// The tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// [`Value::Null`]
    Null,
    /// [`Value::Boolean`]
    Boolean,
    /// [`Value::Integer`]
    Integer,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::Bytes`]
    Bytes,
    /// [`Value::List`]
    List,
    /// [`Value::Map`]
    Map,
    /// [`Value::Node`]
    Node,
    /// [`Value::Relationship`]
    Relationship,
    /// [`Value::UnboundRelationship`]
    UnboundRelationship,
    /// [`Value::Path`]
    Path,
    /// [`Value::Date`]
    Date,
    /// [`Value::Time`]
    Time,
    /// [`Value::LocalTime`]
    LocalTime,
    /// [`Value::DateTime`]
    DateTime,
    /// [`Value::DateTimeZoneId`]
    DateTimeZoneId,
    /// [`Value::LocalDateTime`]
    LocalDateTime,
    /// [`Value::Duration`]
    Duration,
    /// [`Value::Point`]
    Point,
}

impl ValueType {
    /// Stable display name.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Null => "Null",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Bytes => "Bytes",
            ValueType::List => "List",
            ValueType::Map => "Map",
            ValueType::Node => "Node",
            ValueType::Relationship => "Relationship",
            ValueType::UnboundRelationship => "UnboundRelationship",
            ValueType::Path => "Path",
            ValueType::Date => "Date",
            ValueType::Time => "Time",
            ValueType::LocalTime => "LocalTime",
            ValueType::DateTime => "DateTime",
            ValueType::DateTimeZoneId => "DateTimeZoneId",
            ValueType::LocalDateTime => "LocalDateTime",
            ValueType::Duration => "Duration",
            ValueType::Point => "Point",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `as_*` accessor returning a reference to the payload.
macro_rules! ref_accessor {
    ($as_fn:ident, $expect_fn:ident, $variant:ident, $ty:ty) => {
        #[doc = concat!("The payload if this is a `", stringify!($variant), "`.")]
        pub fn $as_fn(&self) -> Option<&$ty> {
            match self {
                Value::$variant(v) => Some(v),
                _ => None,
            }
        }

        #[doc = concat!("The payload of a `", stringify!($variant), "`.\n\n# Panics\n\nOn any other type.")]
        #[track_caller]
        pub fn $expect_fn(&self) -> &$ty {
            match self {
                Value::$variant(v) => v,
                other => other.mismatch(ValueType::$variant),
            }
        }
    };
}

/// Same, for `Copy` payloads returned by value.
macro_rules! copy_accessor {
    ($as_fn:ident, $expect_fn:ident, $variant:ident, $ty:ty) => {
        #[doc = concat!("The payload if this is a `", stringify!($variant), "`.")]
        pub fn $as_fn(&self) -> Option<$ty> {
            match self {
                Value::$variant(v) => Some(*v),
                _ => None,
            }
        }

        #[doc = concat!("The payload of a `", stringify!($variant), "`.\n\n# Panics\n\nOn any other type.")]
        #[track_caller]
        pub fn $expect_fn(&self) -> $ty {
            match self {
                Value::$variant(v) => *v,
                other => other.mismatch(ValueType::$variant),
            }
        }
    };
}

impl Value {
    /// The tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
            Value::List(_) => ValueType::List,
            Value::Map(_) => ValueType::Map,
            Value::Node(_) => ValueType::Node,
            Value::Relationship(_) => ValueType::Relationship,
            Value::UnboundRelationship(_) => ValueType::UnboundRelationship,
            Value::Path(_) => ValueType::Path,
            Value::Date(_) => ValueType::Date,
            Value::Time(_) => ValueType::Time,
            Value::LocalTime(_) => ValueType::LocalTime,
            Value::DateTime(_) => ValueType::DateTime,
            Value::DateTimeZoneId(_) => ValueType::DateTimeZoneId,
            Value::LocalDateTime(_) => ValueType::LocalDateTime,
            Value::Duration(_) => ValueType::Duration,
            Value::Point(_) => ValueType::Point,
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    copy_accessor!(as_bool, expect_bool, Boolean, bool);
    copy_accessor!(as_int, expect_integer, Integer, i64);
    copy_accessor!(as_float, expect_float, Float, f64);
    ref_accessor!(as_bytes, expect_bytes, Bytes, Vec<u8>);
    ref_accessor!(as_list, expect_list, List, Vec<Value>);
    ref_accessor!(as_map, expect_map, Map, HashMap<String, Value>);
    ref_accessor!(as_node, expect_node, Node, Node);
    ref_accessor!(as_relationship, expect_relationship, Relationship, Relationship);
    ref_accessor!(
        as_unbound_relationship,
        expect_unbound_relationship,
        UnboundRelationship,
        UnboundRelationship
    );
    ref_accessor!(as_path, expect_path, Path, Path);
    copy_accessor!(as_date, expect_date, Date, NaiveDate);
    copy_accessor!(as_time, expect_time, Time, OffsetTime);
    copy_accessor!(as_local_time, expect_local_time, LocalTime, NaiveTime);
    copy_accessor!(as_datetime, expect_datetime, DateTime, DateTime<FixedOffset>);
    ref_accessor!(as_zoned_datetime, expect_zoned_datetime, DateTimeZoneId, ZonedDateTime);
    copy_accessor!(as_local_datetime, expect_local_datetime, LocalDateTime, NaiveDateTime);
    copy_accessor!(as_duration, expect_duration, Duration, Duration);
    copy_accessor!(as_point, expect_point, Point, Point);

    /// The string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The string of a `String`.
    ///
    /// # Panics
    ///
    /// On any other type.
    #[track_caller]
    pub fn expect_str(&self) -> &str {
        match self {
            Value::String(s) => s,
            other => other.mismatch(ValueType::String),
        }
    }

    /// Number of elements of a list, entries of a map, or bytes of a byte
    /// array.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(l) => Some(l.len()),
            Value::Map(m) => Some(m.len()),
            Value::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }

    /// Map lookup. `None` both for a missing key and for a non-map value;
    /// a stored null is `Some(&Value::Null)`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    #[track_caller]
    fn mismatch(&self, expected: ValueType) -> ! {
        panic!("expected {} value, found {}", expected, self.value_type())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                let mut keys: Vec<&String> = m.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, m[key])?;
                }
                write!(f, "}}")
            }
            Value::Node(n) => write!(f, "{}", n),
            Value::Relationship(r) => write!(f, "{}", r),
            Value::UnboundRelationship(r) => write!(f, "[{}:{}]", r.id, r.rel_type),
            Value::Path(p) => write!(f, "{}", p),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::LocalTime(t) => write!(f, "{}", t),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::DateTimeZoneId(z) => write!(f, "{}", z),
            Value::LocalDateTime(dt) => write!(f, "{}", dt),
            Value::Duration(d) => write!(f, "{}", d),
            Value::Point(p) => write!(f, "{}", p),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<Node> for Value {
    fn from(v: Node) -> Self {
        Value::Node(v)
    }
}

impl From<Relationship> for Value {
    fn from(v: Relationship) -> Self {
        Value::Relationship(v)
    }
}

impl From<Path> for Value {
    fn from(v: Path) -> Self {
        Value::Path(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::LocalTime(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::LocalDateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Value::Point(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_tag() {
        let v = Value::Integer(42);
        assert_eq!(v.value_type(), ValueType::Integer);
        assert_eq!(v.as_int(), Some(42));
        assert_eq!(v.as_float(), None);
        assert_eq!(v.as_bool(), None);
        assert_eq!(Value::Float(1.5).expect_float(), 1.5);
        assert_eq!(Value::from("x").expect_str(), "x");
    }

    #[test]
    #[should_panic(expected = "expected Boolean value, found Integer")]
    fn test_expect_wrong_type_panics() {
        Value::Integer(1).expect_bool();
    }

    #[test]
    fn test_mismatch_is_deterministic() {
        for _ in 0..3 {
            let result = std::panic::catch_unwind(|| Value::Integer(1).expect_bool());
            let payload = result.unwrap_err();
            let message = payload.downcast_ref::<String>().unwrap();
            assert_eq!(message, "expected Boolean value, found Integer");
        }
    }

    #[test]
    fn test_map_lookup_distinguishes_null() {
        let mut m = HashMap::new();
        m.insert("present".to_string(), Value::Null);
        let v = Value::Map(m);
        assert_eq!(v.get("present"), Some(&Value::Null));
        assert_eq!(v.get("absent"), None);
        assert_eq!(v.len(), Some(1));
        assert_eq!(Value::Integer(3).len(), None);
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(7i32), Value::Integer(7));
        assert_eq!(Value::from(vec![1i64, 2]), Value::List(vec![Value::Integer(1), Value::Integer(2)]));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_display() {
        let v = Value::List(vec![Value::Null, Value::from("a"), Value::Float(0.5)]);
        assert_eq!(v.to_string(), "[null, \"a\", 0.5]");
        assert_eq!(ValueType::UnboundRelationship.to_string(), "UnboundRelationship");
    }

    #[test]
    fn test_serde_json_shape() {
        let mut props = HashMap::new();
        props.insert("id".to_string(), Value::Integer(1));
        let node = Value::Node(Node::new(1, vec!["TestLabel".to_string()], props));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["Node"]["labels"][0], "TestLabel");
        assert_eq!(json["Node"]["properties"]["id"]["Integer"], 1);
        assert!(json["Node"].get("element_id").is_none());
        assert_eq!(serde_json::to_value(Value::Null).unwrap(), "Null");
    }

    #[test]
    fn test_serde_keeps_variant() {
        let mut props = HashMap::new();
        props.insert("name".to_string(), Value::from("test1"));
        let values = vec![
            Value::List(vec![Value::Integer(1), Value::Integer(2)]),
            Value::Bytes(vec![1, 2]),
            Value::Node(Node::new(1, vec!["TestLabel".to_string()], props.clone())),
            Value::Map(props),
            Value::Null,
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), value, "{}", json);
        }
    }
}
