//! Structure tags and a checked field reader.
//!
//! Graph, temporal and spatial values travel as tagged structures. The
//! [`Fields`] reader pulls fields off a structure in order and turns every
//! shape mismatch into a [`PackStreamError::InvalidStructure`].

use std::collections::HashMap;
use std::ops::RangeInclusive;

use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// Structure tags for value types.
pub mod tag {
    /// Node: id, labels, properties (+ element id in 5.x)
    pub const NODE: u8 = 0x4E;
    /// Relationship: id, start, end, type, properties (+ 3 element ids in 5.x)
    pub const RELATIONSHIP: u8 = 0x52;
    /// Relationship without endpoints, used inside paths
    pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
    /// Path: nodes, unbound relationships, index sequence
    pub const PATH: u8 = 0x50;
    /// Days since the Unix epoch
    pub const DATE: u8 = 0x44;
    /// Nanoseconds since midnight and UTC offset in seconds
    pub const TIME: u8 = 0x54;
    /// Nanoseconds since midnight
    pub const LOCAL_TIME: u8 = 0x74;
    /// Local seconds, nanoseconds, offset (before 5.0)
    pub const DATE_TIME: u8 = 0x46;
    /// Local seconds, nanoseconds, zone name (before 5.0)
    pub const DATE_TIME_ZONE_ID: u8 = 0x66;
    /// UTC seconds, nanoseconds, offset (5.0+)
    pub const DATE_TIME_UTC: u8 = 0x49;
    /// UTC seconds, nanoseconds, zone name (5.0+)
    pub const DATE_TIME_ZONE_ID_UTC: u8 = 0x69;
    /// Seconds and nanoseconds since the epoch, no zone
    pub const LOCAL_DATE_TIME: u8 = 0x64;
    /// Months, days, seconds, nanoseconds
    pub const DURATION: u8 = 0x45;
    /// SRID, x, y
    pub const POINT_2D: u8 = 0x58;
    /// SRID, x, y, z
    pub const POINT_3D: u8 = 0x59;
}

/// Sequential reader over the fields of one structure.
#[derive(Debug)]
pub struct Fields {
    name: &'static str,
    fields: std::vec::IntoIter<PackStreamValue>,
}

impl Fields {
    /// Start reading `structure`, requiring a field count within `arity`.
    pub fn new(
        name: &'static str,
        structure: PackStreamStructure,
        arity: RangeInclusive<usize>,
    ) -> Result<Self, PackStreamError> {
        if !arity.contains(&structure.fields.len()) {
            return Err(PackStreamError::InvalidStructure(format!(
                "{} expects {}..={} fields, got {}",
                name,
                arity.start(),
                arity.end(),
                structure.fields.len()
            )));
        }
        Ok(Self {
            name,
            fields: structure.fields.into_iter(),
        })
    }

    /// Fields not read yet.
    pub fn remaining(&self) -> usize {
        self.fields.len()
    }

    /// Next field, whatever its type.
    pub fn value(&mut self, field: &str) -> Result<PackStreamValue, PackStreamError> {
        self.fields
            .next()
            .ok_or_else(|| self.invalid(field, "is missing"))
    }

    /// Next field as an integer.
    pub fn int(&mut self, field: &str) -> Result<i64, PackStreamError> {
        match self.value(field)? {
            PackStreamValue::Integer(i) => Ok(i),
            other => Err(self.wrong_type(field, "Integer", &other)),
        }
    }

    /// Next field as a float.
    pub fn float(&mut self, field: &str) -> Result<f64, PackStreamError> {
        match self.value(field)? {
            PackStreamValue::Float(f) => Ok(f),
            other => Err(self.wrong_type(field, "Float", &other)),
        }
    }

    /// Next field as a string.
    pub fn string(&mut self, field: &str) -> Result<String, PackStreamError> {
        match self.value(field)? {
            PackStreamValue::String(s) => Ok(s),
            other => Err(self.wrong_type(field, "String", &other)),
        }
    }

    /// Next field as a list.
    pub fn list(&mut self, field: &str) -> Result<Vec<PackStreamValue>, PackStreamError> {
        match self.value(field)? {
            PackStreamValue::List(l) => Ok(l),
            other => Err(self.wrong_type(field, "List", &other)),
        }
    }

    /// Next field as a map.
    pub fn map(&mut self, field: &str) -> Result<HashMap<String, PackStreamValue>, PackStreamError> {
        match self.value(field)? {
            PackStreamValue::Map(m) => Ok(m),
            other => Err(self.wrong_type(field, "Map", &other)),
        }
    }

    /// Next field as a list of strings.
    pub fn strings(&mut self, field: &str) -> Result<Vec<String>, PackStreamError> {
        self.list(field)?
            .into_iter()
            .map(|v| match v {
                PackStreamValue::String(s) => Ok(s),
                other => Err(self.wrong_type(field, "String", &other)),
            })
            .collect()
    }

    /// Next field as a string if there is one left.
    pub fn optional_string(&mut self, field: &str) -> Result<Option<String>, PackStreamError> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        self.string(field).map(Some)
    }

    fn wrong_type(&self, field: &str, expected: &str, got: &PackStreamValue) -> PackStreamError {
        self.invalid(field, &format!("must be {}, got {}", expected, got.type_name()))
    }

    fn invalid(&self, field: &str, problem: &str) -> PackStreamError {
        PackStreamError::InvalidStructure(format!("{} {} {}", self.name, field, problem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_structure() -> PackStreamStructure {
        let mut props = HashMap::new();
        props.insert("name".to_string(), PackStreamValue::from("test1"));
        PackStreamStructure::new(
            tag::NODE,
            vec![
                PackStreamValue::Integer(1),
                PackStreamValue::List(vec!["TestLabel".into()]),
                PackStreamValue::Map(props),
            ],
        )
    }

    #[test]
    fn test_reads_fields_in_order() {
        let mut fields = Fields::new("Node", node_structure(), 3..=4).unwrap();
        assert_eq!(fields.int("id").unwrap(), 1);
        assert_eq!(fields.strings("labels").unwrap(), vec!["TestLabel"]);
        assert_eq!(fields.map("properties").unwrap().len(), 1);
        assert_eq!(fields.optional_string("element_id").unwrap(), None);
    }

    #[test]
    fn test_arity_is_checked() {
        let err = Fields::new("Node", node_structure(), 4..=4).unwrap_err();
        assert!(err.to_string().contains("Node expects 4..=4 fields, got 3"));
    }

    #[test]
    fn test_wrong_field_type() {
        let mut fields = Fields::new("Node", node_structure(), 3..=3).unwrap();
        let err = fields.string("id").unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidStructure(_)));
        assert!(err.to_string().contains("Node id must be String, got Integer"));
    }

    #[test]
    fn test_non_string_label() {
        let s = PackStreamStructure::new(
            tag::NODE,
            vec![
                PackStreamValue::Integer(1),
                PackStreamValue::List(vec![PackStreamValue::Integer(5)]),
                PackStreamValue::Map(HashMap::new()),
            ],
        );
        let mut fields = Fields::new("Node", s, 3..=3).unwrap();
        fields.int("id").unwrap();
        assert!(fields.strings("labels").is_err());
    }
}
