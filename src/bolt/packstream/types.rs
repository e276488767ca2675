//! PackStream value types.

use std::collections::HashMap;

/// A raw PackStream value as it appears on the wire.
///
/// Structures are kept untyped here; the [`crate::value`] module interprets
/// graph, temporal and spatial tags.
#[derive(Debug, Clone, PartialEq)]
pub enum PackStreamValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Float(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// List of values
    List(Vec<PackStreamValue>),
    /// Map of string keys to values
    Map(HashMap<String, PackStreamValue>),
    /// Tagged structure
    Structure(PackStreamStructure),
}

/// A PackStream structure: a one byte tag followed by its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamStructure {
    /// Structure tag
    pub tag: u8,
    /// Structure fields
    pub fields: Vec<PackStreamValue>,
}

impl PackStreamStructure {
    /// Create a new structure.
    pub fn new(tag: u8, fields: Vec<PackStreamValue>) -> Self {
        Self { tag, fields }
    }

    /// Create a structure without fields (RESET, GOODBYE, ...).
    pub fn empty(tag: u8) -> Self {
        Self::new(tag, Vec::new())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the structure has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

macro_rules! borrow_as {
    ($(#[$doc:meta] $name:ident -> $ty:ty, $variant:ident;)*) => {
        $(
            #[$doc]
            pub fn $name(&self) -> Option<$ty> {
                match self {
                    PackStreamValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
}

macro_rules! take_as {
    ($(#[$doc:meta] $name:ident -> $ty:ty, $variant:ident;)*) => {
        $(
            #[$doc]
            pub fn $name(self) -> Option<$ty> {
                match self {
                    PackStreamValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
}

impl PackStreamValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, PackStreamValue::Null)
    }

    /// Get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_bool_ref().copied()
    }

    /// Get as integer.
    pub fn as_int(&self) -> Option<i64> {
        self.as_int_ref().copied()
    }

    /// Get as float. Integers are not widened.
    pub fn as_float(&self) -> Option<f64> {
        self.as_float_ref().copied()
    }

    borrow_as! {
        /// Borrow the boolean.
        as_bool_ref -> &bool, Boolean;
        /// Borrow the integer.
        as_int_ref -> &i64, Integer;
        /// Borrow the float.
        as_float_ref -> &f64, Float;
        /// Get as string slice.
        as_str -> &str, String;
        /// Get as list slice.
        as_list -> &[PackStreamValue], List;
        /// Get as map.
        as_map -> &HashMap<String, PackStreamValue>, Map;
        /// Get as structure.
        as_structure -> &PackStreamStructure, Structure;
    }

    take_as! {
        /// Take the string out of the value.
        into_string -> String, String;
        /// Take the list out of the value.
        into_list -> Vec<PackStreamValue>, List;
        /// Take the map out of the value.
        into_map -> HashMap<String, PackStreamValue>, Map;
    }

    /// Name of the wire type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PackStreamValue::Null => "Null",
            PackStreamValue::Boolean(_) => "Boolean",
            PackStreamValue::Integer(_) => "Integer",
            PackStreamValue::Float(_) => "Float",
            PackStreamValue::Bytes(_) => "Bytes",
            PackStreamValue::String(_) => "String",
            PackStreamValue::List(_) => "List",
            PackStreamValue::Map(_) => "Map",
            PackStreamValue::Structure(_) => "Structure",
        }
    }
}

macro_rules! from_impls {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PackStreamValue {
                fn from(v: $ty) -> Self {
                    PackStreamValue::$variant(v)
                }
            }
        )*
    };
}

from_impls! {
    bool => Boolean,
    i64 => Integer,
    f64 => Float,
    String => String,
    Vec<PackStreamValue> => List,
    HashMap<String, PackStreamValue> => Map,
    PackStreamStructure => Structure,
}

impl From<&str> for PackStreamValue {
    fn from(v: &str) -> Self {
        PackStreamValue::String(v.to_owned())
    }
}
