//! PackStream marker bytes.
//!
//! Every packed value starts with a marker byte. Small integers and short
//! collections carry their value or size in the marker itself; everything
//! else is followed by a big-endian size field and then the payload.

/// Null
pub const NULL: u8 = 0xC0;
/// 64-bit IEEE 754 float
pub const FLOAT_64: u8 = 0xC1;
/// Boolean false
pub const FALSE: u8 = 0xC2;
/// Boolean true
pub const TRUE: u8 = 0xC3;

/// Signed integer followed by 1 byte
pub const INT_8: u8 = 0xC8;
/// Signed integer followed by 2 bytes
pub const INT_16: u8 = 0xC9;
/// Signed integer followed by 4 bytes
pub const INT_32: u8 = 0xCA;
/// Signed integer followed by 8 bytes
pub const INT_64: u8 = 0xCB;

/// Byte array with u8 length
pub const BYTES_8: u8 = 0xCC;
/// Byte array with u16 length
pub const BYTES_16: u8 = 0xCD;
/// Byte array with u32 length
pub const BYTES_32: u8 = 0xCE;

/// String with inline length (0x80..=0x8F)
pub const TINY_STRING: u8 = 0x80;
/// String with u8 length
pub const STRING_8: u8 = 0xD0;
/// String with u16 length
pub const STRING_16: u8 = 0xD1;
/// String with u32 length
pub const STRING_32: u8 = 0xD2;

/// List with inline length (0x90..=0x9F)
pub const TINY_LIST: u8 = 0x90;
/// List with u8 length
pub const LIST_8: u8 = 0xD4;
/// List with u16 length
pub const LIST_16: u8 = 0xD5;
/// List with u32 length
pub const LIST_32: u8 = 0xD6;

/// Map with inline entry count (0xA0..=0xAF)
pub const TINY_MAP: u8 = 0xA0;
/// Map with u8 entry count
pub const MAP_8: u8 = 0xD8;
/// Map with u16 entry count
pub const MAP_16: u8 = 0xD9;
/// Map with u32 entry count
pub const MAP_32: u8 = 0xDA;

/// Structure with inline field count (0xB0..=0xBF)
pub const TINY_STRUCT: u8 = 0xB0;
/// Structure with u8 field count
pub const STRUCT_8: u8 = 0xDC;
/// Structure with u16 field count
pub const STRUCT_16: u8 = 0xDD;

/// Largest size that fits in the low nibble of a tiny marker.
pub const TINY_MAX_LEN: usize = 15;

/// Smallest integer encoded inline.
pub const TINY_INT_MIN: i64 = -16;
/// Largest integer encoded inline.
pub const TINY_INT_MAX: i64 = 127;

/// Where the size of a sized value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// Size is the low nibble of the marker
    Inline(usize),
    /// Size is the next byte
    U8,
    /// Size is the next two bytes
    U16,
    /// Size is the next four bytes
    U32,
}

/// The meaning of a single marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `NULL`
    Null,
    /// `TRUE` / `FALSE`
    Boolean(bool),
    /// Integer carried by the marker itself
    TinyInt(i8),
    /// `INT_8`
    Int8,
    /// `INT_16`
    Int16,
    /// `INT_32`
    Int32,
    /// `INT_64`
    Int64,
    /// `FLOAT_64`
    Float,
    /// Byte array
    Bytes(Size),
    /// UTF-8 string
    String(Size),
    /// List
    List(Size),
    /// Map
    Map(Size),
    /// Structure (the tag byte follows the size)
    Struct(Size),
    /// Byte with no assigned meaning
    Reserved(u8),
}

impl Marker {
    /// Classify a marker byte.
    pub fn from_byte(byte: u8) -> Self {
        let nibble = (byte & 0x0F) as usize;
        match byte {
            0x00..=0x7F | 0xF0..=0xFF => Marker::TinyInt(byte as i8),
            0x80..=0x8F => Marker::String(Size::Inline(nibble)),
            0x90..=0x9F => Marker::List(Size::Inline(nibble)),
            0xA0..=0xAF => Marker::Map(Size::Inline(nibble)),
            0xB0..=0xBF => Marker::Struct(Size::Inline(nibble)),
            NULL => Marker::Null,
            FLOAT_64 => Marker::Float,
            FALSE => Marker::Boolean(false),
            TRUE => Marker::Boolean(true),
            INT_8 => Marker::Int8,
            INT_16 => Marker::Int16,
            INT_32 => Marker::Int32,
            INT_64 => Marker::Int64,
            BYTES_8 => Marker::Bytes(Size::U8),
            BYTES_16 => Marker::Bytes(Size::U16),
            BYTES_32 => Marker::Bytes(Size::U32),
            STRING_8 => Marker::String(Size::U8),
            STRING_16 => Marker::String(Size::U16),
            STRING_32 => Marker::String(Size::U32),
            LIST_8 => Marker::List(Size::U8),
            LIST_16 => Marker::List(Size::U16),
            LIST_32 => Marker::List(Size::U32),
            MAP_8 => Marker::Map(Size::U8),
            MAP_16 => Marker::Map(Size::U16),
            MAP_32 => Marker::Map(Size::U32),
            STRUCT_8 => Marker::Struct(Size::U8),
            STRUCT_16 => Marker::Struct(Size::U16),
            other => Marker::Reserved(other),
        }
    }
}

/// Check if an integer can be packed into the marker byte.
#[inline]
pub fn is_tiny_int(value: i64) -> bool {
    (TINY_INT_MIN..=TINY_INT_MAX).contains(&value)
}
