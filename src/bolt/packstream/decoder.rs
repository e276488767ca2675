//! PackStream decoder.
//!
//! The decoder works on a complete message body. Declared sizes are checked
//! against the bytes that are actually left before anything is allocated,
//! and container nesting is bounded, so a hostile or corrupt frame fails
//! with an error instead of exhausting memory or the stack.

use bytes::Buf;
use std::collections::HashMap;

use super::marker::{Marker, Size};
use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// Default limit on nested lists, maps and structures.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// PackStream decoder reading values from a byte slice.
pub struct PackStreamDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> PackStreamDecoder<'a> {
    /// Create a decoder with the default nesting limit.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    /// Create a decoder with a custom nesting limit.
    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> Result<PackStreamValue, PackStreamError> {
        let marker = Marker::from_byte(self.read_u8()?);

        match marker {
            Marker::Null => Ok(PackStreamValue::Null),
            Marker::Boolean(b) => Ok(PackStreamValue::Boolean(b)),
            Marker::TinyInt(i) => Ok(PackStreamValue::Integer(i as i64)),
            Marker::Int8 => Ok(PackStreamValue::Integer(self.read_u8()? as i8 as i64)),
            Marker::Int16 => Ok(PackStreamValue::Integer(self.take(2)?.get_i16() as i64)),
            Marker::Int32 => Ok(PackStreamValue::Integer(self.take(4)?.get_i32() as i64)),
            Marker::Int64 => Ok(PackStreamValue::Integer(self.take(8)?.get_i64())),
            Marker::Float => Ok(PackStreamValue::Float(self.take(8)?.get_f64())),
            Marker::Bytes(size) => {
                let len = self.read_size(size)?;
                let bytes = self.read_slice("bytes", len)?;
                Ok(PackStreamValue::Bytes(bytes.to_vec()))
            }
            Marker::String(size) => {
                let len = self.read_size(size)?;
                let bytes = self.read_slice("string", len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| PackStreamError::InvalidUtf8(e.to_string()))?;
                Ok(PackStreamValue::String(s.to_string()))
            }
            Marker::List(size) => {
                let len = self.read_size(size)?;
                self.check_items("list", len, 1)?;
                self.nested(|d| {
                    let mut items = Vec::with_capacity(len);
                    for _ in 0..len {
                        items.push(d.decode()?);
                    }
                    Ok(PackStreamValue::List(items))
                })
            }
            Marker::Map(size) => {
                let len = self.read_size(size)?;
                self.check_items("map", len, 2)?;
                self.nested(|d| {
                    let mut map = HashMap::with_capacity(len);
                    for _ in 0..len {
                        let key = match d.decode()? {
                            PackStreamValue::String(s) => s,
                            _ => return Err(PackStreamError::InvalidMapKey),
                        };
                        let value = d.decode()?;
                        map.insert(key, value);
                    }
                    Ok(PackStreamValue::Map(map))
                })
            }
            Marker::Struct(size) => {
                let fields = self.read_size(size)?;
                let tag = self.read_u8()?;
                self.check_items("structure", fields, 1)?;
                self.nested(|d| {
                    let mut values = Vec::with_capacity(fields);
                    for _ in 0..fields {
                        values.push(d.decode()?);
                    }
                    Ok(PackStreamValue::Structure(PackStreamStructure::new(tag, values)))
                })
            }
            Marker::Reserved(byte) => Err(PackStreamError::UnknownMarker(byte)),
        }
    }

    /// Decode exactly one value and require the input to be fully consumed.
    pub fn decode_complete(&mut self) -> Result<PackStreamValue, PackStreamError> {
        let value = self.decode()?;
        if !self.is_empty() {
            return Err(PackStreamError::TrailingBytes(self.remaining()));
        }
        Ok(value)
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, PackStreamError>,
    ) -> Result<T, PackStreamError> {
        if self.depth >= self.max_depth {
            return Err(PackStreamError::DepthExceeded(self.max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // Every element takes at least `min_bytes`, so a count that cannot fit
    // in what is left is rejected before allocating.
    fn check_items(&self, what: &'static str, count: usize, min_bytes: usize) -> Result<(), PackStreamError> {
        let available = self.remaining();
        if count.saturating_mul(min_bytes) > available {
            return Err(PackStreamError::SizeMismatch {
                what,
                declared: count,
                available,
            });
        }
        Ok(())
    }

    fn read_size(&mut self, size: Size) -> Result<usize, PackStreamError> {
        match size {
            Size::Inline(n) => Ok(n),
            Size::U8 => Ok(self.read_u8()? as usize),
            Size::U16 => Ok(self.take(2)?.get_u16() as usize),
            Size::U32 => Ok(self.take(4)?.get_u32() as usize),
        }
    }

    fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        Ok(self.take(1)?[0])
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PackStreamError> {
        if self.remaining() < n {
            return Err(PackStreamError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_slice(&mut self, what: &'static str, len: usize) -> Result<&'a [u8], PackStreamError> {
        let available = self.remaining();
        if len > available {
            return Err(PackStreamError::SizeMismatch {
                what,
                declared: len,
                available,
            });
        }
        self.take(len)
    }
}

/// Decode a single value from bytes, ignoring anything after it.
pub fn decode(data: &[u8]) -> Result<PackStreamValue, PackStreamError> {
    PackStreamDecoder::new(data).decode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode(&[0xC0]).unwrap(), PackStreamValue::Null);
        assert_eq!(decode(&[0xC3]).unwrap(), PackStreamValue::Boolean(true));
        assert_eq!(decode(&[0xC2]).unwrap(), PackStreamValue::Boolean(false));
        assert_eq!(decode(&[0xF0]).unwrap(), PackStreamValue::Integer(-16));
        assert_eq!(decode(&[0xC8, 0xEF]).unwrap(), PackStreamValue::Integer(-17));
        assert_eq!(decode(&[0xC9, 0x03, 0xE8]).unwrap(), PackStreamValue::Integer(1000));
        assert_eq!(
            decode(&[0xCA, 0x00, 0x01, 0x86, 0xA0]).unwrap(),
            PackStreamValue::Integer(100_000)
        );
        assert_eq!(
            decode(&[0xCB, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            PackStreamValue::Integer(i64::MAX)
        );
    }

    #[test]
    fn test_decode_float() {
        let data = [0xC1, 0x3F, 0xF1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9A];
        assert_eq!(decode(&data).unwrap(), PackStreamValue::Float(1.1));
    }

    #[test]
    fn test_decode_strings() {
        assert_eq!(decode(&[0x80]).unwrap(), PackStreamValue::String(String::new()));

        let data = [0x85, b'h', b'e', b'l', b'l', b'o'];
        assert_eq!(decode(&data).unwrap(), PackStreamValue::String("hello".into()));

        let mut data = vec![0xD0, 20];
        data.extend_from_slice(&[b'a'; 20]);
        assert_eq!(decode(&data).unwrap(), PackStreamValue::String("a".repeat(20)));
    }

    #[test]
    fn test_decode_node_record_field() {
        // (:TestLabel {id: 1}) with id 7
        let data = [
            0xB3, 0x4E, 0x07, 0x91, 0x89, b'T', b'e', b's', b't', b'L', b'a', b'b', b'e', b'l',
            0xA1, 0x82, b'i', b'd', 0x01,
        ];
        let value = decode(&data).unwrap();
        let s = value.as_structure().unwrap();
        assert_eq!(s.tag, 0x4E);
        assert_eq!(s.fields[0], PackStreamValue::Integer(7));
        assert_eq!(s.fields[1].as_list().unwrap()[0].as_str(), Some("TestLabel"));
        assert_eq!(s.fields[2].as_map().unwrap()["id"], PackStreamValue::Integer(1));
    }

    #[test]
    fn test_unexpected_eof() {
        assert!(matches!(decode(&[0xC9]), Err(PackStreamError::UnexpectedEof)));
        assert!(matches!(decode(&[]), Err(PackStreamError::UnexpectedEof)));
    }

    #[test]
    fn test_string_longer_than_input() {
        let err = decode(&[0xD0, 0x10, b'a']).unwrap_err();
        assert!(matches!(
            err,
            PackStreamError::SizeMismatch { what: "string", declared: 16, available: 1 }
        ));
    }

    #[test]
    fn test_huge_list_is_rejected_before_allocation() {
        let err = decode(&[0xD6, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]).unwrap_err();
        assert!(matches!(err, PackStreamError::SizeMismatch { what: "list", .. }));
    }

    #[test]
    fn test_map_entries_need_two_bytes_each() {
        // Map claiming 2 entries with only 3 bytes left.
        let err = decode(&[0xA2, 0x81, b'a', 0x01]).unwrap_err();
        assert!(matches!(err, PackStreamError::SizeMismatch { what: "map", .. }));
    }

    #[test]
    fn test_non_string_map_key() {
        let err = decode(&[0xA1, 0x01, 0x01]).unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidMapKey));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = decode(&[0x82, 0xFF, 0xFE]).unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidUtf8(_)));
    }

    #[test]
    fn test_reserved_marker() {
        assert!(matches!(decode(&[0xC4]), Err(PackStreamError::UnknownMarker(0xC4))));
    }

    #[test]
    fn test_depth_limit() {
        let mut data = vec![0x91; 10];
        data.push(0x01);

        assert!(PackStreamDecoder::with_max_depth(&data, 10).decode().is_ok());
        let err = PackStreamDecoder::with_max_depth(&data, 9).decode().unwrap_err();
        assert!(matches!(err, PackStreamError::DepthExceeded(9)));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut decoder = PackStreamDecoder::new(&[0x01, 0x02]);
        assert!(matches!(decoder.decode_complete(), Err(PackStreamError::TrailingBytes(1))));
    }

    #[test]
    fn test_position_tracking() {
        let data = [0xC9, 0x03, 0xE8, 0x05];
        let mut decoder = PackStreamDecoder::new(&data);
        decoder.decode().unwrap();
        assert_eq!(decoder.position(), 3);
        assert_eq!(decoder.remaining(), 1);
        decoder.decode().unwrap();
        assert!(decoder.is_empty());
    }
}
