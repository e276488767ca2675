//! PackStream encoder.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use super::marker::*;
use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// PackStream encoder appending to a caller-owned buffer.
///
/// Integers always take the smallest representation and containers the
/// shortest size header that fits, which is what servers expect to see.
pub struct PackStreamEncoder<'b> {
    buffer: &'b mut BytesMut,
}

impl<'b> PackStreamEncoder<'b> {
    /// Create an encoder writing at the end of `buffer`.
    pub fn new(buffer: &'b mut BytesMut) -> Self {
        Self { buffer }
    }

    /// Encode any value.
    pub fn encode(&mut self, value: &PackStreamValue) -> Result<(), PackStreamError> {
        match value {
            PackStreamValue::Null => self.buffer.put_u8(NULL),
            PackStreamValue::Boolean(b) => self.buffer.put_u8(if *b { TRUE } else { FALSE }),
            PackStreamValue::Integer(i) => self.encode_int(*i),
            PackStreamValue::Float(f) => {
                self.buffer.put_u8(FLOAT_64);
                self.buffer.put_f64(*f);
            }
            PackStreamValue::Bytes(b) => self.encode_bytes(b)?,
            PackStreamValue::String(s) => self.encode_string(s)?,
            PackStreamValue::List(l) => self.encode_list(l)?,
            PackStreamValue::Map(m) => self.encode_map(m)?,
            PackStreamValue::Structure(s) => self.encode_structure(s)?,
        }
        Ok(())
    }

    /// Encode an integer using the smallest representation.
    pub fn encode_int(&mut self, value: i64) {
        if is_tiny_int(value) {
            self.buffer.put_i8(value as i8);
        } else if let Ok(v) = i8::try_from(value) {
            self.buffer.put_u8(INT_8);
            self.buffer.put_i8(v);
        } else if let Ok(v) = i16::try_from(value) {
            self.buffer.put_u8(INT_16);
            self.buffer.put_i16(v);
        } else if let Ok(v) = i32::try_from(value) {
            self.buffer.put_u8(INT_32);
            self.buffer.put_i32(v);
        } else {
            self.buffer.put_u8(INT_64);
            self.buffer.put_i64(value);
        }
    }

    /// Encode a byte array. Byte arrays have no tiny form.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<(), PackStreamError> {
        self.header("bytes", value.len(), None, [BYTES_8, BYTES_16, BYTES_32])?;
        self.buffer.put_slice(value);
        Ok(())
    }

    /// Encode a string.
    pub fn encode_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        self.header(
            "string",
            value.len(),
            Some(TINY_STRING),
            [STRING_8, STRING_16, STRING_32],
        )?;
        self.buffer.put_slice(value.as_bytes());
        Ok(())
    }

    /// Encode a list.
    pub fn encode_list(&mut self, values: &[PackStreamValue]) -> Result<(), PackStreamError> {
        self.header("list", values.len(), Some(TINY_LIST), [LIST_8, LIST_16, LIST_32])?;
        values.iter().try_for_each(|v| self.encode(v))
    }

    /// Encode a map with string keys.
    pub fn encode_map(&mut self, map: &HashMap<String, PackStreamValue>) -> Result<(), PackStreamError> {
        self.header("map", map.len(), Some(TINY_MAP), [MAP_8, MAP_16, MAP_32])?;
        for (key, value) in map {
            self.encode_string(key)?;
            self.encode(value)?;
        }
        Ok(())
    }

    /// Encode a structure. At most `u16::MAX` fields are representable.
    pub fn encode_structure(&mut self, s: &PackStreamStructure) -> Result<(), PackStreamError> {
        let len = s.fields.len();
        if len <= TINY_MAX_LEN {
            self.buffer.put_u8(TINY_STRUCT | len as u8);
        } else if let Ok(n) = u8::try_from(len) {
            self.buffer.put_u8(STRUCT_8);
            self.buffer.put_u8(n);
        } else if let Ok(n) = u16::try_from(len) {
            self.buffer.put_u8(STRUCT_16);
            self.buffer.put_u16(n);
        } else {
            return Err(PackStreamError::ValueTooLarge("structure", len));
        }
        self.buffer.put_u8(s.tag);
        s.fields.iter().try_for_each(|f| self.encode(f))
    }

    fn header(
        &mut self,
        what: &'static str,
        len: usize,
        tiny: Option<u8>,
        [m8, m16, m32]: [u8; 3],
    ) -> Result<(), PackStreamError> {
        match tiny {
            Some(base) if len <= TINY_MAX_LEN => self.buffer.put_u8(base | len as u8),
            _ => {
                if let Ok(n) = u8::try_from(len) {
                    self.buffer.put_u8(m8);
                    self.buffer.put_u8(n);
                } else if let Ok(n) = u16::try_from(len) {
                    self.buffer.put_u8(m16);
                    self.buffer.put_u16(n);
                } else if let Ok(n) = u32::try_from(len) {
                    self.buffer.put_u8(m32);
                    self.buffer.put_u32(n);
                } else {
                    return Err(PackStreamError::ValueTooLarge(what, len));
                }
            }
        }
        Ok(())
    }
}

/// Encode a single value into a fresh buffer.
pub fn encode(value: &PackStreamValue) -> Result<BytesMut, PackStreamError> {
    let mut buffer = BytesMut::with_capacity(64);
    PackStreamEncoder::new(&mut buffer).encode(value)?;
    Ok(buffer)
}
