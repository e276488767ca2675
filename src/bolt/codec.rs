//! Bolt chunked message framing for tokio_util.
//!
//! Every message is split into chunks with a 2-byte big-endian length
//! prefix and terminated by a zero-length chunk. The codecs work on plain
//! `BytesMut` buffers, so the blocking session drives them directly.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::handshake::BoltVersion;
use super::message::{BoltRequest, BoltResponse};
use super::packstream::{encode, PackStreamDecoder, PackStreamStructure, PackStreamValue, DEFAULT_MAX_DEPTH};
use super::BoltError;

/// Largest chunk payload a u16 header can describe.
pub const MAX_CHUNK_SIZE: usize = u16::MAX as usize;

/// Default limit on a reassembled message (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// End of message marker
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Frames raw PackStream values.
#[derive(Debug)]
pub struct BoltCodec {
    max_message_size: usize,
    max_depth: usize,
    message_buffer: BytesMut,
}

impl BoltCodec {
    /// Codec with default limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MAX_DEPTH)
    }

    /// Codec with a message size limit and a value nesting limit.
    pub fn with_limits(max_message_size: usize, max_depth: usize) -> Self {
        Self {
            max_message_size,
            max_depth,
            message_buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Whether part of a message has been buffered.
    pub fn in_message(&self) -> bool {
        !self.message_buffer.is_empty()
    }

    fn encode_chunked(data: &[u8], dst: &mut BytesMut) {
        dst.reserve(data.len() + 2 * (data.len() / MAX_CHUNK_SIZE + 2));
        for chunk in data.chunks(MAX_CHUNK_SIZE) {
            dst.put_u16(chunk.len() as u16);
            dst.put_slice(chunk);
        }
        dst.put_slice(&END_MARKER);
    }

    fn decode_structure(&mut self, src: &mut BytesMut) -> Result<Option<PackStreamStructure>, BoltError> {
        match self.decode(src)? {
            Some(PackStreamValue::Structure(s)) => Ok(Some(s)),
            Some(other) => Err(BoltError::Protocol(format!(
                "Expected a message structure, got {}",
                other.type_name()
            ))),
            None => Ok(None),
        }
    }
}

impl Default for BoltCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BoltCodec {
    type Item = PackStreamValue;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }

            let chunk_size = u16::from_be_bytes([src[0], src[1]]) as usize;

            if chunk_size == 0 {
                src.advance(2);
                if self.message_buffer.is_empty() {
                    // NOOP between messages
                    continue;
                }
                let message = self.message_buffer.split();
                let value = PackStreamDecoder::with_max_depth(&message, self.max_depth).decode_complete()?;
                return Ok(Some(value));
            }

            if src.len() < 2 + chunk_size {
                src.reserve(2 + chunk_size - src.len());
                return Ok(None);
            }

            let size = self.message_buffer.len() + chunk_size;
            if size > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size,
                    max: self.max_message_size,
                });
            }

            src.advance(2);
            self.message_buffer.extend_from_slice(&src[..chunk_size]);
            src.advance(chunk_size);
        }
    }
}

impl Encoder<PackStreamValue> for BoltCodec {
    type Error = BoltError;

    fn encode(&mut self, item: PackStreamValue, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let encoded = encode(&item)?;
        Self::encode_chunked(&encoded, dst);
        Ok(())
    }
}

/// Client side: encodes requests for the negotiated version, decodes responses.
#[derive(Debug)]
pub struct BoltResponseCodec {
    inner: BoltCodec,
    version: BoltVersion,
}

impl BoltResponseCodec {
    /// Codec for `version` with the given limits.
    pub fn new(version: BoltVersion, max_message_size: usize, max_depth: usize) -> Self {
        Self {
            inner: BoltCodec::with_limits(max_message_size, max_depth),
            version,
        }
    }

    /// Negotiated version.
    pub fn version(&self) -> BoltVersion {
        self.version
    }
}

impl Decoder for BoltResponseCodec {
    type Item = BoltResponse;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode_structure(src)? {
            Some(s) => Ok(Some(BoltResponse::from_structure(s)?)),
            None => Ok(None),
        }
    }
}

impl Encoder<BoltRequest> for BoltResponseCodec {
    type Error = BoltError;

    fn encode(&mut self, item: BoltRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let value = PackStreamValue::Structure(item.to_structure(self.version));
        self.inner.encode(value, dst)
    }
}

/// Server side: decodes requests in any supported layout, encodes responses.
#[derive(Debug, Default)]
pub struct BoltRequestCodec {
    inner: BoltCodec,
}

impl BoltRequestCodec {
    /// Codec with default limits.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for BoltRequestCodec {
    type Item = BoltRequest;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode_structure(src)? {
            Some(s) => Ok(Some(BoltRequest::from_structure(s)?)),
            None => Ok(None),
        }
    }
}

impl Encoder<BoltResponse> for BoltRequestCodec {
    type Error = BoltError;

    fn encode(&mut self, item: BoltResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner.encode(PackStreamValue::Structure(item.to_structure()), dst)
    }
}
