//! Blocking transport and the framed Bolt connection on top of it.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use crate::bolt::codec::BoltResponseCodec;
use crate::bolt::handshake::{
    build_client_handshake, default_proposals, parse_server_response, HANDSHAKE_RESPONSE_SIZE,
};
use crate::bolt::{BoltError, BoltRequest, BoltResponse, BoltResult, BoltVersion, HandshakeError};

const READ_CHUNK: usize = 8192;

/// A duplex byte stream a session can own.
///
/// Plain TCP is provided; TLS or in-memory streams plug in through
/// [`crate::session::Session::connect_with`].
pub trait Transport: Read + Write {
    /// Release the underlying resource. Called once when the session closes.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn shutdown(&mut self) -> io::Result<()> {
        (**self).shutdown()
    }
}

/// A transport after a successful handshake: framing, buffering and the
/// negotiated version.
pub struct BoltConnection<T: Transport> {
    transport: T,
    codec: BoltResponseCodec,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
    closed: bool,
}

impl<T: Transport> BoltConnection<T> {
    /// Run the version handshake over `transport`.
    ///
    /// On failure the transport is shut down before the error is returned.
    pub fn handshake(mut transport: T, max_message_size: usize, max_depth: usize) -> BoltResult<Self> {
        match Self::negotiate(&mut transport) {
            Ok(version) => {
                debug!(%version, "Bolt handshake complete");
                Ok(Self {
                    transport,
                    codec: BoltResponseCodec::new(version, max_message_size, max_depth),
                    read_buffer: BytesMut::with_capacity(READ_CHUNK),
                    write_buffer: BytesMut::with_capacity(READ_CHUNK),
                    closed: false,
                })
            }
            Err(e) => {
                let _ = transport.shutdown();
                Err(e)
            }
        }
    }

    fn negotiate(transport: &mut T) -> BoltResult<BoltVersion> {
        let proposals = default_proposals();
        transport.write_all(&build_client_handshake(&proposals))?;
        transport.flush()?;

        let mut response = [0u8; HANDSHAKE_RESPONSE_SIZE];
        transport.read_exact(&mut response).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => BoltError::Handshake(HandshakeError::ConnectionClosed),
            _ => BoltError::Io(e),
        })?;

        Ok(parse_server_response(response, &proposals)?)
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> BoltVersion {
        self.codec.version()
    }

    /// Encode and write one request.
    pub fn send(&mut self, request: BoltRequest) -> BoltResult<()> {
        if self.closed {
            return Err(BoltError::ConnectionClosed);
        }
        trace!(message = request.name(), "C: send");
        self.write_buffer.clear();
        self.codec.encode(request, &mut self.write_buffer)?;
        self.transport.write_all(&self.write_buffer)?;
        self.transport.flush()?;
        Ok(())
    }

    /// Read until one whole response has arrived.
    pub fn recv(&mut self) -> BoltResult<BoltResponse> {
        if self.closed {
            return Err(BoltError::ConnectionClosed);
        }
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(response) = self.codec.decode(&mut self.read_buffer)? {
                trace!(message = response.name(), "S: recv");
                return Ok(response);
            }

            let n = match self.transport.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                return Err(BoltError::ConnectionClosed);
            }
            self.read_buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Shut the transport down. Later calls do nothing.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.transport.shutdown() {
                debug!(error = %e, "transport shutdown failed");
            }
        }
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: Transport> std::fmt::Debug for BoltConnection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltConnection")
            .field("version", &self.version())
            .field("closed", &self.closed)
            .field("buffered", &self.read_buffer.len())
            .finish()
    }
}
