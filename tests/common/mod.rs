//! In-process Bolt server for integration tests.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::Once;
use std::thread::{self, JoinHandle};

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing_subscriber::EnvFilter;

use mgbolt::bolt::codec::BoltRequestCodec;
use mgbolt::bolt::handshake::Handshake;
use mgbolt::bolt::{BoltRequest, BoltResponse, BoltVersion, HANDSHAKE_SIZE};
use mgbolt::SessionParams;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mgbolt=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_test_writer()
            .try_init();
    });
}

/// Accepts one connection, negotiates a version and answers every request
/// with whatever the handler returns.
pub struct FakeServer {
    address: SocketAddr,
    handle: JoinHandle<io::Result<Vec<BoltRequest>>>,
}

impl FakeServer {
    pub fn start<H>(versions: Vec<BoltVersion>, handler: H) -> Self
    where
        H: FnMut(&BoltRequest) -> Vec<BoltResponse> + Send + 'static,
    {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let address = listener.local_addr().expect("local addr");
        let handle = thread::spawn(move || serve(listener, versions, handler));
        Self { address, handle }
    }

    pub fn params(&self) -> SessionParams {
        SessionParams::builder()
            .with_host(self.address.ip().to_string())
            .with_port(self.address.port())
            .build()
    }

    /// Wait for the client to hang up and return what it sent.
    pub fn join(self) -> Vec<BoltRequest> {
        self.handle
            .join()
            .expect("fake server panicked")
            .expect("fake server io")
    }
}

fn serve<H>(listener: TcpListener, versions: Vec<BoltVersion>, mut handler: H) -> io::Result<Vec<BoltRequest>>
where
    H: FnMut(&BoltRequest) -> Vec<BoltResponse>,
{
    let (mut stream, _) = listener.accept()?;

    let mut preamble = [0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut preamble)?;
    let negotiated = Handshake::with_versions(versions).process(&preamble);
    stream.write_all(&Handshake::response(&negotiated))?;
    if negotiated.is_err() {
        return Ok(Vec::new());
    }

    let mut codec = BoltRequestCodec::new();
    let mut buffer = BytesMut::new();
    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        while let Some(request) = codec.decode(&mut buffer).expect("decode request") {
            let mut out = BytesMut::new();
            for response in handler(&request) {
                codec.encode(response, &mut out).expect("encode response");
            }
            stream.write_all(&out)?;
            let goodbye = request == BoltRequest::Goodbye;
            received.push(request);
            if goodbye {
                return Ok(received);
            }
        }

        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(received);
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}
