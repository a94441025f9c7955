//! Native socket bridge.
//!
//! Same contract as the AT bridge, minus the modem: accept one connection,
//! take one read as the request, answer, close.  The listener is
//! non-blocking so an idle poll returns immediately.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, ToSocketAddrs};
use std::time::Duration;

use log::{debug, warn};

use crate::error::TransportError;

use super::{Exchange, RequestBridge, RequestHandler};

const READ_BUF_SIZE: usize = 1024;

pub struct SocketBridge {
    listener: TcpListener,
    read_timeout: Duration,
}

impl SocketBridge {
    pub fn bind(addr: impl ToSocketAddrs, read_timeout_ms: u32) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).map_err(|e| {
            warn!("bind failed: {e}");
            TransportError::BindFailed
        })?;
        listener.set_nonblocking(true).map_err(|e| {
            warn!("set_nonblocking failed: {e}");
            TransportError::BindFailed
        })?;
        Ok(Self {
            listener,
            read_timeout: Duration::from_millis(u64::from(read_timeout_ms.max(1))),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(|_| TransportError::BindFailed)
    }
}

impl RequestBridge for SocketBridge {
    fn poll<H: RequestHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<Option<Exchange>, TransportError> {
        let (mut stream, peer) = match self.listener.accept() {
            Ok(conn) => conn,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => {
                warn!("accept failed: {e}");
                return Err(TransportError::AcceptFailed);
            }
        };
        debug!("connection from {peer}");

        stream
            .set_nonblocking(false)
            .and_then(|()| stream.set_read_timeout(Some(self.read_timeout)))
            .map_err(|e| {
                warn!("{peer}: socket setup failed: {e}");
                TransportError::AcceptFailed
            })?;

        let mut buf = [0u8; READ_BUF_SIZE];
        let n = match stream.read(&mut buf) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => 0,
            Err(e) => {
                warn!("{peer}: read failed: {e}");
                return Err(TransportError::ChannelRead);
            }
        };

        let raw = String::from_utf8_lossy(&buf[..n]);
        let response = handler.handle(&raw);
        let wire = response.encode();

        stream.write_all(wire.as_bytes()).map_err(|e| {
            warn!("{peer}: write failed: {e}");
            TransportError::ChannelWrite
        })?;
        // Peer may already be gone.
        let _ = stream.shutdown(Shutdown::Both);

        Ok(Some(Exchange {
            connection_id: None,
            request_bytes: n,
            status: response.status.code(),
            response_bytes: wire.len(),
        }))
    }
}
