//! Transport bridges: how raw requests reach the dispatcher.
//!
//! Two interchangeable bridges sit in front of the same
//! [`Dispatcher`](crate::app::dispatcher::Dispatcher):
//!
//! - [`at_bridge::AtBridge`] drives a Wi-Fi co-processor over a
//!   [`ByteChannel`] using its AT command set, emulating a TCP+HTTP
//!   responder one connection at a time.
//! - [`socket::SocketBridge`] uses a native socket stack.
//!
//! The controller loop is generic over [`RequestBridge`], so swapping
//! bridges requires zero changes to the dispatch logic.

pub mod at;
pub mod at_bridge;
pub mod socket;

use crate::app::response::Response;
use crate::error::TransportError;

/// Byte-oriented duplex channel (UART to the modem, or a test script).
pub trait ByteChannel {
    /// Error type for this channel.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the channel.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// Turns one raw request fragment into a response.
pub trait RequestHandler {
    fn handle(&mut self, raw: &str) -> Response;
}

impl<F: FnMut(&str) -> Response> RequestHandler for F {
    fn handle(&mut self, raw: &str) -> Response {
        self(raw)
    }
}

/// Summary of one completed request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    /// Modem multiplexing channel; `None` for native sockets.
    pub connection_id: Option<u8>,
    pub request_bytes: usize,
    pub status: u16,
    pub response_bytes: usize,
}

/// A source of requests polled once per loop iteration.
pub trait RequestBridge {
    /// Serve at most one request.
    ///
    /// `Ok(None)` when nothing was pending.  Every wait inside is bounded,
    /// so this always returns.
    fn poll<H: RequestHandler>(&mut self, handler: &mut H)
    -> Result<Option<Exchange>, TransportError>;
}
