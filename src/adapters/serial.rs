//! Serial-port byte channel for an external AT modem (host builds).
//!
//! Wraps a `serialport` handle as a [`ByteChannel`].  The port is opened
//! with a short read timeout and reads are only issued when bytes are
//! already queued, so the bridge's deadline loop never blocks on it.

use std::io::{self, Read, Write};
use std::time::Duration;

use log::info;

use crate::transport::ByteChannel;

/// Read timeout for the underlying port.
const PORT_TIMEOUT: Duration = Duration::from_millis(10);

pub struct SerialChannel {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialChannel {
    pub fn open(path: &str, baud: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, baud).timeout(PORT_TIMEOUT).open()?;
        info!("Opened modem port {path} @ {baud} baud");
        Ok(Self { port })
    }
}

impl ByteChannel for SerialChannel {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, io::Error> {
        self.port.write(data)
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        self.port.flush()
    }

    fn available(&self) -> bool {
        self.port.bytes_to_read().is_ok_and(|n| n > 0)
    }
}
