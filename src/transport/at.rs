//! AT command grammar for the ESP-AT style Wi-Fi co-processor.
//!
//! Inbound data is framed by the modem as:
//!
//! ```text
//! +IPD,<id>,<len>:<payload>
//! ```
//!
//! Outbound data goes through a two-step `AT+CIPSEND` handshake: announce
//! the length, wait for the `>` prompt, write exactly that many bytes.

use core::net::Ipv4Addr;

/// Precedes every inbound data frame.
pub const IPD_MARKER: &[u8] = b"+IPD,";
/// Prompt after `AT+CIPSEND` when the modem is ready for payload bytes.
pub const SEND_PROMPT: &[u8] = b">";
/// Payload accepted.
pub const SEND_OK: &[u8] = b"SEND OK";
pub const OK: &[u8] = b"OK";
pub const ERROR: &[u8] = b"ERROR";
/// Line terminator for commands.
pub const CRLF: &str = "\r\n";

const STAIP_PREFIX: &str = "STAIP,\"";

/// Longest marker a [`MarkerScanner`] can look for.
pub const MAX_MARKER_LEN: usize = 16;

pub fn cmd_probe() -> String {
    format!("AT{CRLF}")
}

/// Station + soft-AP mode.
pub fn cmd_dual_mode() -> String {
    format!("AT+CWMODE=3{CRLF}")
}

pub fn cmd_join(ssid: &str, password: &str) -> String {
    format!("AT+CWJAP=\"{ssid}\",\"{password}\"{CRLF}")
}

pub fn cmd_query_address() -> String {
    format!("AT+CIFSR{CRLF}")
}

/// Enable multiple connections (required by the server).
pub fn cmd_multiplex() -> String {
    format!("AT+CIPMUX=1{CRLF}")
}

pub fn cmd_server(port: u16) -> String {
    format!("AT+CIPSERVER=1,{port}{CRLF}")
}

pub fn cmd_send(connection_id: u8, len: usize) -> String {
    format!("AT+CIPSEND={connection_id},{len}{CRLF}")
}

pub fn cmd_close(connection_id: u8) -> String {
    format!("AT+CIPCLOSE={connection_id}{CRLF}")
}

/// Pull the station address out of an `AT+CIFSR` reply:
///
/// ```text
/// +CIFSR:APIP,"192.168.4.1"
/// +CIFSR:STAIP,"192.168.1.50"
/// ```
pub fn parse_station_address(reply: &str) -> Option<Ipv4Addr> {
    let start = reply.find(STAIP_PREFIX)? + STAIP_PREFIX.len();
    let len = reply[start..].find('"')?;
    reply[start..start + len].parse().ok()
}

/// Connection ids are a single ASCII digit.
pub fn parse_connection_id(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}

/// Byte-at-a-time marker search that survives partial reads.
///
/// Keeps the last `marker.len()` bytes seen, so a marker split across two
/// reads (or two loop iterations) is still found.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    marker: &'static [u8],
    window: heapless::Vec<u8, MAX_MARKER_LEN>,
}

impl MarkerScanner {
    /// `marker` longer than [`MAX_MARKER_LEN`] is truncated to its tail.
    pub fn new(marker: &'static [u8]) -> Self {
        let marker = &marker[marker.len().saturating_sub(MAX_MARKER_LEN)..];
        Self {
            marker,
            window: heapless::Vec::new(),
        }
    }

    /// Feed one byte.  Returns `true` when the marker has just completed.
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.marker.is_empty() {
            return false;
        }
        if self.window.len() == self.marker.len() {
            self.window.remove(0);
        }
        // Room was made above.
        let _ = self.window.push(byte);
        if self.window.as_slice() == self.marker {
            self.window.clear();
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}
