//! AT modem bridge: a TCP+HTTP responder emulated over a command channel.
//!
//! One request/response cycle walks the [`BridgeState`] machine:
//!
//! ```text
//!  Idle ──"+IPD,"──▶ FramingDetected ──digit──▶ ConnectionIdRead
//!    ▲                                               │ drain
//!    │                                               ▼
//!  ConnectionClosed ◀── ResponseDataSent ◀── ResponseLengthSent ◀── Dispatched ◀── RequestBuffered
//! ```
//!
//! Every modem command is "write, then poll until the expected token or a
//! deadline".  The deadline is checked after every read, so a modem that
//! never goes quiet still releases the loop.  A missed acknowledgement is logged and the cycle carries on;
//! nothing is retried.  Channel I/O errors abort the cycle and put the
//! bridge back in `Idle`.
//!
//! Known limitation: the request is whatever is buffered after one
//! settle delay plus a single drain pass.  A request that arrives in
//! several modem frames is truncated; the parser only needs the request
//! line, which always comes first.

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::app::ports::TimePort;
use crate::config::{BridgeConfig, WifiCredentials};
use crate::error::TransportError;

use super::at::{self, MarkerScanner};
use super::{ByteChannel, Exchange, RequestBridge, RequestHandler};

/// Largest request fragment kept; the rest of a drain pass is discarded.
pub const MAX_REQUEST_BYTES: usize = 1024;

/// Upper bound on bytes inspected per `poll` while looking for a frame.
const MAX_SCAN_BYTES: usize = 512;

/// Bytes one drain pass may consume (kept plus discarded).
pub const MAX_DRAIN_BYTES: usize = 4 * MAX_REQUEST_BYTES;

/// Modem reply bytes kept for inspection after each command.
const REPLY_CAPACITY: usize = 256;

// ───────────────────────────────────────────────────────────────
// State machine types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    FramingDetected,
    ConnectionIdRead,
    RequestBuffered,
    Dispatched,
    ResponseLengthSent,
    ResponseDataSent,
    ConnectionClosed,
}

/// The one in-flight connection.
#[derive(Debug, Clone)]
pub struct PendingConnection {
    /// Modem channel the request arrived on; the reply must use the same one.
    pub connection_id: u8,
    pub raw: heapless::Vec<u8, MAX_REQUEST_BYTES>,
}

/// How a modem command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The expected token arrived before the deadline.
    Acknowledged,
    /// The modem answered `ERROR`.
    Rejected,
    /// Deadline passed first (always the case with no expected token).
    TimedOut,
}

/// What the modem bring-up achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetupReport {
    pub joined: bool,
    pub station_ip: Option<core::net::Ipv4Addr>,
    pub server_started: bool,
}

// ───────────────────────────────────────────────────────────────
// AtBridge
// ───────────────────────────────────────────────────────────────

pub struct AtBridge<C, T, D> {
    channel: C,
    clock: T,
    delay: D,
    cfg: BridgeConfig,
    state: BridgeState,
    framing: MarkerScanner,
    reply: heapless::Vec<u8, REPLY_CAPACITY>,
    cycles: u32,
}

impl<C: ByteChannel, T: TimePort, D: DelayNs> AtBridge<C, T, D> {
    pub fn new(channel: C, clock: T, delay: D, cfg: BridgeConfig) -> Self {
        Self {
            channel,
            clock,
            delay,
            cfg,
            state: BridgeState::Idle,
            framing: MarkerScanner::new(at::IPD_MARKER),
            reply: heapless::Vec::new(),
            cycles: 0,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Completed request/response cycles.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Bytes received while the last command was pending.
    pub fn last_reply(&self) -> &[u8] {
        &self.reply
    }

    // ── Bring-up ──────────────────────────────────────────────

    /// Probe the modem, join the network (if credentials are given), read
    /// back the station address and start the multiplexed server.
    ///
    /// Steps whose acknowledgement never arrives are logged and skipped
    /// past; only channel errors abort.
    pub fn setup(
        &mut self,
        wifi: Option<&WifiCredentials>,
        port: u16,
    ) -> Result<SetupReport, TransportError> {
        let mut report = SetupReport::default();

        self.expect_ok(&at::cmd_probe(), self.cfg.setup_timeout_ms, "probe")?;
        self.expect_ok(&at::cmd_dual_mode(), self.cfg.setup_timeout_ms, "mode")?;

        if let Some(wifi) = wifi {
            report.joined = self.expect_ok(
                &at::cmd_join(&wifi.ssid, &wifi.password),
                self.cfg.join_timeout_ms,
                "join",
            )?;
        } else {
            warn!("No Wi-Fi credentials configured; skipping join");
        }

        // CIFSR prints its answer before OK, so wait for OK and parse the lot.
        self.send_command(
            &at::cmd_query_address(),
            self.cfg.address_timeout_ms,
            Some(at::OK),
        )?;
        report.station_ip = at::parse_station_address(&String::from_utf8_lossy(&self.reply));
        match report.station_ip {
            Some(ip) => log::info!("Modem station address {ip}"),
            None => warn!("Modem reported no station address"),
        }

        self.expect_ok(&at::cmd_multiplex(), self.cfg.server_timeout_ms, "mux")?;
        report.server_started =
            self.expect_ok(&at::cmd_server(port), self.cfg.server_timeout_ms, "server")?;

        Ok(report)
    }

    fn expect_ok(
        &mut self,
        cmd: &str,
        timeout_ms: u32,
        step: &'static str,
    ) -> Result<bool, TransportError> {
        let reply = self.send_command(cmd, timeout_ms, Some(at::OK))?;
        if reply != Reply::Acknowledged {
            warn!("Modem {step} step: {reply:?}");
        }
        Ok(reply == Reply::Acknowledged)
    }

    // ── Command primitive ─────────────────────────────────────

    /// Write `cmd`, then collect modem output until `expect` shows up,
    /// the modem says `ERROR`, or `timeout_ms` elapses.
    ///
    /// Received bytes are logged at debug level and otherwise discarded
    /// (the first [`REPLY_CAPACITY`] are kept in [`last_reply`](Self::last_reply)).
    pub fn send_command(
        &mut self,
        cmd: &str,
        timeout_ms: u32,
        expect: Option<&'static [u8]>,
    ) -> Result<Reply, TransportError> {
        debug!(">> {}", cmd.trim_end());
        self.write_all(cmd.as_bytes())?;
        self.await_reply(timeout_ms, expect)
    }

    fn await_reply(
        &mut self,
        timeout_ms: u32,
        expect: Option<&'static [u8]>,
    ) -> Result<Reply, TransportError> {
        self.reply.clear();
        let mut wanted = expect.map(MarkerScanner::new);
        let mut error = MarkerScanner::new(at::ERROR);
        let deadline = self.clock.uptime_ms() + u64::from(timeout_ms);
        let mut buf = [0u8; 64];

        let outcome = 'wait: loop {
            while self.channel.available() {
                if self.clock.uptime_ms() >= deadline {
                    break 'wait Reply::TimedOut;
                }
                let n = self
                    .channel
                    .read(&mut buf)
                    .map_err(|e| self.fail_read(e))?;
                if n == 0 {
                    break;
                }
                for &b in &buf[..n] {
                    let _ = self.reply.push(b);
                    if wanted.as_mut().is_some_and(|s| s.feed(b)) {
                        break 'wait Reply::Acknowledged;
                    }
                    if error.feed(b) {
                        break 'wait Reply::Rejected;
                    }
                }
            }
            if self.clock.uptime_ms() >= deadline {
                break Reply::TimedOut;
            }
            self.delay.delay_ms(self.cfg.poll_step_ms);
        };

        if !self.reply.is_empty() {
            debug!("<< {}", String::from_utf8_lossy(&self.reply).trim_end());
        }
        Ok(outcome)
    }

    // ── Request cycle ─────────────────────────────────────────

    fn run_cycle<H: RequestHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<Option<Exchange>, TransportError> {
        if !self.scan_for_frame()? {
            return Ok(None);
        }

        // Let the rest of the frame arrive before draining.
        self.delay.delay_ms(self.cfg.frame_settle_ms);
        let connection_id = self.read_connection_id()?;
        self.transition(BridgeState::ConnectionIdRead);

        let pending = self.drain(connection_id)?;
        self.transition(BridgeState::RequestBuffered);

        let raw = String::from_utf8_lossy(&pending.raw);
        let response = handler.handle(&raw);
        let wire = response.encode();
        self.transition(BridgeState::Dispatched);

        let len_reply = self.send_command(
            &at::cmd_send(connection_id, wire.len()),
            self.cfg.send_length_timeout_ms,
            Some(at::SEND_PROMPT),
        )?;
        if len_reply != Reply::Acknowledged {
            warn!("CIPSEND on link {connection_id}: no prompt ({len_reply:?}), sending anyway");
        }
        self.transition(BridgeState::ResponseLengthSent);

        self.write_all(wire.as_bytes())?;
        let data_reply = self.await_reply(self.cfg.send_data_timeout_ms, Some(at::SEND_OK))?;
        if data_reply != Reply::Acknowledged {
            warn!("Link {connection_id}: response not confirmed ({data_reply:?})");
        }
        self.transition(BridgeState::ResponseDataSent);

        let close_reply = self.send_command(
            &at::cmd_close(connection_id),
            self.cfg.close_timeout_ms,
            Some(at::OK),
        )?;
        if close_reply != Reply::Acknowledged {
            warn!("Link {connection_id}: close not acknowledged ({close_reply:?})");
        }
        self.transition(BridgeState::ConnectionClosed);

        self.cycles = self.cycles.wrapping_add(1);
        Ok(Some(Exchange {
            connection_id: Some(connection_id),
            request_bytes: pending.raw.len(),
            status: response.status.code(),
            response_bytes: wire.len(),
        }))
    }

    /// Consume input until the framing marker completes.  Bounded per call;
    /// a marker split across calls is still found.
    fn scan_for_frame(&mut self) -> Result<bool, TransportError> {
        let mut byte = [0u8; 1];
        for _ in 0..MAX_SCAN_BYTES {
            if !self.channel.available() {
                return Ok(false);
            }
            let n = self
                .channel
                .read(&mut byte)
                .map_err(|e| self.fail_read(e))?;
            if n == 0 {
                return Ok(false);
            }
            if self.framing.feed(byte[0]) {
                self.transition(BridgeState::FramingDetected);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn read_connection_id(&mut self) -> Result<u8, TransportError> {
        let mut byte = [0u8; 1];
        let n = self
            .channel
            .read(&mut byte)
            .map_err(|e| self.fail_read(e))?;
        match (n, at::parse_connection_id(byte[0])) {
            (1, Some(id)) => Ok(id),
            _ => {
                warn!("Frame without a connection id");
                Err(TransportError::MalformedFrame)
            }
        }
    }

    /// One pass over whatever is buffered right now, capped at
    /// [`MAX_DRAIN_BYTES`] so a streaming client cannot hold the loop.
    fn drain(&mut self, connection_id: u8) -> Result<PendingConnection, TransportError> {
        let mut pending = PendingConnection {
            connection_id,
            raw: heapless::Vec::new(),
        };
        let mut buf = [0u8; 64];
        let mut dropped = 0usize;
        let mut consumed = 0usize;
        while consumed < MAX_DRAIN_BYTES && self.channel.available() {
            let budget = buf.len().min(MAX_DRAIN_BYTES - consumed);
            let n = self
                .channel
                .read(&mut buf[..budget])
                .map_err(|e| self.fail_read(e))?;
            if n == 0 {
                break;
            }
            let room = MAX_REQUEST_BYTES - pending.raw.len();
            let keep = n.min(room);
            // `keep` never exceeds the remaining capacity.
            let _ = pending.raw.extend_from_slice(&buf[..keep]);
            dropped += n - keep;
            consumed += n;
        }
        if dropped > 0 {
            warn!("Link {connection_id}: request truncated, {dropped} bytes dropped");
        }
        trace!("Link {connection_id}: buffered {} bytes", pending.raw.len());
        Ok(pending)
    }

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), TransportError> {
        while !data.is_empty() {
            match self.channel.write(data) {
                Ok(0) => return Err(self.abort(TransportError::ChannelWrite)),
                Ok(n) => data = &data[n..],
                Err(e) => {
                    warn!("Modem write failed: {e:?}");
                    return Err(self.abort(TransportError::ChannelWrite));
                }
            }
        }
        self.channel.flush().map_err(|e| {
            warn!("Modem flush failed: {e:?}");
            self.abort(TransportError::ChannelWrite)
        })
    }

    fn fail_read(&mut self, e: C::Error) -> TransportError {
        warn!("Modem read failed: {e:?}");
        self.abort(TransportError::ChannelRead)
    }

    fn abort(&mut self, err: TransportError) -> TransportError {
        self.framing.reset();
        self.state = BridgeState::Idle;
        err
    }

    fn transition(&mut self, next: BridgeState) {
        trace!("bridge {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl<C: ByteChannel, T: TimePort, D: DelayNs> RequestBridge for AtBridge<C, T, D> {
    fn poll<H: RequestHandler>(
        &mut self,
        handler: &mut H,
    ) -> Result<Option<Exchange>, TransportError> {
        let result = self.run_cycle(handler);
        if let Err(e) = &result {
            self.abort(*e);
        }
        self.state = BridgeState::Idle;
        result
    }
}
