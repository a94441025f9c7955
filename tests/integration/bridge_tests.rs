//! AT bridge against a scripted modem.
//!
//! Every test drives a real `Dispatcher` behind the bridge so the bytes
//! written back to the "modem" are exactly what a client would receive.

use homenode::app::dispatcher::Dispatcher;
use homenode::app::response::Response;
use homenode::config::{BridgeConfig, SystemConfig, WifiCredentials};
use homenode::error::TransportError;
use homenode::transport::{ByteChannel, RequestBridge};
use homenode::transport::at_bridge::{AtBridge, BridgeState, MAX_REQUEST_BYTES};

use super::mock_hw::{FakeClock, FakeDelay, MockHardware, RecordingSink, ScriptedChannel, Ticks, ticks};

type Bridge = AtBridge<ScriptedChannel, FakeClock, FakeDelay>;

const REQUEST_END: &str = "Connection: close\r\n\r\n";

fn bridge(ch: &ScriptedChannel, t: &Ticks) -> Bridge {
    AtBridge::new(
        ch.clone(),
        FakeClock(t.clone()),
        FakeDelay(t.clone()),
        BridgeConfig::default(),
    )
}

fn ms(t: &Ticks) -> u64 {
    t.get() / 1_000_000
}

/// A modem that acknowledges everything for one connection id.
fn cooperative_modem(ch: &ScriptedChannel, id: u8) {
    ch.on(&format!("AT+CIPSEND={id},"), "\r\nOK\r\n> ")
        .on(REQUEST_END, "\r\nRecv 150 bytes\r\n\r\nSEND OK\r\n")
        .on(&format!("AT+CIPCLOSE={id}"), &format!("\r\n{id},CLOSED\r\n\r\nOK\r\n"));
}

fn frame(id: u8, path: &str) -> Vec<u8> {
    let body = format!("GET {path} HTTP/1.1\r\nHost: 192.168.1.50\r\nAccept: */*\r\n\r\n");
    format!("{id},CONNECT\r\n\r\n+IPD,{id},{}:{body}", body.len()).into_bytes()
}

struct Core {
    dispatcher: Dispatcher,
    hw: MockHardware,
    sink: RecordingSink,
}

impl Core {
    fn new(temp: f32) -> Self {
        let mut core = Self {
            dispatcher: Dispatcher::new(&SystemConfig::default()),
            hw: MockHardware::new(temp),
            sink: RecordingSink::new(),
        };
        core.dispatcher.start(0, &mut core.hw, &mut core.sink);
        core
    }

    fn handler(&mut self) -> impl FnMut(&str) -> Response + '_ {
        move |raw: &str| self.dispatcher.handle_request(raw, &mut self.hw, &mut self.sink)
    }
}

// ── Full cycle ────────────────────────────────────────────────

#[test]
fn full_cycle_answers_on_the_same_link() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);

    cooperative_modem(&ch, 3);
    ch.push_inbound(&frame(3, "/LAMP_ON"));

    let x = b
        .poll(&mut core.handler())
        .expect("cycle")
        .expect("exchange");

    assert_eq!(x.connection_id, Some(3));
    assert_eq!(x.status, 200);
    assert_eq!(b.state(), BridgeState::Idle);
    assert_eq!(b.cycles(), 1);
    assert!(core.hw.lamp_on());
    assert_eq!(ch.pending_triggers(), 0, "every modem step was reached");

    let out = ch.outbound();
    let send = format!("AT+CIPSEND=3,{}\r\n", x.response_bytes);
    let send_at = out.find(&send).expect("CIPSEND with exact length");
    let data_at = out.find("HTTP/1.1 200 OK").expect("response bytes");
    let close_at = out.find("AT+CIPCLOSE=3\r\n").expect("close");
    assert!(send_at < data_at && data_at < close_at);
    assert!(out.contains("LAMP:ON"));
    assert!(out.contains("Access-Control-Allow-Origin: *"));

    // Acks arrived immediately: only the settle delay and poll steps elapsed.
    assert!(ms(&t) < 100, "took {}ms", ms(&t));
}

#[test]
fn idle_channel_returns_none() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    assert_eq!(b.poll(&mut core.handler()), Ok(None));

    ch.push_inbound(b"WIFI CONNECTED\r\nWIFI GOT IP\r\n");
    assert_eq!(b.poll(&mut core.handler()), Ok(None));
    assert!(ch.outbound().is_empty());
}

#[test]
fn marker_split_across_polls_is_found() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    cooperative_modem(&ch, 1);

    let f = frame(1, "/PLUG_ON");
    let split = f.windows(3).position(|w| w == b"+IP").expect("marker") + 3;
    ch.push_inbound(&f[..split]);
    assert_eq!(b.poll(&mut core.handler()), Ok(None));

    ch.push_inbound(&f[split..]);
    let x = b.poll(&mut core.handler()).expect("cycle").expect("exchange");
    assert_eq!(x.connection_id, Some(1));
    assert!(core.hw.plug_on());
}

#[test]
fn unknown_path_gets_404_with_cors() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    cooperative_modem(&ch, 0);
    ch.push_inbound(&frame(0, "/FOO"));

    let x = b.poll(&mut core.handler()).expect("cycle").expect("exchange");
    assert_eq!(x.status, 404);
    let out = ch.outbound();
    assert!(out.contains("HTTP/1.1 404 Not Found"));
    assert!(out.contains("Access-Control-Allow-Origin: *"));
    assert!(core.hw.calls.iter().all(|c| !matches!(
        c,
        super::mock_hw::ActuatorCall::Lamp(true) | super::mock_hw::ActuatorCall::Plug(true)
    )));
}

// ── Timeouts ──────────────────────────────────────────────────

#[test]
fn unacknowledged_close_still_returns_to_idle() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    ch.on("AT+CIPSEND=0,", "> ")
        .on(REQUEST_END, "SEND OK\r\n");
    ch.push_inbound(&frame(0, "/STATUS"));

    let x = b.poll(&mut core.handler()).expect("cycle");
    assert!(x.is_some());
    assert_eq!(b.state(), BridgeState::Idle);
    assert!(ch.outbound().ends_with("AT+CIPCLOSE=0\r\n"), "close sent once, not retried");
    assert!(ms(&t) >= 1_000, "waited out the close timeout ({}ms)", ms(&t));
    assert!(ms(&t) < 1_200);
}

#[test]
fn missing_prompt_still_sends_response() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    ch.push_inbound(&frame(2, "/STATUS"));

    let x = b.poll(&mut core.handler()).expect("cycle").expect("exchange");
    assert_eq!(x.connection_id, Some(2));
    let out = ch.outbound();
    assert!(out.contains("HTTP/1.1 200 OK"));
    assert!(out.contains("AT+CIPCLOSE=2"));
    // settle + prompt + send + close timeouts, nothing more.
    let ceiling = 50 + 500 + 100 + 1_000;
    assert!(ms(&t) >= 1_600 && ms(&t) <= ceiling + 20, "{}ms", ms(&t));
}

#[test]
fn modem_error_on_send_does_not_hang() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    ch.on("AT+CIPSEND=0,", "link is not valid\r\nERROR\r\n");
    ch.push_inbound(&frame(0, "/STATUS"));

    assert!(b.poll(&mut core.handler()).expect("cycle").is_some());
    assert_eq!(b.state(), BridgeState::Idle);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn non_digit_connection_id_is_malformed() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    ch.push_inbound(b"+IPD,x,5:hello");

    assert_eq!(
        b.poll(&mut core.handler()),
        Err(TransportError::MalformedFrame)
    );
    assert_eq!(b.state(), BridgeState::Idle);
    assert!(ch.outbound().is_empty(), "nothing answered");

    // The bridge recovers on the next frame.
    cooperative_modem(&ch, 4);
    ch.push_inbound(&frame(4, "/STATUS"));
    let x = b.poll(&mut core.handler()).expect("cycle").expect("exchange");
    assert_eq!(x.connection_id, Some(4));
}

#[test]
fn read_failure_aborts_cycle() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    ch.set_fail_reads(true);
    assert_eq!(b.poll(&mut core.handler()), Err(TransportError::ChannelRead));
    assert_eq!(b.state(), BridgeState::Idle);
}

#[test]
fn write_failure_aborts_cycle() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    ch.push_inbound(&frame(0, "/LAMP_ON"));
    ch.set_fail_writes(true);

    assert_eq!(b.poll(&mut core.handler()), Err(TransportError::ChannelWrite));
    assert_eq!(b.state(), BridgeState::Idle);
    assert!(core.hw.lamp_on(), "the command itself was applied before the send");
}

#[test]
fn oversized_request_is_truncated_not_rejected() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let mut core = Core::new(22.0);
    cooperative_modem(&ch, 0);
    let mut f = frame(0, "/PLUG_ON");
    f.extend(std::iter::repeat_n(b'x', 4_000));
    ch.push_inbound(&f);

    let x = b.poll(&mut core.handler()).expect("cycle").expect("exchange");
    assert_eq!(x.request_bytes, MAX_REQUEST_BYTES);
    assert_eq!(x.status, 200);
    assert!(core.hw.plug_on());
}

/// Sends one frame, then `.` forever; every read costs a millisecond.
struct StreamingModem {
    head: std::collections::VecDeque<u8>,
    ticks: Ticks,
}

impl ByteChannel for StreamingModem {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        self.ticks.set(self.ticks.get() + 1_000_000);
        for slot in buf.iter_mut() {
            *slot = self.head.pop_front().unwrap_or(b'.');
        }
        Ok(buf.len())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        true
    }
}

#[test]
fn endless_modem_output_cannot_hold_the_cycle() {
    let t = ticks();
    let modem = StreamingModem {
        head: b"+IPD,0,20:GET /STATUS HTTP/1.1\r\n\r\n".iter().copied().collect(),
        ticks: t.clone(),
    };
    let mut b = AtBridge::new(
        modem,
        FakeClock(t.clone()),
        FakeDelay(t.clone()),
        BridgeConfig::default(),
    );
    let mut core = Core::new(22.0);

    let x = b.poll(&mut core.handler()).expect("cycle").expect("exchange");
    assert_eq!(x.status, 200);
    assert_eq!(x.request_bytes, MAX_REQUEST_BYTES);
    assert_eq!(b.state(), BridgeState::Idle);
    // Every wait ran to its deadline; the drain stopped at its byte cap.
    let waits = 50 + 500 + 100 + 1_000;
    assert!(ms(&t) >= waits && ms(&t) < waits + 150, "{}ms", ms(&t));
}

// ── Bring-up ──────────────────────────────────────────────────

fn wifi() -> WifiCredentials {
    WifiCredentials {
        ssid: "HomeNet".into(),
        password: "hunter22".into(),
    }
}

#[test]
fn setup_runs_the_full_sequence() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    ch.on("AT\r\n", "AT\r\n\r\nOK\r\n")
        .on("AT+CWMODE=3\r\n", "OK\r\n")
        .on("AT+CWJAP=\"HomeNet\",\"hunter22\"\r\n", "WIFI CONNECTED\r\nWIFI GOT IP\r\n\r\nOK\r\n")
        .on(
            "AT+CIFSR\r\n",
            "+CIFSR:APIP,\"192.168.4.1\"\r\n+CIFSR:STAIP,\"192.168.1.50\"\r\n\r\nOK\r\n",
        )
        .on("AT+CIPMUX=1\r\n", "OK\r\n")
        .on("AT+CIPSERVER=1,8080\r\n", "OK\r\n");

    let report = b.setup(Some(&wifi()), 8080).expect("setup");
    assert!(report.joined);
    assert!(report.server_started);
    assert_eq!(report.station_ip, Some("192.168.1.50".parse().expect("ip")));
    assert_eq!(ch.pending_triggers(), 0);
    assert!(ms(&t) < 50, "all steps acknowledged promptly");
}

#[test]
fn setup_survives_join_failure_and_silence() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    ch.on("AT\r\n", "OK\r\n")
        .on("AT+CWMODE=3\r\n", "OK\r\n")
        .on("AT+CWJAP=", "+CWJAP:3\r\n\r\nFAIL\r\nERROR\r\n");

    let report = b.setup(Some(&wifi()), 80).expect("setup");
    assert!(!report.joined);
    assert_eq!(report.station_ip, None);
    assert!(!report.server_started);

    let out = ch.outbound();
    assert!(out.contains("AT+CIPMUX=1\r\n"));
    assert!(out.ends_with("AT+CIPSERVER=1,80\r\n"));
    // CIFSR, CIPMUX and CIPSERVER each waited out their timeout.
    assert!(ms(&t) >= 3_000 + 1_000 + 1_000);
}

#[test]
fn setup_without_credentials_skips_join() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut b = bridge(&ch, &t);
    let report = b.setup(None, 80).expect("setup");
    assert!(!report.joined);
    assert!(!ch.outbound().contains("CWJAP"));
}
