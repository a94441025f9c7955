//! Controller loop: bridge polling, error containment and housekeeping.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use homenode::app::events::AppEvent;
use homenode::config::{BridgeConfig, SystemConfig};
use homenode::controller::Controller;
use homenode::transport::at_bridge::AtBridge;
use homenode::transport::socket::SocketBridge;

use super::mock_hw::{
    FakeClock, FakeDelay, MockHardware, RecordingSink, ScriptedChannel, Ticks, ticks,
};

type ModemController =
    Controller<AtBridge<ScriptedChannel, FakeClock, FakeDelay>, MockHardware, RecordingSink, FakeClock>;

fn modem_controller(ch: &ScriptedChannel, t: &Ticks, temp: f32) -> ModemController {
    let config = SystemConfig::default();
    let bridge = AtBridge::new(
        ch.clone(),
        FakeClock(t.clone()),
        FakeDelay(t.clone()),
        BridgeConfig::default(),
    );
    let mut c = Controller::new(
        &config,
        bridge,
        MockHardware::new(temp),
        RecordingSink::new(),
        FakeClock(t.clone()),
    );
    c.start();
    c
}

fn advance_ms(t: &Ticks, ms: u64) {
    t.set(t.get() + ms * 1_000_000);
}

#[test]
fn tick_serves_a_modem_request() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut c = modem_controller(&ch, &t, 22.0);

    ch.on("AT+CIPSEND=0,", "> ")
        .on("Connection: close\r\n\r\n", "SEND OK\r\n")
        .on("AT+CIPCLOSE=0", "OK\r\n");
    ch.push_inbound(b"+IPD,0,40:GET /PLUG_ON HTTP/1.1\r\nHost: x\r\n\r\n");

    let x = c.tick().expect("served");
    assert_eq!(x.status, 200);
    assert!(c.hw().plug_on());
    assert_eq!(c.served(), 1);
    assert!(c.dispatcher().state().plug_on);

    assert!(c.tick().is_none(), "nothing pending");
}

#[test]
fn transport_errors_are_contained() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut c = modem_controller(&ch, &t, 22.0);
    let reads = c.hw().reads;

    ch.set_fail_reads(true);
    assert!(c.tick().is_none());
    assert_eq!(c.transport_errors(), 1);
    assert_eq!(c.hw().reads, reads + 1, "housekeeping still ran");

    ch.set_fail_reads(false);
    assert!(c.tick().is_none());
    assert_eq!(c.transport_errors(), 1);
}

#[test]
fn housekeeping_tracks_sensors_between_requests() {
    let (ch, t) = (ScriptedChannel::new(), ticks());
    let mut c = modem_controller(&ch, &t, 22.0);

    c.hw_mut().temperature_c = 28.0;
    c.hw_mut().door_open = true;
    c.tick();
    assert!(c.hw().buzzer_on());
    assert!(c.dispatcher().alarm_active());
    assert_eq!(
        c.sink().count(|e| *e == AppEvent::DoorChanged { open: true }),
        1
    );

    advance_ms(&t, 5_000);
    c.tick();
    assert_eq!(
        c.sink().count(|e| matches!(e, AppEvent::StatusReport(_))),
        1
    );
    c.tick();
    assert_eq!(
        c.sink().count(|e| matches!(e, AppEvent::StatusReport(_))),
        1,
        "next report only after another interval"
    );
}

#[test]
fn socket_bridge_end_to_end() {
    let t = ticks();
    let bridge = SocketBridge::bind("127.0.0.1:0", 500).expect("bind");
    let addr = bridge.local_addr().expect("addr");
    let mut c = Controller::new(
        &SystemConfig::default(),
        bridge,
        MockHardware::new(23.5),
        RecordingSink::new(),
        FakeClock(t.clone()),
    );
    c.start();

    let client = thread::spawn(move || {
        let mut s = TcpStream::connect(addr).expect("connect");
        s.write_all(b"GET /LAMP_ON HTTP/1.1\r\nHost: test\r\n\r\n")
            .expect("send");
        let mut reply = String::new();
        s.read_to_string(&mut reply).expect("recv");
        reply
    });

    let mut served = None;
    for _ in 0..500 {
        served = c.tick();
        if served.is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    let x = served.expect("request served");
    assert_eq!(x.connection_id, None);
    assert!(c.hw().lamp_on());

    let reply = client.join().expect("client");
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Access-Control-Allow-Origin: *"));
    assert!(reply.ends_with("TEMP:23.50,DOOR:CLOSED,LAMP:ON,PLUG:OFF,ALARM:SAFE,THRESHOLD:27.0"));
}
