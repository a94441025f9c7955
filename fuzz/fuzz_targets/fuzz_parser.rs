//! Fuzz target: request parser + dispatcher
//!
//! Feeds arbitrary (lossily decoded) request fragments through the parser
//! and a dispatcher on null hardware, verifying:
//! - No panics under any byte sequence
//! - The threshold never leaves (0, 100)
//! - Every 200 response carries a six-field status line
//!
//! cargo fuzz run fuzz_parser

#![no_main]

use homenode::app::commands::Action;
use homenode::app::dispatcher::Dispatcher;
use homenode::app::events::AppEvent;
use homenode::app::parser;
use homenode::app::ports::{ActuatorPort, EventSink, SensorPort};
use homenode::app::response::StatusCode;
use homenode::app::status::STATUS_FIELDS;
use homenode::config::SystemConfig;
use homenode::sensors::SensorSnapshot;
use libfuzzer_sys::fuzz_target;

struct NullHw;

impl SensorPort for NullHw {
    fn read_all(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            temperature_c: 24.0,
            door_open: false,
        }
    }
}

impl ActuatorPort for NullHw {
    fn set_lamp(&mut self, _on: bool) {}
    fn set_plug(&mut self, _on: bool) {}
    fn set_buzzer(&mut self, _on: bool) {}
    fn all_off(&mut self) {}
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);

    // Wrapped in a request line too, so the token path is reached.
    let framed = format!("GET /{raw} HTTP/1.1\r\n\r\n");
    for input in [raw.as_ref(), framed.as_str()] {
        if parser::parse(input) == Action::Index {
            assert!(parser::extract_token(input) == Some(""));
        }

        let mut d = Dispatcher::new(&SystemConfig::default());
        let (mut hw, mut sink) = (NullHw, NullSink);
        d.start(0, &mut hw, &mut sink);
        let r = d.handle_request(input, &mut hw, &mut sink);

        let t = d.state().alarm_threshold_c();
        assert!(t > 0.0 && t < 100.0, "threshold {t} escaped the range");
        if r.status == StatusCode::Ok && r.content_type == "text/plain" {
            assert_eq!(r.body.split(',').count(), STATUS_FIELDS);
        }
    }
});
