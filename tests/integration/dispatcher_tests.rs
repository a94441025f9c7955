//! Request → Dispatcher → actuators, end to end on mock hardware.

use homenode::app::commands::Action;
use homenode::app::dispatcher::Dispatcher;
use homenode::app::events::AppEvent;
use homenode::app::response::StatusCode;
use homenode::config::SystemConfig;

use super::mock_hw::{ActuatorCall, MockHardware, RecordingSink};

fn get(path: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: 10.0.0.7\r\nUser-Agent: curl/8.5\r\n\r\n")
}

fn started(temp: f32) -> (Dispatcher, MockHardware, RecordingSink) {
    let mut d = Dispatcher::new(&SystemConfig::default());
    let mut hw = MockHardware::new(temp);
    let mut sink = RecordingSink::new();
    d.start(0, &mut hw, &mut sink);
    (d, hw, sink)
}

#[test]
fn start_parks_outputs_and_announces() {
    let (_, hw, sink) = started(21.0);
    assert_eq!(hw.calls.first(), Some(&ActuatorCall::AllOff));
    assert!(matches!(
        sink.events.first(),
        Some(AppEvent::Started { door_open: false, .. })
    ));
}

#[test]
fn threshold_change_shows_in_status() {
    let (mut d, mut hw, mut sink) = started(21.0);

    let r = d.handle_request(&get("/SET_THRESHOLD:30.5"), &mut hw, &mut sink);
    assert_eq!(r.status, StatusCode::Ok);

    let r = d.handle_request(&get("/STATUS"), &mut hw, &mut sink);
    assert!(r.body.ends_with("THRESHOLD:30.5"), "{}", r.body);
    assert!((d.state().alarm_threshold_c() - 30.5).abs() < f32::EPSILON);
}

#[test]
fn unknown_request_is_404_and_inert() {
    let (mut d, mut hw, mut sink) = started(21.0);
    let calls_before = hw.calls.len();
    let before = d.state().clone();

    let r = d.handle_request(&get("/FOO"), &mut hw, &mut sink);
    assert_eq!(r.status, StatusCode::NotFound);
    assert!(r.encode().contains("Access-Control-Allow-Origin: *"));
    assert_eq!(d.state(), &before);
    assert_eq!(hw.calls.len(), calls_before, "no actuator touched");
    assert_eq!(sink.count(|e| *e == AppEvent::UnknownRequest), 1);
}

#[test]
fn garbage_threshold_is_rejected_silently() {
    let (mut d, mut hw, mut sink) = started(21.0);
    let r = d.handle_request(&get("/SET_THRESHOLD:abc"), &mut hw, &mut sink);
    assert_eq!(r.status, StatusCode::Ok);
    assert!(r.body.ends_with("THRESHOLD:27.0"));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ThresholdRejected(_))),
        1
    );
}

#[test]
fn toggle_twice_restores_lamp() {
    let (mut d, mut hw, mut sink) = started(21.0);
    d.handle_request(&get("/LAMP_TOGGLE"), &mut hw, &mut sink);
    assert!(hw.lamp_on());
    let r = d.handle_request(&get("/LAMP_TOGGLE"), &mut hw, &mut sink);
    assert!(!hw.lamp_on());
    assert!(r.body.contains("LAMP:OFF"));
}

#[test]
fn status_is_recomputed_from_fresh_readings() {
    let (mut d, mut hw, mut sink) = started(21.0);
    let reads = hw.reads;
    hw.temperature_c = 35.25;
    hw.door_open = true;

    let r = d.handle_request(&get("/STATUS"), &mut hw, &mut sink);
    assert_eq!(hw.reads, reads + 1);
    assert_eq!(
        r.body,
        "TEMP:35.25,DOOR:OPEN,LAMP:OFF,PLUG:OFF,ALARM:ALARM,THRESHOLD:27.0"
    );
    assert!(hw.buzzer_on());
}

#[test]
fn alarm_override_and_release() {
    let (mut d, mut hw, mut sink) = started(10.0);
    d.dispatch(Action::AlarmOn, &mut hw, &mut sink);
    assert!(hw.buzzer_on());
    let r = d.dispatch(Action::AlarmOff, &mut hw, &mut sink);
    assert!(!hw.buzzer_on());
    assert!(r.body.contains("ALARM:SAFE"));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::AlarmChanged { .. })),
        2
    );
}

#[test]
fn every_command_answers_with_six_fields() {
    let (mut d, mut hw, mut sink) = started(24.0);
    for path in [
        "/LAMP_ON",
        "/LAMP_OFF",
        "/PLUG_ON",
        "/PLUG_OFF",
        "/ALARM_ON",
        "/ALARM_OFF",
        "/SET_THRESHOLD:45",
        "/STATUS",
    ] {
        let r = d.handle_request(&get(path), &mut hw, &mut sink);
        assert_eq!(r.status, StatusCode::Ok, "{path}");
        assert_eq!(r.body.split(',').count(), 6, "{path}: {}", r.body);
    }
}

#[test]
fn index_page_is_served() {
    let (mut d, mut hw, mut sink) = started(24.0);
    let r = d.handle_request(&get("/"), &mut hw, &mut sink);
    assert_eq!(r.status, StatusCode::Ok);
    assert_eq!(r.content_type, "text/html");
    assert!(r.body.contains("/LAMP_TOGGLE"));
}
