//! Command dispatcher: the hexagonal core.
//!
//! [`Dispatcher`] owns the [`DeviceState`] and is the only thing that
//! mutates it.  Both transports feed it raw request fragments; the loop
//! additionally calls [`Dispatcher::poll`] every iteration so the alarm
//! and door edges track the sensors even when no client is connected.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       Dispatcher        │
//! ActuatorPort ◀──│  parse · state · alarm  │ ──▶ Response
//!                 └────────────────────────┘
//! ```

use log::{debug, info};

use crate::config::SystemConfig;

use super::commands::Action;
use super::events::AppEvent;
use super::parser;
use super::ports::{ActuatorPort, EventSink, SensorPort};
use super::response::Response;
use super::state::{ApplyOutcome, DeviceState};
use super::status::StatusSnapshot;

// ───────────────────────────────────────────────────────────────
// Dispatcher
// ───────────────────────────────────────────────────────────────

pub struct Dispatcher {
    state: DeviceState,
    /// Last alarm decision, drives the buzzer.
    alarm_active: bool,
    report_interval_ms: u64,
    last_report_ms: u64,
}

impl Dispatcher {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: DeviceState::new(config.default_alarm_threshold_c),
            alarm_active: false,
            report_interval_ms: u64::from(config.status_report_interval_ms),
            last_report_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Park every output, seed the door cache and take the first alarm
    /// decision.  Call once before the loop starts.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        hw.all_off();
        let snap = hw.read_all();
        self.state.seed_door(snap.door_open);
        self.last_report_ms = now_ms;
        sink.emit(&AppEvent::Started {
            threshold_c: self.state.alarm_threshold_c(),
            door_open: snap.door_open,
        });
        self.evaluate_alarm(snap.temperature_c, hw, sink);
        info!(
            "Dispatcher started: threshold={:.1}C door={}",
            self.state.alarm_threshold_c(),
            if snap.door_open { "open" } else { "closed" }
        );
    }

    // ── Requests ──────────────────────────────────────────────

    /// Parse a raw request fragment and answer it.
    pub fn handle_request(
        &mut self,
        raw: &str,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Response {
        let action = parser::parse(raw);
        debug!("request -> {action}");
        self.dispatch(action, hw, sink)
    }

    /// Apply one action and build the response.
    pub fn dispatch(
        &mut self,
        action: Action,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Response {
        match action {
            Action::Unknown => {
                sink.emit(&AppEvent::UnknownRequest);
                return Response::not_found();
            }
            Action::Index => return Response::index(),
            _ => {}
        }

        if action.is_mutating() {
            match self.state.apply(&action) {
                ApplyOutcome::Applied => {
                    self.drive_relays(hw);
                    sink.emit(&AppEvent::CommandApplied(action));
                }
                ApplyOutcome::ThresholdRejected(value) => {
                    sink.emit(&AppEvent::ThresholdRejected(value));
                }
                ApplyOutcome::NoChange => {}
            }
        }

        let snap = hw.read_all();
        self.evaluate_alarm(snap.temperature_c, hw, sink);
        let status = StatusSnapshot::capture(&self.state, snap.temperature_c, snap.door_open);
        Response::ok_text(status.serialize())
    }

    // ── Per-tick housekeeping ─────────────────────────────────

    /// Re-sample sensors, update the alarm, report door edges and emit the
    /// periodic status report when due.
    pub fn poll(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        let snap = hw.read_all();
        self.evaluate_alarm(snap.temperature_c, hw, sink);

        if let Some(open) = self.state.observe_door(snap.door_open) {
            sink.emit(&AppEvent::DoorChanged { open });
        }

        if now_ms.saturating_sub(self.last_report_ms) >= self.report_interval_ms {
            self.last_report_ms = now_ms;
            sink.emit(&AppEvent::StatusReport(StatusSnapshot::capture(
                &self.state,
                snap.temperature_c,
                snap.door_open,
            )));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm_active
    }

    // ── Internal ──────────────────────────────────────────────

    fn drive_relays(&self, hw: &mut impl ActuatorPort) {
        hw.set_lamp(self.state.lamp_on);
        hw.set_plug(self.state.plug_on);
    }

    fn evaluate_alarm(
        &mut self,
        temperature_c: f32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let active = self.state.alarm_active(temperature_c);
        if active != self.alarm_active {
            self.alarm_active = active;
            sink.emit(&AppEvent::AlarmChanged {
                active,
                temperature_c,
            });
        }
        hw.set_buzzer(active);
    }
}
