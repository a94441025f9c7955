//! Outbound application events.
//!
//! The [`Dispatcher`](super::dispatcher::Dispatcher) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, test recorder, ...).

use super::commands::Action;
use super::status::StatusSnapshot;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The dispatcher has started (carries initial conditions).
    Started { threshold_c: f32, door_open: bool },

    /// A mutating command was applied.
    CommandApplied(Action),

    /// `SET_THRESHOLD` value outside `(0, 100)`; state untouched.
    ThresholdRejected(f32),

    /// Request did not match any command.
    UnknownRequest,

    /// Alarm output flipped.
    AlarmChanged { active: bool, temperature_c: f32 },

    /// Door sensor edge.
    DoorChanged { open: bool },

    /// Periodic status snapshot.
    StatusReport(StatusSnapshot),
}
