//! Device state and alarm evaluation.
//!
//! [`DeviceState`] is owned by the [`Dispatcher`](super::dispatcher::Dispatcher)
//! and only ever mutated from the control loop.

use crate::config::threshold_in_range;

use super::commands::Action;

/// Result of applying one [`Action`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyOutcome {
    /// State changed (or was already in the requested state).
    Applied,
    /// Read-only action; nothing to do.
    NoChange,
    /// `SetThreshold` value outside `(0, 100)`; state untouched.
    ThresholdRejected(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub lamp_on: bool,
    pub plug_on: bool,
    /// Forces the alarm on regardless of temperature.
    pub alarm_override: bool,
    /// Invariant: `0 < alarm_threshold_c < 100`.
    alarm_threshold_c: f32,
    /// Last sampled door level, only used for edge detection.
    door_open: bool,
}

impl DeviceState {
    /// All actuators off, given threshold.
    ///
    /// An out-of-range `threshold_c` falls back to the 27 C factory default.
    pub fn new(threshold_c: f32) -> Self {
        let threshold = if threshold_in_range(threshold_c) {
            threshold_c
        } else {
            crate::config::DEFAULT_ALARM_THRESHOLD_C
        };
        Self {
            lamp_on: false,
            plug_on: false,
            alarm_override: false,
            alarm_threshold_c: threshold,
            door_open: false,
        }
    }

    pub fn alarm_threshold_c(&self) -> f32 {
        self.alarm_threshold_c
    }

    pub fn door_open(&self) -> bool {
        self.door_open
    }

    /// Apply a parsed action.
    pub fn apply(&mut self, action: &Action) -> ApplyOutcome {
        match *action {
            Action::LampOn => self.lamp_on = true,
            Action::LampOff => self.lamp_on = false,
            Action::LampToggle => self.lamp_on = !self.lamp_on,
            Action::PlugOn => self.plug_on = true,
            Action::PlugOff => self.plug_on = false,
            Action::AlarmOn => self.alarm_override = true,
            Action::AlarmOff => self.alarm_override = false,
            Action::SetThreshold(value) => {
                // NaN fails both comparisons.
                if !threshold_in_range(value) {
                    return ApplyOutcome::ThresholdRejected(value);
                }
                self.alarm_threshold_c = value;
            }
            Action::Status | Action::Index | Action::Unknown => return ApplyOutcome::NoChange,
        }
        ApplyOutcome::Applied
    }

    /// `temperature > threshold || override`.  No hysteresis.
    pub fn alarm_active(&self, temperature_c: f32) -> bool {
        temperature_c > self.alarm_threshold_c || self.alarm_override
    }

    /// Record a fresh door sample.  Returns `Some(open)` on an edge.
    pub fn observe_door(&mut self, open: bool) -> Option<bool> {
        if open == self.door_open {
            return None;
        }
        self.door_open = open;
        Some(open)
    }

    /// Seed the door cache without reporting an edge (start-up).
    pub fn seed_door(&mut self, open: bool) {
        self.door_open = open;
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ALARM_THRESHOLD_C)
    }
}
