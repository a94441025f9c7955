//! Status line rendering.
//!
//! ```text
//! TEMP:24.37,DOOR:CLOSED,LAMP:ON,PLUG:OFF,ALARM:SAFE,THRESHOLD:27.0
//! ```
//!
//! Field order and decimal places are fixed.  Clients split on `,` and `:`
//! so no field value may ever contain either.

use core::fmt;

use super::state::DeviceState;

/// Number of `KEY:value` fields in a status line.
pub const STATUS_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub temperature_c: f32,
    pub door_open: bool,
    pub lamp_on: bool,
    pub plug_on: bool,
    pub alarm_active: bool,
    pub threshold_c: f32,
}

impl StatusSnapshot {
    /// Combine a fresh sensor reading with the current device state.
    pub fn capture(state: &DeviceState, temperature_c: f32, door_open: bool) -> Self {
        Self {
            temperature_c,
            door_open,
            lamp_on: state.lamp_on,
            plug_on: state.plug_on,
            alarm_active: state.alarm_active(temperature_c),
            threshold_c: state.alarm_threshold_c(),
        }
    }

    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TEMP:{:.2},DOOR:{},LAMP:{},PLUG:{},ALARM:{},THRESHOLD:{:.1}",
            self.temperature_c,
            if self.door_open { "OPEN" } else { "CLOSED" },
            on_off(self.lamp_on),
            on_off(self.plug_on),
            if self.alarm_active { "ALARM" } else { "SAFE" },
            self.threshold_c,
        )
    }
}
