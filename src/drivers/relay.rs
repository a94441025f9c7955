//! Relay module driver (lamp and plug channels).
//!
//! The common opto-isolated relay boards energise on a LOW input, so the
//! electrical level is the inverse of the logical state unless the board
//! is configured as active-high.
//!
//! On ESP-IDF: drives the GPIO via hw_init helpers.
//! On host/test: the simulated pin level is observable through
//! `hw_init::gpio_read`.

use crate::drivers::hw_init;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Off,
    On,
}

pub struct Relay {
    gpio: i32,
    active_low: bool,
    state: RelayState,
}

impl Relay {
    /// Create the driver and immediately drive the output off.
    pub fn new(gpio: i32, active_low: bool) -> Self {
        let mut relay = Self {
            gpio,
            active_low,
            state: RelayState::Off,
        };
        relay.set(false);
        relay
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(self.gpio, on != self.active_low);
        self.state = if on { RelayState::On } else { RelayState::Off };
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == RelayState::On
    }
}
