//! Door reed switch.
//!
//! Plain digital input with a pull-up.  Which level means "open" depends on
//! how the switch is wired, so the polarity comes from configuration.

use crate::config::Level;
use crate::drivers::hw_init;

pub struct DoorSensor {
    gpio: i32,
    open_level: Level,
}

impl DoorSensor {
    pub fn new(gpio: i32, open_level: Level) -> Self {
        Self { gpio, open_level }
    }

    /// `true` if the door currently reads open.
    pub fn is_open(&self) -> bool {
        hw_init::gpio_read(self.gpio) == self.open_level.is_high()
    }
}
