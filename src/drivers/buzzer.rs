//! Active piezo buzzer (self-oscillating, driven HIGH to sound).

use log::debug;

use crate::drivers::hw_init;

pub struct Buzzer {
    gpio: i32,
    on: bool,
}

impl Buzzer {
    pub fn new(gpio: i32) -> Self {
        hw_init::gpio_write(gpio, false);
        Self { gpio, on: false }
    }

    /// Only touches the pin on a change; the alarm is re-evaluated every tick.
    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        hw_init::gpio_write(self.gpio, on);
        self.on = on;
        debug!("buzzer {}", if on { "on" } else { "off" });
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
