//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and all output drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only
//! module in the system that touches actual hardware.  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::SystemConfig;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::relay::Relay;
use crate::sensors::{SensorHub, SensorSnapshot};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<D> {
    sensor_hub: SensorHub<D>,
    lamp: Relay,
    plug: Relay,
    buzzer: Buzzer,
}

impl<D: DelayNs> HardwareAdapter<D> {
    pub fn new(sensor_hub: SensorHub<D>, lamp: Relay, plug: Relay, buzzer: Buzzer) -> Self {
        Self {
            sensor_hub,
            lamp,
            plug,
            buzzer,
        }
    }

    /// Wire every driver from the configured pin map.  Outputs start off.
    pub fn from_config(config: &SystemConfig, delay: D) -> Self {
        let pins = &config.pins;
        Self::new(
            SensorHub::from_config(config, delay),
            Relay::new(pins.lamp_relay, config.relays_active_low),
            Relay::new(pins.plug_relay, config.relays_active_low),
            Buzzer::new(pins.buzzer),
        )
    }

    pub fn lamp_on(&self) -> bool {
        self.lamp.is_on()
    }

    pub fn plug_on(&self) -> bool {
        self.plug.is_on()
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer.is_on()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<D: DelayNs> SensorPort for HardwareAdapter<D> {
    fn read_all(&mut self) -> SensorSnapshot {
        self.sensor_hub.read_all()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<D: DelayNs> ActuatorPort for HardwareAdapter<D> {
    fn set_lamp(&mut self, on: bool) {
        self.lamp.set(on);
    }

    fn set_plug(&mut self, on: bool) {
        self.plug.set(on);
    }

    fn set_buzzer(&mut self, on: bool) {
        self.buzzer.set(on);
    }

    fn all_off(&mut self) {
        self.lamp.set(false);
        self.plug.set(false);
        self.buzzer.set(false);
    }
}
