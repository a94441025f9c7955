//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces a [`SensorSnapshot`] on
//! demand.  Snapshots are never cached: the dispatcher asks for a fresh one
//! on every loop tick and on every request.

pub mod door;
pub mod temperature;

use embedded_hal::delay::DelayNs;

use crate::config::SystemConfig;
use door::DoorSensor;
use temperature::TemperatureSensor;

/// One coherent reading of every sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    pub temperature_c: f32,
    pub door_open: bool,
}

/// Aggregates all sensor drivers and produces a unified snapshot.
pub struct SensorHub<D> {
    pub temperature: TemperatureSensor<D>,
    pub door: DoorSensor,
}

impl<D: DelayNs> SensorHub<D> {
    pub fn new(temperature: TemperatureSensor<D>, door: DoorSensor) -> Self {
        Self { temperature, door }
    }

    /// Build the drivers from configuration.
    pub fn from_config(config: &SystemConfig, delay: D) -> Self {
        Self::new(
            TemperatureSensor::new(
                config.pins.ntc_adc_channel,
                config.thermistor.clone(),
                delay,
            ),
            DoorSensor::new(config.pins.door_sensor, config.door_open_level),
        )
    }

    /// Read every sensor and return a unified snapshot.
    pub fn read_all(&mut self) -> SensorSnapshot {
        let temp = self.temperature.read();
        SensorSnapshot {
            temperature_c: temp.celsius,
            door_open: self.door.is_open(),
        }
    }
}
