//! NTC thermistor temperature sensor (100 kOhm @ 25 C, B = 3950).
//!
//! Wired in a voltage divider with a fixed reference resistor and read
//! through the ADC.  A single read is too noisy, so every estimate
//! averages [`ThermistorConfig::samples`] raw readings taken
//! `sample_interval_ms` apart, converts the mean to a resistance for the
//! configured [`DividerTopology`] and applies the simplified Beta
//! (Steinhart-Hart) equation:
//!
//! ```text
//! 1/T = 1/T0 + (1/B) * ln(R/R0)
//! ```
//!
//! The conversion never fails.  Readings pinned near either rail are
//! mapped to fixed clamp resistances instead of dividing by a vanishing
//! denominator, so every input yields a finite temperature.

use embedded_hal::delay::DelayNs;

use crate::config::{DividerTopology, ThermistorConfig};
use crate::drivers::hw_init;

const KELVIN_OFFSET: f32 = 273.15;

/// Returned if a pathological calibration drives `1/T` non-positive.
const DEGENERATE_C: f32 = -40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    /// Mean of the raw samples.
    pub raw_avg: f32,
    pub resistance_ohm: f32,
    pub celsius: f32,
}

/// Estimate the temperature from a batch of raw ADC samples.
pub fn estimate_temperature(samples: &[u16], cfg: &ThermistorConfig) -> f32 {
    estimate(samples, cfg).celsius
}

/// Same as [`estimate_temperature`] but keeps the intermediate values.
pub fn estimate(samples: &[u16], cfg: &ThermistorConfig) -> TemperatureReading {
    let raw_avg = average(samples);
    let resistance_ohm = adc_to_resistance(raw_avg, cfg);
    TemperatureReading {
        raw_avg,
        resistance_ohm,
        celsius: resistance_to_celsius(resistance_ohm, cfg),
    }
}

fn average(samples: &[u16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
    sum as f32 / samples.len() as f32
}

/// Voltage-divider relation for the configured topology, with rail clamps.
pub fn adc_to_resistance(reading: f32, cfg: &ThermistorConfig) -> f32 {
    let levels = f32::from(cfg.adc_resolution);
    let margin = f32::from(cfg.clamp_margin);
    let near_zero = reading <= margin;
    let near_max = reading >= levels - margin;

    match cfg.topology {
        DividerTopology::SensorLow => {
            if near_zero {
                cfg.low_clamp_resistance_ohm
            } else if near_max {
                cfg.high_clamp_resistance_ohm
            } else {
                cfg.reference_resistance_ohm * reading / (levels - reading)
            }
        }
        DividerTopology::SensorHigh => {
            if near_zero {
                cfg.high_clamp_resistance_ohm
            } else if near_max {
                cfg.low_clamp_resistance_ohm
            } else {
                cfg.reference_resistance_ohm * (levels - reading) / reading
            }
        }
    }
}

/// Simplified Beta model, Celsius out.
pub fn resistance_to_celsius(resistance_ohm: f32, cfg: &ThermistorConfig) -> f32 {
    let t0_k = cfg.nominal_temperature_c + KELVIN_OFFSET;
    let inv_t = (1.0 / t0_k) + (resistance_ohm / cfg.nominal_resistance_ohm).ln() / cfg.beta;
    if !(inv_t.is_finite() && inv_t > 0.0) {
        return DEGENERATE_C;
    }
    (1.0 / inv_t) - KELVIN_OFFSET
}

/// Oversampling driver around the ADC channel.
pub struct TemperatureSensor<D> {
    cfg: ThermistorConfig,
    adc_channel: u32,
    delay: D,
}

impl<D: DelayNs> TemperatureSensor<D> {
    pub fn new(adc_channel: u32, cfg: ThermistorConfig, delay: D) -> Self {
        Self {
            cfg,
            adc_channel,
            delay,
        }
    }

    /// Take `samples` readings with the fixed inter-sample delay and
    /// convert their mean.
    pub fn read(&mut self) -> TemperatureReading {
        let count = usize::from(self.cfg.samples.max(1));
        let mut samples: heapless::Vec<u16, { u8::MAX as usize }> = heapless::Vec::new();
        for i in 0..count {
            if i > 0 {
                self.delay.delay_ms(self.cfg.sample_interval_ms);
            }
            // Capacity is u8::MAX and count <= u8::MAX.
            let _ = samples.push(hw_init::adc1_read(self.adc_channel));
        }
        let reading = estimate(&samples, &self.cfg);
        log::trace!(
            "NTC raw={:.0}/{} R={:.1}kOhm T={:.2}C",
            reading.raw_avg,
            self.cfg.adc_max(),
            reading.resistance_ohm / 1000.0,
            reading.celsius
        );
        reading
    }
}
