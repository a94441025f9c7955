//! System configuration parameters
//!
//! All tunable parameters for the HomeNode controller.  Everything has a
//! default matching the reference board; a JSON file can override any
//! subset of fields (`#[serde(default)]` on every struct).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pins;

/// Factory alarm threshold (Celsius).
pub const DEFAULT_ALARM_THRESHOLD_C: f32 = 27.0;
/// Lower exclusive bound for the alarm threshold (Celsius).
pub const THRESHOLD_MIN_C: f32 = 0.0;
/// Upper exclusive bound for the alarm threshold (Celsius).
pub const THRESHOLD_MAX_C: f32 = 100.0;

/// `true` if `value` lies strictly inside `(THRESHOLD_MIN_C, THRESHOLD_MAX_C)`.
/// NaN is never in range.
pub fn threshold_in_range(value: f32) -> bool {
    value > THRESHOLD_MIN_C && value < THRESHOLD_MAX_C
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Alarm ---
    /// Alarm threshold at start-up (Celsius).  Runtime changes are not persisted.
    pub default_alarm_threshold_c: f32,

    // --- Wiring / calibration ---
    pub thermistor: ThermistorConfig,
    /// Electrical level of the door input that means "open".  Differs
    /// between board builds (pull-up reed switch vs. inverted wiring).
    pub door_open_level: Level,
    /// Relay modules energise on a LOW input.
    pub relays_active_low: bool,
    pub pins: PinMap,

    // --- Network ---
    /// TCP port the HTTP responder listens on (socket bind or CIPSERVER).
    pub server_port: u16,
    /// Station credentials handed to the modem during bring-up.
    pub wifi: Option<WifiCredentials>,
    pub bridge: BridgeConfig,

    // --- Timing ---
    /// Main loop pause between iterations (milliseconds).
    pub loop_interval_ms: u32,
    /// Periodic status report interval (milliseconds).
    pub status_report_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            default_alarm_threshold_c: DEFAULT_ALARM_THRESHOLD_C,

            thermistor: ThermistorConfig::default(),
            door_open_level: Level::High,
            relays_active_low: true,
            pins: PinMap::default(),

            server_port: 80,
            wifi: None,
            bridge: BridgeConfig::default(),

            loop_interval_ms: 10,
            status_report_interval_ms: 5_000,
        }
    }
}

impl SystemConfig {
    /// Load a config file, falling back to defaults for absent fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the controller misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !threshold_in_range(self.default_alarm_threshold_c) {
            return Err(ConfigError::ValidationFailed(
                "default_alarm_threshold_c must be within (0, 100)",
            ));
        }
        self.thermistor.validate()?;
        self.bridge.validate()?;
        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms must be > 0"));
        }
        if self.status_report_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "status_report_interval_ms must be > 0",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Thermistor
// ---------------------------------------------------------------------------

/// Where the NTC sits in the voltage divider feeding the ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerTopology {
    /// `Vcc - Rref - ADC - NTC - GND`: reading rises with NTC resistance.
    SensorLow,
    /// `Vcc - NTC - ADC - Rref - GND`: reading falls with NTC resistance.
    SensorHigh,
}

/// NTC calibration and sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermistorConfig {
    /// NTC resistance at the nominal temperature (ohms).
    pub nominal_resistance_ohm: f32,
    /// Nominal temperature (Celsius), usually 25.
    pub nominal_temperature_c: f32,
    /// Beta coefficient (K).
    pub beta: f32,
    /// Fixed divider resistor (ohms).
    pub reference_resistance_ohm: f32,
    /// Number of ADC levels (4096 for 12-bit, 1024 for 10-bit).
    pub adc_resolution: u16,
    pub topology: DividerTopology,
    /// Raw samples averaged per estimate.
    pub samples: u8,
    /// Pause between raw samples (milliseconds).
    pub sample_interval_ms: u32,
    /// Readings within this many counts of either rail are clamped.
    pub clamp_margin: u16,
    /// Resistance substituted for a reading that implies a near-short (ohms).
    pub low_clamp_resistance_ohm: f32,
    /// Resistance substituted for a reading that implies an open circuit (ohms).
    pub high_clamp_resistance_ohm: f32,
}

impl Default for ThermistorConfig {
    fn default() -> Self {
        Self {
            // 100k NTC, B=3950, against a 100k fixed resistor
            nominal_resistance_ohm: 100_000.0,
            nominal_temperature_c: 25.0,
            beta: 3950.0,
            reference_resistance_ohm: 100_000.0,
            adc_resolution: 4096,
            topology: DividerTopology::SensorLow,
            samples: 20,
            sample_interval_ms: 2,
            clamp_margin: 10,
            low_clamp_resistance_ohm: 100.0,
            high_clamp_resistance_ohm: 10_000_000.0,
        }
    }
}

impl ThermistorConfig {
    /// Highest raw value the converter can produce.
    pub fn adc_max(&self) -> u16 {
        self.adc_resolution.saturating_sub(1)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.adc_resolution < 2 {
            return Err(ConfigError::ValidationFailed("adc_resolution must be >= 2"));
        }
        if self.samples == 0 {
            return Err(ConfigError::ValidationFailed("thermistor.samples must be > 0"));
        }
        let positive = [
            self.nominal_resistance_ohm,
            self.beta,
            self.reference_resistance_ohm,
            self.low_clamp_resistance_ohm,
            self.high_clamp_resistance_ohm,
        ];
        if positive.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::ValidationFailed(
                "thermistor resistances and beta must be positive",
            ));
        }
        if u32::from(self.clamp_margin) * 2 >= u32::from(self.adc_resolution) {
            return Err(ConfigError::ValidationFailed(
                "clamp_margin leaves no usable ADC range",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transport bridge timing
// ---------------------------------------------------------------------------

/// Deadlines for every modem command issued by the AT bridge (milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Pause after the framing marker so the rest of the request arrives.
    pub frame_settle_ms: u32,
    /// Wait for the `>` prompt after `AT+CIPSEND`.
    pub send_length_timeout_ms: u32,
    /// Wait for `SEND OK` after the response bytes.
    pub send_data_timeout_ms: u32,
    /// Wait for the acknowledgement of `AT+CIPCLOSE`.
    pub close_timeout_ms: u32,
    /// Generic bring-up commands (`AT`, `AT+CWMODE`).
    pub setup_timeout_ms: u32,
    /// Access-point join (`AT+CWJAP`).
    pub join_timeout_ms: u32,
    /// Address query (`AT+CIFSR`).
    pub address_timeout_ms: u32,
    /// Server commands (`AT+CIPMUX`, `AT+CIPSERVER`).
    pub server_timeout_ms: u32,
    /// Granularity of the deadline wait loop.
    pub poll_step_ms: u32,
    /// Socket read timeout for the native bridge.
    pub socket_read_timeout_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            frame_settle_ms: 50,
            send_length_timeout_ms: 500,
            send_data_timeout_ms: 100,
            close_timeout_ms: 1_000,
            setup_timeout_ms: 2_000,
            join_timeout_ms: 10_000,
            address_timeout_ms: 3_000,
            server_timeout_ms: 1_000,
            poll_step_ms: 2,
            socket_read_timeout_ms: 500,
        }
    }
}

impl BridgeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            self.send_length_timeout_ms,
            self.send_data_timeout_ms,
            self.close_timeout_ms,
            self.setup_timeout_ms,
            self.join_timeout_ms,
            self.address_timeout_ms,
            self.server_timeout_ms,
            self.poll_step_ms,
            self.socket_read_timeout_ms,
        ];
        if timeouts.contains(&0) {
            return Err(ConfigError::ValidationFailed("bridge timeouts must be > 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Electrical level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

/// GPIO assignment; defaults come from [`crate::pins`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub lamp_relay: i32,
    pub plug_relay: i32,
    pub buzzer: i32,
    pub door_sensor: i32,
    pub ntc_adc_channel: u32,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            lamp_relay: pins::LAMP_RELAY_GPIO,
            plug_relay: pins::PLUG_RELAY_GPIO,
            buzzer: pins::BUZZER_GPIO,
            door_sensor: pins::DOOR_SENSOR_GPIO,
            ntc_adc_channel: pins::NTC_ADC1_CHANNEL,
        }
    }
}

/// Access-point credentials for the modem's station interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating a [`SystemConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(String),
    /// The config file is not valid JSON for this schema.
    Parse(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "config I/O error: {}", msg),
            Self::Parse(msg) => write!(f, "config parse error: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
