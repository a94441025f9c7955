//! GPIO / peripheral pin assignments for the reference board (ESP32 DevKit,
//! ESP-WROOM-32).
//!
//! These are the defaults for [`PinMap`](crate::config::PinMap); a JSON
//! config can remap every one of them for other wiring.

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Lamp relay coil driver.  Relay module is active LOW.
pub const LAMP_RELAY_GPIO: i32 = 26;
/// Smart-plug relay coil driver.  Relay module is active LOW.
pub const PLUG_RELAY_GPIO: i32 = 27;
/// Piezo buzzer, active HIGH.
pub const BUZZER_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Reed switch on the door, input with internal pull-up.
pub const DOOR_SENSOR_GPIO: i32 = 14;

/// NTC thermistor divider output.  GPIO34 is ADC1 channel 6; ADC2 cannot
/// be used while Wi-Fi is active.
pub const NTC_ADC_GPIO: i32 = 34;
/// ADC1 channel number matching [`NTC_ADC_GPIO`].
pub const NTC_ADC1_CHANNEL: u32 = 6;
