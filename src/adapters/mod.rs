//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to              |
//! |------------|--------------------|--------------------------|
//! | `hardware` | SensorPort         | ADC, door GPIO           |
//! |            | ActuatorPort       | relay and buzzer GPIO    |
//! | `log_sink` | EventSink          | Serial / stderr log      |
//! | `serial`   | ByteChannel        | AT modem on a host UART  |
//! | `time`     | TimePort, DelayNs  | System timer             |
//! | `wifi`     | -                  | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod log_sink;
#[cfg(not(target_os = "espidf"))]
pub mod serial;
pub mod time;
pub mod wifi;
