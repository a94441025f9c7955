//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dispatcher (domain)
//! ```
//!
//! Driven adapters (sensors, relays, event sinks, clocks) implement these
//! traits.  The [`Dispatcher`](super::dispatcher::Dispatcher) consumes them
//! via generics, so the domain core never touches hardware directly.

use crate::sensors::SensorSnapshot;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Read every sensor and return a unified snapshot.  Never cached.
    fn read_all(&mut self) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command outputs.
pub trait ActuatorPort {
    fn set_lamp(&mut self, on: bool);

    fn set_plug(&mut self, on: bool);

    fn set_buzzer(&mut self, on: bool);

    /// Drive every output to its off level.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Deadlines in the bridge and the periodic
/// status report are measured against it.
pub trait TimePort {
    fn uptime_ms(&self) -> u64;
}

impl<T: TimePort + ?Sized> TimePort for &T {
    fn uptime_ms(&self) -> u64 {
        (**self).uptime_ms()
    }
}
