//! Time adapters.
//!
//! - [`SystemClock`] implements [`TimePort`] (monotonic milliseconds).
//! - [`StdDelay`] implements the `embedded-hal` [`DelayNs`] trait by
//!   sleeping the current thread.
//!
//! - **`target_os = "espidf"`**: the clock wraps `esp_timer_get_time()`
//!   from the ESP-IDF high-resolution timer.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.
//!
//! On both targets `thread::sleep` yields to the scheduler (FreeRTOS
//! `vTaskDelay` underneath on the device).

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

use crate::app::ports::TimePort;

/// Monotonic clock since construction (host) or boot (device).
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl TimePort for SystemClock {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Blocking delay backed by `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
