//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART on the device, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as a one-line `TAG | key=value` record.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                threshold_c,
                door_open,
            } => {
                info!(
                    "START | threshold={:.1}\u{00b0}C | door={}",
                    threshold_c,
                    if *door_open { "OPEN" } else { "CLOSED" }
                );
            }
            AppEvent::CommandApplied(action) => {
                info!("CMD | {action}");
            }
            AppEvent::ThresholdRejected(value) => {
                warn!("CMD | threshold {value} rejected, must be within (0, 100)");
            }
            AppEvent::UnknownRequest => {
                info!("CMD | unknown request -> 404");
            }
            AppEvent::AlarmChanged {
                active,
                temperature_c,
            } => {
                if *active {
                    warn!("ALARM | raised | T={temperature_c:.2}\u{00b0}C");
                } else {
                    info!("ALARM | cleared | T={temperature_c:.2}\u{00b0}C");
                }
            }
            AppEvent::DoorChanged { open } => {
                info!("DOOR | {}", if *open { "OPEN" } else { "CLOSED" });
            }
            AppEvent::StatusReport(status) => {
                info!("STATUS | {status}");
            }
        }
    }
}
