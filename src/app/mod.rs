//! Application core: pure domain logic, zero I/O.
//!
//! Request parsing, device state, alarm evaluation and status rendering.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod parser;
pub mod ports;
pub mod response;
pub mod state;
pub mod status;
