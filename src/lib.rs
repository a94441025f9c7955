//! HomeNode controller library.
//!
//! Exposes the pure-logic modules for integration testing and the binary.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; on other targets the GPIO and ADC layer is simulated.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod pins;
pub mod transport;

pub mod adapters;
pub mod drivers;
pub mod sensors;
