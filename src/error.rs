//! Unified error types for the HomeNode controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the bridge state machine without allocation.
//!
//! Note what is *not* here: malformed commands, out-of-range thresholds and
//! degenerate sensor readings are resolved locally and never become errors.

use core::fmt;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A network transport (modem channel or socket) failed.
    Transport(TransportError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures of the byte channel or socket underneath a bridge.
///
/// Command *timeouts* are deliberately absent: an unacknowledged modem
/// command is logged and the bridge moves on, so it never surfaces here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Reading from the channel returned an error.
    ChannelRead,
    /// Writing to the channel returned an error or accepted zero bytes.
    ChannelWrite,
    /// The byte after the framing marker was not a connection id digit,
    /// or never arrived.
    MalformedFrame,
    /// The listening socket could not be bound.
    BindFailed,
    /// Accepting or configuring an inbound connection failed.
    AcceptFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelRead => write!(f, "channel read failed"),
            Self::ChannelWrite => write!(f, "channel write failed"),
            Self::MalformedFrame => write!(f, "malformed connection frame"),
            Self::BindFailed => write!(f, "socket bind failed"),
            Self::AcceptFailed => write!(f, "socket accept failed"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Io(_) => Self::Config("file unreadable"),
            ConfigError::Parse(_) => Self::Config("file is not valid JSON"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
