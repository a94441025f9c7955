//! Inbound commands to the dispatcher.
//!
//! One [`Action`] per request, produced by [`parse`](super::parser::parse)
//! and consumed immediately by the [`Dispatcher`](super::dispatcher::Dispatcher).

use core::fmt;

/// Actions a client can request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    LampOn,
    LampOff,
    LampToggle,
    PlugOn,
    PlugOff,
    /// Force the alarm on regardless of temperature.
    AlarmOn,
    /// Release the forced alarm; temperature still decides.
    AlarmOff,
    /// New alarm threshold in Celsius.  Range-checked on apply, not here.
    SetThreshold(f32),
    /// No mutation; just report status.
    Status,
    /// Bare `/`: serve the help page.
    Index,
    /// Anything unrecognised.
    Unknown,
}

impl Action {
    /// `true` if applying this action may change device state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Status | Self::Index | Self::Unknown)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LampOn => write!(f, "LAMP_ON"),
            Self::LampOff => write!(f, "LAMP_OFF"),
            Self::LampToggle => write!(f, "LAMP_TOGGLE"),
            Self::PlugOn => write!(f, "PLUG_ON"),
            Self::PlugOff => write!(f, "PLUG_OFF"),
            Self::AlarmOn => write!(f, "ALARM_ON"),
            Self::AlarmOff => write!(f, "ALARM_OFF"),
            Self::SetThreshold(v) => write!(f, "SET_THRESHOLD:{v}"),
            Self::Status => write!(f, "STATUS"),
            Self::Index => write!(f, "/"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
