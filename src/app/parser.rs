//! Request-line parser.
//!
//! Requests are minimal HTTP GETs; only the path matters.  The action token
//! is whatever sits between [`REQUEST_MARKER`] and [`VERSION_MARKER`] in
//! the raw fragment:
//!
//! ```text
//! GET /SET_THRESHOLD:30.5 HTTP/1.1\r\nHost: ...\r\n\r\n
//!      └────── token ────┘
//! ```
//!
//! Anything after the version marker (headers, a partial body, modem
//! framing noise before the request line) is tolerated and ignored.

use super::commands::Action;

/// Precedes the action token.
pub const REQUEST_MARKER: &str = "GET /";
/// Follows the action token.
pub const VERSION_MARKER: &str = " HTTP/";
/// Prefix of the one action carrying a payload.
pub const THRESHOLD_PREFIX: &str = "SET_THRESHOLD:";

/// Extract the action token, if both markers are present.
pub fn extract_token(raw: &str) -> Option<&str> {
    let start = raw.find(REQUEST_MARKER)? + REQUEST_MARKER.len();
    let len = raw[start..].find(VERSION_MARKER)?;
    Some(&raw[start..start + len])
}

/// Parse a raw request fragment into an [`Action`].
pub fn parse(raw: &str) -> Action {
    extract_token(raw).map_or(Action::Unknown, parse_token)
}

/// Case-sensitive match of a bare token (no leading slash).
pub fn parse_token(token: &str) -> Action {
    match token {
        "" => Action::Index,
        "LAMP_ON" => Action::LampOn,
        "LAMP_OFF" => Action::LampOff,
        "LAMP_TOGGLE" => Action::LampToggle,
        "PLUG_ON" => Action::PlugOn,
        "PLUG_OFF" => Action::PlugOff,
        "ALARM_ON" => Action::AlarmOn,
        "ALARM_OFF" => Action::AlarmOff,
        "STATUS" => Action::Status,
        _ => match token.strip_prefix(THRESHOLD_PREFIX) {
            Some(value) => Action::SetThreshold(parse_leading_float(value)),
            None => Action::Unknown,
        },
    }
}

/// Parse the longest decimal prefix of `text`; `0.0` if there is none.
///
/// `"30.5"` → 30.5, `"30.5C"` → 30.5, `"abc"` → 0.0.  Zero is outside the
/// threshold range, so garbage is rejected downstream instead of here.
pub fn parse_leading_float(text: &str) -> f32 {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return 0.0;
    }
    text[..end].parse().unwrap_or(0.0)
}
