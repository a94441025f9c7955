//! HTTP/1.1 responses handed back to the transport.
//!
//! Every response closes the connection and carries the CORS headers so a
//! browser dashboard served from anywhere can poll the device.

use core::fmt::Write as _;

pub const CORS_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin: *";
pub const CORS_ALLOW_METHODS: &str = "Access-Control-Allow-Methods: GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Access-Control-Allow-Headers: Content-Type";

const INDEX_HTML: &str = "<!DOCTYPE html><html><head><title>HomeNode</title></head><body>\
<h1>HomeNode controller</h1><ul>\
<li><a href=\"/LAMP_ON\">/LAMP_ON</a> <a href=\"/LAMP_OFF\">/LAMP_OFF</a> \
<a href=\"/LAMP_TOGGLE\">/LAMP_TOGGLE</a></li>\
<li><a href=\"/PLUG_ON\">/PLUG_ON</a> <a href=\"/PLUG_OFF\">/PLUG_OFF</a></li>\
<li><a href=\"/ALARM_ON\">/ALARM_ON</a> <a href=\"/ALARM_OFF\">/ALARM_OFF</a></li>\
<li>/SET_THRESHOLD:&lt;celsius&gt; (0 &lt; t &lt; 100)</li>\
<li><a href=\"/STATUS\">/STATUS</a></li>\
</ul></body></html>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    NotFound,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "Not Found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn ok_text(body: String) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: "text/plain",
            body,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NotFound,
            content_type: "text/plain",
            body: StatusCode::NotFound.reason().to_string(),
        }
    }

    pub fn index() -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: "text/html",
            body: INDEX_HTML.to_string(),
        }
    }

    /// Full wire form: status line, headers, blank line, body.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "HTTP/1.1 {} {}\r\n\
             {CORS_ALLOW_ORIGIN}\r\n\
             {CORS_ALLOW_METHODS}\r\n\
             {CORS_ALLOW_HEADERS}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            self.status.code(),
            self.status.reason(),
            self.content_type,
            self.body.len(),
            self.body,
        );
        out
    }
}
