//! WiFi station-mode adapter for the native socket bridge.
//!
//! The AT bridge joins the network through the modem (`AT+CWJAP`); when
//! the controller has its own radio this adapter does the equivalent
//! before the listener is bound.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: the host network is already up; only the
//!   credentials are checked.

use core::fmt;
use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::config::WifiCredentials;

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

/// Reject credentials neither the radio nor the modem would accept.
/// The AT join command quotes both fields, so `"` is refused as well.
pub fn validate_credentials(creds: &WifiCredentials) -> Result<(), ConnectivityError> {
    validate_ssid(&creds.ssid)?;
    validate_password(&creds.password)?;
    if creds.ssid.contains('"') {
        return Err(ConnectivityError::InvalidSsid);
    }
    if creds.password.contains('"') {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Station
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

pub struct WifiStation {
    state: WifiState,
    address: Option<Ipv4Addr>,
    /// Keeps the driver (and the association) alive.
    #[cfg(target_os = "espidf")]
    driver: Option<
        esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    >,
}

impl Default for WifiStation {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiStation {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            address: None,
            #[cfg(target_os = "espidf")]
            driver: None,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    /// Join the configured network.  Blocks until the interface is up.
    pub fn connect(
        &mut self,
        creds: Option<&WifiCredentials>,
    ) -> Result<Option<Ipv4Addr>, ConnectivityError> {
        let Some(creds) = creds else {
            return self.platform_without_credentials();
        };
        validate_credentials(creds)?;

        info!("WiFi: connecting to '{}'", creds.ssid);
        self.state = WifiState::Connecting;
        match self.platform_connect(creds) {
            Ok(address) => {
                self.state = WifiState::Connected;
                self.address = address;
                info!("WiFi: connected (address={:?})", address);
                Ok(address)
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Failed;
                Err(e)
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_without_credentials(&mut self) -> Result<Option<Ipv4Addr>, ConnectivityError> {
        Err(ConnectivityError::NoCredentials)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_without_credentials(&mut self) -> Result<Option<Ipv4Addr>, ConnectivityError> {
        warn!("WiFi(host): no credentials, using the host network as-is");
        self.state = WifiState::Connected;
        Ok(None)
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(
        &mut self,
        creds: &WifiCredentials,
    ) -> Result<Option<Ipv4Addr>, ConnectivityError> {
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::hal::peripherals::Peripherals;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;
        use esp_idf_svc::wifi::{
            AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi,
        };

        let fail = |e: esp_idf_svc::sys::EspError| {
            warn!("WiFi(espidf): {e}");
            ConnectivityError::ConnectionFailed
        };

        let peripherals = Peripherals::take().map_err(fail)?;
        let sysloop = EspSystemEventLoop::take().map_err(fail)?;
        let nvs = EspDefaultNvsPartition::take().map_err(fail)?;

        let mut wifi = BlockingWifi::wrap(
            EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs)).map_err(fail)?,
            sysloop,
        )
        .map_err(fail)?;

        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        }))
        .map_err(fail)?;

        wifi.start().map_err(fail)?;
        wifi.connect().map_err(fail)?;
        wifi.wait_netif_up().map_err(fail)?;

        let ip = wifi.wifi().sta_netif().get_ip_info().map_err(fail)?.ip;
        self.driver = Some(wifi);
        Ok(Some(ip))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(
        &mut self,
        creds: &WifiCredentials,
    ) -> Result<Option<Ipv4Addr>, ConnectivityError> {
        info!("WiFi(host): '{}' accepted, host network already up", creds.ssid);
        Ok(None)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
