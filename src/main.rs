//! HomeNode controller: main entry point.
//!
//! Hexagonal layout: the dispatcher in the middle, adapters around it and
//! one of two request bridges in front.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   SystemClock   SerialChannel  │
//! │  (Sensor+Actuator) (EventSink)    (TimePort)    (ByteChannel)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           Dispatcher (pure logic)                      │    │
//! │  │  parse · DeviceState · alarm · status                  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SocketBridge (native stack)  |  AtBridge (AT modem over UART) │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use homenode::adapters::hardware::HardwareAdapter;
use homenode::adapters::log_sink::LogEventSink;
use homenode::adapters::time::{StdDelay, SystemClock};
use homenode::adapters::wifi::WifiStation;
use homenode::config::SystemConfig;
use homenode::controller::Controller;
use homenode::drivers::hw_init;
use homenode::transport::RequestBridge;
use homenode::transport::socket::SocketBridge;

fn banner() {
    info!("╔══════════════════════════════════════╗");
    info!("║  HomeNode v{:<26}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
}

// ── Device entry point ────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    banner();

    let config = SystemConfig::default();
    config
        .validate()
        .map_err(homenode::error::Error::from)
        .context("built-in configuration")?;

    hw_init::init_peripherals(&config.pins, config.relays_active_low)
        .context("peripheral init")?;

    let mut wifi = WifiStation::new();
    let address = wifi
        .connect(config.wifi.as_ref())
        .context("WiFi station join")?;
    info!("Station address: {:?}", address);

    let clock = SystemClock::new();
    serve_socket(&config, &format!("0.0.0.0:{}", config.server_port), &clock)
}

// ── Host entry point ──────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod cli {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    #[derive(Parser, Debug)]
    #[command(name = "homenode", version, about = "Smart-home appliance controller")]
    pub struct Cli {
        /// JSON configuration file; absent fields keep their defaults.
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        /// Simulated raw ADC reading for the thermistor channel.
        #[arg(long, global = true)]
        pub sim_adc: Option<u16>,

        /// Start with the simulated door reading open.
        #[arg(long, global = true)]
        pub sim_door_open: bool,

        #[command(subcommand)]
        pub mode: Option<Mode>,
    }

    #[derive(Subcommand, Debug, Clone)]
    pub enum Mode {
        /// Serve HTTP on a native socket (default).
        Socket {
            /// Listen address; defaults to 0.0.0.0:<server_port>.
            #[arg(long)]
            bind: Option<String>,
        },
        /// Drive an AT-command Wi-Fi modem on a serial port.
        Modem {
            /// Serial device, e.g. /dev/ttyUSB0 or COM3.
            #[arg(long)]
            port: String,
            #[arg(long, default_value_t = 115_200)]
            baud: u32,
        },
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use clap::Parser;
    use cli::{Cli, Mode};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    banner();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    hw_init::init_peripherals(&config.pins, config.relays_active_low)
        .context("peripheral init")?;
    if let Some(raw) = cli.sim_adc {
        hw_init::sim_set_adc(raw);
    }
    let door_level = if cli.sim_door_open {
        config.door_open_level.is_high()
    } else {
        !config.door_open_level.is_high()
    };
    hw_init::sim_set_level(config.pins.door_sensor, door_level);

    let clock = SystemClock::new();
    match cli.mode.unwrap_or(Mode::Socket { bind: None }) {
        Mode::Socket { bind } => {
            WifiStation::new()
                .connect(config.wifi.as_ref())
                .context("WiFi credentials")?;
            let bind = bind.unwrap_or_else(|| format!("0.0.0.0:{}", config.server_port));
            serve_socket(&config, &bind, &clock)
        }
        Mode::Modem { port, baud } => serve_modem(&config, &port, baud, &clock),
    }
}

#[cfg(not(target_os = "espidf"))]
fn load_config(path: Option<&std::path::Path>) -> Result<SystemConfig> {
    let config = match path {
        Some(p) if p.exists() => {
            let cfg = SystemConfig::load(p).with_context(|| format!("loading {}", p.display()))?;
            info!("Config loaded from {}", p.display());
            cfg
        }
        Some(p) => {
            warn!("Config file {} not found, using defaults", p.display());
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };
    config
        .validate()
        .map_err(homenode::error::Error::from)
        .context("configuration")?;
    Ok(config)
}

#[cfg(not(target_os = "espidf"))]
fn serve_modem(config: &SystemConfig, port: &str, baud: u32, clock: &SystemClock) -> Result<()> {
    use homenode::adapters::serial::SerialChannel;
    use homenode::adapters::wifi::validate_credentials;
    use homenode::transport::at_bridge::AtBridge;

    if let Some(creds) = &config.wifi {
        validate_credentials(creds).context("WiFi credentials")?;
    }

    let channel =
        SerialChannel::open(port, baud).with_context(|| format!("opening modem port {port}"))?;
    let mut bridge = AtBridge::new(channel, clock, StdDelay, config.bridge.clone());
    let report = bridge
        .setup(config.wifi.as_ref(), config.server_port)
        .map_err(homenode::error::Error::from)
        .context("modem bring-up")?;
    if !report.server_started {
        warn!("Modem did not acknowledge the server command; serving anyway");
    }
    info!(
        "Modem ready: joined={} address={:?} port={}",
        report.joined, report.station_ip, config.server_port
    );
    run(config, bridge, clock)
}

// ── Shared ────────────────────────────────────────────────────

fn serve_socket(config: &SystemConfig, bind: &str, clock: &SystemClock) -> Result<()> {
    let bridge = SocketBridge::bind(bind, config.bridge.socket_read_timeout_ms)
        .map_err(homenode::error::Error::from)
        .with_context(|| format!("binding {bind}"))?;
    info!("Listening on {}", bridge.local_addr()?);
    run(config, bridge, clock)
}

fn run<B: RequestBridge>(config: &SystemConfig, bridge: B, clock: &SystemClock) -> Result<()> {
    let hw = HardwareAdapter::from_config(config, StdDelay);
    let mut controller = Controller::new(config, bridge, hw, LogEventSink::new(), clock);
    controller.run(&mut StdDelay, config.loop_interval_ms)
}
