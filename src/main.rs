//! HausLink — Main Entry Point
//!
//! One binary, two roles, selected by configuration:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  WifiNetwork     RumqttBroker / EspBroker     LogEventSink    │
//! │  (NetworkPort)   (BrokerPort)                 (EventSink)     │
//! │  HouseSensors    LedStrip                     MonotonicClock  │
//! │  (SensorPort)    (RenderPort)                                 │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  ┌───────────────────────────────────────────────────────┐    │
//! │  │        SourceService / SinkService (pure logic)       │    │
//! │  │  Supervisor · Publisher · Subscriber · Liveness       │    │
//! │  └───────────────────────────────────────────────────────┘    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use hauslink::adapters::hardware::{HouseSensors, LedStrip};
use hauslink::adapters::log_sink::LogEventSink;
use hauslink::adapters::net::WifiNetwork;
use hauslink::adapters::time::MonotonicClock;
use hauslink::app::service::{SinkService, SourceService};
use hauslink::bootstrap::{BootstrapGate, BootstrapMode};
use hauslink::config::{NodeConfig, NodeRole};

#[cfg(not(target_os = "espidf"))]
use hauslink::adapters::mqtt::RumqttBroker as Broker;

#[cfg(target_os = "espidf")]
use hauslink::adapters::esp_mqtt::EspBroker as Broker;

/// Boot-input level at startup.
#[cfg(target_os = "espidf")]
fn boot_input_pressed() -> bool {
    // PinDriver::input(peripherals.pins.gpio0) — active low.
    // Threaded in once peripheral wiring lands.
    false
}

#[cfg(not(target_os = "espidf"))]
fn boot_input_pressed() -> bool {
    false
}

fn load_config() -> Result<NodeConfig> {
    // Host runs take a JSON config path as the first argument; without
    // one (and always on device) the deployed defaults apply.
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            Ok(NodeConfig::from_json(&text)?)
        }
        None => Ok(NodeConfig::default()),
    }
}

fn main() -> Result<()> {
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  HausLink v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config()?;
    let clock = MonotonicClock::new();

    // Holding the boot input through the hold window would enter forced
    // credential reconfiguration.
    let mut gate = BootstrapGate::new(config.bootstrap_hold_ms);
    loop {
        match gate.sample(clock.now_ms(), boot_input_pressed()) {
            Some(BootstrapMode::Normal) => break,
            Some(BootstrapMode::Provision) => {
                warn!("provisioning requested; captive portal not wired on this build");
                break;
            }
            None => thread::sleep(Duration::from_millis(50)),
        }
    }

    info!(
        "role={:?} profile={:?} broker={}:{}",
        config.role, config.profile, config.broker_host, config.broker_port
    );

    let net = WifiNetwork::new(&config.wifi_ssid, &config.wifi_password)?;
    let idle = Duration::from_millis(config.idle_delay_ms);

    match config.role {
        NodeRole::Source => {
            let mut service = SourceService::new(
                &config,
                Broker::new(),
                net,
                HouseSensors::new(),
                LogEventSink::new(),
            );
            loop {
                service.tick(clock.now_ms());
                thread::sleep(idle);
            }
        }
        NodeRole::Sink => {
            let mut service = SinkService::new(
                &config,
                Broker::new(),
                net,
                LedStrip::new(),
                LogEventSink::new(),
            );
            loop {
                service.tick(clock.now_ms());
                thread::sleep(idle);
            }
        }
    }
}
