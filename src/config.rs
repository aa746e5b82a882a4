//! Node configuration parameters.
//!
//! All tunable parameters for a HausLink node: role, wire profile, broker
//! session settings, classification thresholds, and protocol timing.
//! Defaults mirror the values the deployed houses run with.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::metric::MetricKind;
use crate::profile::WireProfile;

/// Which half of the protocol this node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Reads sensors and publishes semantic state.
    Source,
    /// Subscribes to semantic state and drives the room display.
    Sink,
}

/// Core node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // --- Identity / role ---
    /// Source (sensor house) or sink (dollhouse display).
    pub role: NodeRole,
    /// Topic + payload encoding scheme shared by both houses.
    pub profile: WireProfile,
    /// MQTT client identifier.
    pub client_id: String,

    // --- Network join ---
    pub wifi_ssid: String,
    pub wifi_password: String,

    // --- Broker session ---
    pub broker_host: String,
    pub broker_port: u16,
    pub username: String,
    pub password: String,

    // --- Topic namespace ---
    /// Leading topic segment shared by every node on the broker.
    pub namespace: String,
    /// Identifies the publishing house within the namespace.
    pub house_id: String,

    // --- Classification thresholds (inclusive: raw >= threshold is "high") ---
    /// ADC value (0-4095) at which the living room counts as bright.
    pub light_bright_threshold: f32,
    /// Relative humidity (%) at which the bathroom counts as wet.
    pub humidity_wet_threshold: f32,

    // --- Protocol timing (milliseconds) ---
    /// Minimum spacing between reconnect attempts.
    pub reconnect_min_interval_ms: u64,
    /// Upper bound on a single network-join attempt.
    pub join_timeout_ms: u64,
    /// Retained "online" refresh period.
    pub heartbeat_interval_ms: u64,
    /// Raw numeric telemetry period.
    pub numeric_interval_ms: u64,
    /// Global minimum spacing between category publishes.
    pub category_min_spacing_ms: u64,
    /// Idle delay between cooperative loop ticks.
    pub idle_delay_ms: u64,
    /// How long the boot button must be held to force reprovisioning.
    pub bootstrap_hold_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: NodeRole::Source,
            profile: WireProfile::Descriptive,
            client_id: "house1-sensors".to_string(),

            wifi_ssid: "hausnetz".to_string(),
            wifi_password: "hauspass".to_string(),

            broker_host: "mqtt.example.com".to_string(),
            broker_port: 1883,
            username: "mqttuser".to_string(),
            password: "mqttpass".to_string(),

            namespace: "h2h".to_string(),
            house_id: "haus1".to_string(),

            light_bright_threshold: 2000.0,
            humidity_wet_threshold: 65.0,

            reconnect_min_interval_ms: 2000,
            join_timeout_ms: 15_000,
            heartbeat_interval_ms: 15_000,
            numeric_interval_ms: 5000,
            category_min_spacing_ms: 1000,
            idle_delay_ms: 20,
            bootstrap_hold_ms: 3000,
        }
    }
}

impl NodeConfig {
    /// Parse a configuration from JSON.  Missing fields fall back to
    /// defaults; a malformed document is a hard config error.
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed config JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check the values that would otherwise wedge the protocol.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.house_id.is_empty() || self.namespace.is_empty() {
            return Err(Error::Config("namespace and house_id must be non-empty"));
        }
        if self.reconnect_min_interval_ms == 0 {
            return Err(Error::Config("reconnect spacing must be non-zero"));
        }
        if self.idle_delay_ms == 0 {
            return Err(Error::Config("idle delay must be non-zero"));
        }
        Ok(())
    }

    /// Classification threshold for a metric (inclusive at the boundary).
    pub fn threshold(&self, metric: MetricKind) -> f32 {
        match metric {
            MetricKind::Light => self.light_bright_threshold,
            MetricKind::Humidity => self.humidity_wet_threshold,
        }
    }
}
