//! Port traits — the hexagonal boundary between protocol logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Source/Sink service (domain)
//! ```
//!
//! Driven adapters (WiFi, MQTT client, sensors, LED renderer, event sinks)
//! implement these traits.  The services consume them via generics, so the
//! protocol core never touches a radio, a socket, or a GPIO directly — and
//! every state machine is testable with mock adapters.

use crate::error::LinkError;
use crate::metric::{Category, Room};

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain ↔ MQTT session)
// ───────────────────────────────────────────────────────────────

/// Last-will message registered with the broker at handshake time.
/// The broker publishes it on the node's behalf after an unclean
/// disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WillMessage {
    pub topic: String,
    pub payload: String,
    /// Liveness wills are always retained so late joiners see the death.
    pub retain: bool,
}

/// Everything an adapter needs to open one broker session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Registered during CONNECT; `None` for sink nodes.
    pub will: Option<WillMessage>,
}

/// An inbound (topic, payload) pair drained from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Broker session port.
///
/// Subscriptions are made at an assurance level that guarantees retained-
/// message replay to new subscribers (QoS 1 on every adapter).
pub trait BrokerPort {
    /// Open a session.  Bounded: returns once CONNACK arrives or the
    /// attempt is abandoned.  Failure is transient, never fatal.
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), LinkError>;

    /// Whether the session is currently usable.
    fn is_connected(&self) -> bool;

    /// Publish an ASCII payload.
    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), LinkError>;

    /// Subscribe to a topic (QoS 1).
    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError>;

    /// Pop one pending inbound message without blocking.
    fn poll(&mut self) -> Option<InboundMessage>;

    /// Tear the session down cleanly (no last-will fires).
    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain ↔ WiFi station)
// ───────────────────────────────────────────────────────────────

/// Network-join port.  `join` may block, but only up to `timeout_ms` —
/// it polls the station state rather than waiting indefinitely.
pub trait NetworkPort {
    fn is_up(&self) -> bool;

    fn join(&mut self, timeout_ms: u64) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain, source role)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the sensing house.
pub trait SensorPort {
    /// LDR brightness, raw ADC counts (0-4095).  Always available.
    fn read_light_adc(&mut self) -> u16;

    /// Relative humidity (%).  `None` when no sensor is fitted — a
    /// legitimate first-class outcome, not an error.
    fn read_humidity(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Render port (driven adapter: domain → display, sink role)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the display house.  How a category maps to LED
/// colors is the adapter's business; the domain speaks semantics only.
pub trait RenderPort {
    /// Render a room in its category visual.
    fn apply(&mut self, room: Room, category: Category);

    /// Render the deterministic whole-house offline visual.
    fn offline(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The services emit structured [`LinkEvent`](super::events::LinkEvent)s
/// through this port.  Adapters decide where they go (serial log, a test
/// recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LinkEvent);
}
