//! Outbound application events.
//!
//! The source and sink services emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them — log to serial, feed a test recorder, etc.

use crate::liveness::LivenessState;
use crate::metric::{Category, MetricKind, Room};

/// Structured events emitted by the protocol core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkEvent {
    /// A broker session was (re)established and on-connect duties ran.
    Connected,

    /// The transport reported the session gone.
    ConnectionLost,

    /// A per-metric category was published (change or first-since-connect).
    CategoryPublished {
        metric: MetricKind,
        category: Category,
    },

    /// A raw numeric sample was published on the telemetry channel.
    NumericPublished { metric: MetricKind, value: f32 },

    /// The retained online value was refreshed with no state change.
    HeartbeatSent,

    /// The sink's view of source liveness changed.
    LivenessChanged { state: LivenessState },

    /// A room's visual was updated.
    Rendered { room: Room, category: Category },

    /// The whole-house offline visual was applied.
    OfflineRendered,
}
