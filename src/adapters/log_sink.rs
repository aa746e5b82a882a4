//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured link events to the
//! logger (UART / USB-CDC on device, stderr on host).

use log::info;

use crate::app::events::LinkEvent;
use crate::app::ports::EventSink;
use crate::liveness::LivenessState;

/// Adapter that logs every [`LinkEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LinkEvent) {
        match event {
            LinkEvent::Connected => info!("LINK  | connected"),
            LinkEvent::ConnectionLost => info!("LINK  | lost"),
            LinkEvent::CategoryPublished { metric, category } => {
                info!("PUB   | {} -> {}", metric.name(), category);
            }
            LinkEvent::NumericPublished { metric, value } => {
                info!("PUB   | {} = {:.2}", metric.raw_name(), value);
            }
            LinkEvent::HeartbeatSent => info!("PUB   | heartbeat"),
            LinkEvent::LivenessChanged { state } => {
                let word = match state {
                    LivenessState::Online => "online",
                    LivenessState::Offline => "offline",
                };
                info!("LIVE  | source {word}");
            }
            LinkEvent::Rendered { room, category } => {
                info!("RENDER| {room} <- {category}");
            }
            LinkEvent::OfflineRendered => info!("RENDER| offline visual"),
        }
    }
}
