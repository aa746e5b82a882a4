//! Sink-side state reduction: inbound messages in, render decisions out.
//!
//! ```text
//!   InboundMessage ──▶ truncate / route / parse ──▶ Option<RenderAction>
//! ```
//!
//! The reducer is pure state: it never touches the broker or the display.
//! Offline dominance is enforced here — while the retained status topic
//! says the source is gone, per-metric messages are discarded outright, so
//! a stale category can never repaint a room behind the offline visual.
//! The per-room render cache suppresses repeated identical categories and
//! is cleared on the offline transition, which is what forces a repaint
//! from the retained replay after the source recovers.

use log::{debug, info};

use crate::app::ports::InboundMessage;
use crate::config::NodeConfig;
use crate::liveness::{LivenessContract, LivenessState};
use crate::metric::{Category, MetricKind, Room};
use crate::profile::{decode_numeric, Route, TopicScheme};

/// Longest payload the sink ever looks at; the rest is dropped.  The wire
/// vocabulary fits in a fraction of this.
const MAX_PAYLOAD: usize = 64;

/// What the service should do to the display, if anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderAction {
    /// Repaint one room in its category visual.
    Room { room: Room, category: Category },
    /// Apply the whole-house offline visual.
    Offline,
}

pub struct StateSubscriber {
    scheme: TopicScheme,
    contract: LivenessContract,
    thresholds: [f32; MetricKind::ALL.len()],
    liveness: LivenessState,
    rendered: [Option<Category>; MetricKind::ALL.len()],
}

impl StateSubscriber {
    pub fn new(config: &NodeConfig) -> Self {
        let scheme = TopicScheme::new(config.profile, &config.namespace, &config.house_id);
        let contract = LivenessContract::new(scheme.status_topic(), config.profile);
        let mut thresholds = [0.0; MetricKind::ALL.len()];
        for metric in MetricKind::ALL {
            thresholds[metric.index()] = config.threshold(metric);
        }
        Self {
            scheme,
            contract,
            thresholds,
            liveness: LivenessState::Offline,
            rendered: [None; MetricKind::ALL.len()],
        }
    }

    /// Topics to subscribe to after every fresh handshake.
    pub fn subscriptions(&self) -> Vec<&str> {
        self.scheme.sink_subscriptions()
    }

    /// The sink's current belief about the source.
    pub fn liveness(&self) -> LivenessState {
        self.liveness
    }

    /// Forget everything for a fresh session.  The caller pairs this with
    /// the offline visual; the retained replay then rebuilds the state.
    pub fn reset(&mut self) {
        self.liveness = LivenessState::Offline;
        self.rendered = [None; MetricKind::ALL.len()];
    }

    /// Reduce one inbound message.  Unknown topics, unknown words, and
    /// malformed numbers are ignored without touching any state.
    pub fn handle(&mut self, message: &InboundMessage) -> Option<RenderAction> {
        let buffer = truncated_text(&message.payload)?;
        let payload = buffer.as_str();

        match self.scheme.route(&message.topic)? {
            Route::Liveness => self.reduce_liveness(payload),
            Route::Category(metric) => {
                let category = Category::from_word(metric, payload)?;
                self.reduce_category(metric, category)
            }
            Route::Numeric(metric) => {
                let raw = decode_numeric(payload)?;
                let category = metric.classify(raw, self.thresholds[metric.index()]);
                self.reduce_category(metric, category)
            }
        }
    }

    fn reduce_liveness(&mut self, payload: &str) -> Option<RenderAction> {
        let state = self.contract.classify(payload);
        if state == self.liveness {
            // Heartbeats land here; nothing to do.
            return None;
        }
        self.liveness = state;
        match state {
            LivenessState::Offline => {
                info!("sub: source went offline");
                // Clearing the cache makes the retained replay repaint
                // every room once the source is back.
                self.rendered = [None; MetricKind::ALL.len()];
                Some(RenderAction::Offline)
            }
            LivenessState::Online => {
                info!("sub: source is online");
                None
            }
        }
    }

    fn reduce_category(&mut self, metric: MetricKind, category: Category) -> Option<RenderAction> {
        if self.liveness == LivenessState::Offline {
            debug!("sub: dropping {} while source offline", metric.name());
            return None;
        }
        if self.rendered[metric.index()] == Some(category) {
            return None;
        }
        self.rendered[metric.index()] = Some(category);
        Some(RenderAction::Room {
            room: metric.room(),
            category,
        })
    }
}

/// Copy at most [`MAX_PAYLOAD`] bytes into a bounded buffer and require
/// valid UTF-8; anything else is discarded.
fn truncated_text(payload: &[u8]) -> Option<heapless::String<MAX_PAYLOAD>> {
    let end = payload.len().min(MAX_PAYLOAD);
    let bytes = heapless::Vec::<u8, MAX_PAYLOAD>::from_slice(&payload[..end]).ok()?;
    heapless::String::from_utf8(bytes).ok()
}
