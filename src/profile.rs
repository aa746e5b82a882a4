//! Wire profiles: topic templates plus payload encoding.
//!
//! Both houses historically ran two near-identical protocol variants.  They
//! differ only in topic layout and payload vocabulary, so they are modelled
//! as a single scheme parameterized by [`WireProfile`], selected once at
//! startup from configuration:
//!
//! | | Descriptive (A) | Numeric (B) |
//! |---|---|---|
//! | liveness | `<ns>/<house>/status` = "online"/"offline" | `<ns>/<house>/sys/status` = "1"/"0" |
//! | category | `<ns>/<house>/<room>/<metric>/state` (retained) | — (sink classifies) |
//! | numeric  | `<ns>/<house>/<room>/<metric>/<raw>` | `<ns>/<house>/<room>/<raw>` |
//!
//! Numeric payloads are ASCII decimal with two fractional digits on both
//! profiles.  Numeric telemetry is never retained.

use serde::{Deserialize, Serialize};

use crate::metric::MetricKind;

// ---------------------------------------------------------------------------
// Profile selection
// ---------------------------------------------------------------------------

/// The two coexisting wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireProfile {
    /// Human-readable category words on descriptive topic paths.
    Descriptive,
    /// Numeric-only payloads on a flatter topic layout; classification is
    /// deferred to the sink.
    Numeric,
}

impl WireProfile {
    /// Retained liveness payload meaning "source alive".
    pub const fn online_payload(self) -> &'static str {
        match self {
            Self::Descriptive => "online",
            Self::Numeric => "1",
        }
    }

    /// Retained liveness payload meaning "source gone" — also the last-will
    /// payload registered at handshake time.
    pub const fn offline_payload(self) -> &'static str {
        match self {
            Self::Descriptive => "offline",
            Self::Numeric => "0",
        }
    }
}

// ---------------------------------------------------------------------------
// Numeric payload codec
// ---------------------------------------------------------------------------

/// Encode a raw value for the numeric channel (ASCII decimal, 2 fractional
/// digits, matching the historical `dtostrf(value, 0, 2)` format).
pub fn encode_numeric(value: f32) -> String {
    format!("{value:.2}")
}

/// Parse a numeric payload.  Malformed text (empty, non-numeric, non-finite)
/// yields `None`; it must never silently become `0`.
pub fn decode_numeric(text: &str) -> Option<f32> {
    let value: f32 = text.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

// ---------------------------------------------------------------------------
// Topic scheme
// ---------------------------------------------------------------------------

/// Where an inbound topic routes on the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The retained liveness topic.
    Liveness,
    /// A per-metric category word (descriptive profile only).
    Category(MetricKind),
    /// A per-metric raw numeric value.
    Numeric(MetricKind),
}

/// Precomputed topic strings for one `(profile, namespace, house)` triple.
#[derive(Debug, Clone)]
pub struct TopicScheme {
    profile: WireProfile,
    status: String,
    category: [Option<String>; MetricKind::ALL.len()],
    numeric: [String; MetricKind::ALL.len()],
}

impl TopicScheme {
    pub fn new(profile: WireProfile, namespace: &str, house_id: &str) -> Self {
        let status = match profile {
            WireProfile::Descriptive => format!("{namespace}/{house_id}/status"),
            WireProfile::Numeric => format!("{namespace}/{house_id}/sys/status"),
        };

        let mut category: [Option<String>; MetricKind::ALL.len()] = [None, None];
        let mut numeric: [String; MetricKind::ALL.len()] = [String::new(), String::new()];

        for metric in MetricKind::ALL {
            let room = metric.room().as_str();
            match profile {
                WireProfile::Descriptive => {
                    category[metric.index()] = Some(format!(
                        "{namespace}/{house_id}/{room}/{}/state",
                        metric.name()
                    ));
                    numeric[metric.index()] = format!(
                        "{namespace}/{house_id}/{room}/{}/{}",
                        metric.name(),
                        metric.raw_name()
                    );
                }
                WireProfile::Numeric => {
                    numeric[metric.index()] =
                        format!("{namespace}/{house_id}/{room}/{}", metric.raw_name());
                }
            }
        }

        Self {
            profile,
            status,
            category,
            numeric,
        }
    }

    pub fn profile(&self) -> WireProfile {
        self.profile
    }

    /// The retained liveness topic.
    pub fn status_topic(&self) -> &str {
        &self.status
    }

    /// Category topic for a metric; `None` on the numeric profile.
    pub fn category_topic(&self, metric: MetricKind) -> Option<&str> {
        self.category[metric.index()].as_deref()
    }

    /// Raw-telemetry topic for a metric.
    pub fn numeric_topic(&self, metric: MetricKind) -> &str {
        &self.numeric[metric.index()]
    }

    /// Topics a sink subscribes to once per handshake: the liveness topic
    /// plus one topic per metric.  On the descriptive profile the sink
    /// follows the category channel; on the numeric profile it follows the
    /// raw channel and classifies locally.
    pub fn sink_subscriptions(&self) -> Vec<&str> {
        let mut topics = vec![self.status.as_str()];
        for metric in MetricKind::ALL {
            match self.profile {
                WireProfile::Descriptive => {
                    if let Some(topic) = self.category_topic(metric) {
                        topics.push(topic);
                    }
                }
                WireProfile::Numeric => topics.push(self.numeric_topic(metric)),
            }
        }
        topics
    }

    /// Route an inbound topic.  Unknown topics yield `None` and are
    /// discarded by the subscriber.
    pub fn route(&self, topic: &str) -> Option<Route> {
        if topic == self.status {
            return Some(Route::Liveness);
        }
        for metric in MetricKind::ALL {
            if self.category[metric.index()].as_deref() == Some(topic) {
                return Some(Route::Category(metric));
            }
            if self.numeric[metric.index()] == topic {
                return Some(Route::Numeric(metric));
            }
        }
        None
    }
}
