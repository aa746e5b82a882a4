//! Monitored metrics and their semantic categories.
//!
//! Each metric belongs to exactly one room and classifies its raw value
//! into a two-word category.  The threshold comparison is inclusive at the
//! boundary: a raw value exactly equal to the threshold is the "high"
//! category (bright / wet).

use core::fmt;

// ---------------------------------------------------------------------------
// Metric identity
// ---------------------------------------------------------------------------

/// Enumeration of every monitored metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// LDR brightness in the living room (raw ADC 0-4095).
    Light,
    /// Relative humidity in the bathroom (%). May be unavailable when no
    /// sensor is fitted.
    Humidity,
}

impl MetricKind {
    /// Every metric, in a fixed order (used to size per-metric state).
    pub const ALL: [Self; 2] = [Self::Light, Self::Humidity];

    /// Metric name used in descriptive topic paths.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Humidity => "humidity",
        }
    }

    /// Raw-telemetry name used on the numeric channel.
    pub const fn raw_name(self) -> &'static str {
        match self {
            Self::Light => "light_adc",
            Self::Humidity => "humid",
        }
    }

    /// The room this metric is sensed in and rendered to.
    pub const fn room(self) -> Room {
        match self {
            Self::Light => Room::Stube,
            Self::Humidity => Room::Wc,
        }
    }

    /// Position in [`Self::ALL`] — index for per-metric state arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Light => 0,
            Self::Humidity => 1,
        }
    }

    /// Classify a raw value.  Inclusive at the boundary: `raw >= threshold`
    /// yields the high category.
    pub fn classify(self, raw: f32, threshold: f32) -> Category {
        let high = raw >= threshold;
        match self {
            Self::Light => {
                if high {
                    Category::Bright
                } else {
                    Category::Dark
                }
            }
            Self::Humidity => {
                if high {
                    Category::Wet
                } else {
                    Category::Dry
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Rooms of the miniature house, one per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// Living room ("stube") — lit by the light metric.
    Stube,
    /// Bathroom ("wc") — lit by the humidity metric.
    Wc,
}

impl Room {
    /// Topic path segment for this room.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stube => "stube",
            Self::Wc => "wc",
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Semantic category of a classified reading.  The wire vocabulary is
/// metric-specific: light is bright/dark, humidity is wet/dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Bright,
    Dark,
    Wet,
    Dry,
}

impl Category {
    /// Wire word for the descriptive profile.
    pub const fn word(self) -> &'static str {
        match self {
            Self::Bright => "bright",
            Self::Dark => "dark",
            Self::Wet => "wet",
            Self::Dry => "dry",
        }
    }

    /// Parse a wire word against a metric's fixed vocabulary.
    /// Unknown words yield `None` and the message is ignored upstream.
    pub fn from_word(metric: MetricKind, word: &str) -> Option<Self> {
        match (metric, word) {
            (MetricKind::Light, "bright") => Some(Self::Bright),
            (MetricKind::Light, "dark") => Some(Self::Dark),
            (MetricKind::Humidity, "wet") => Some(Self::Wet),
            (MetricKind::Humidity, "dry") => Some(Self::Dry),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

// ---------------------------------------------------------------------------
// Semantic reading
// ---------------------------------------------------------------------------

/// One metric's outcome for a single poll cycle.  Never persisted beyond
/// the cycle; the publisher keeps only "last published" comparison state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticReading {
    pub metric: MetricKind,
    /// Raw value, or `None` when the sensor reported unavailable.
    /// Absence is a first-class outcome, never coerced to a default.
    pub raw: Option<f32>,
    /// Derived category; `None` exactly when `raw` is `None`.
    pub category: Option<Category>,
}

impl SemanticReading {
    /// Build a reading from an optional raw value and a threshold.
    pub fn from_raw(metric: MetricKind, raw: Option<f32>, threshold: f32) -> Self {
        Self {
            metric,
            raw,
            category: raw.map(|value| metric.classify(value, threshold)),
        }
    }
}
