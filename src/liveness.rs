//! The liveness contract between source and sinks.
//!
//! One retained topic carries a two-valued payload.  At broker handshake
//! the source registers a last will on that topic (retained, offline value)
//! so an unclean disconnect makes the broker announce the death on the
//! source's behalf; immediately after handshake the source overwrites any
//! stale retained value with "online".  A periodic heartbeat republishes
//! "online" to keep the retained value fresh for monitoring tooling — the
//! sink does not need it for correctness, retained delivery already covers
//! late joiners.
//!
//! The sink computes no staleness timeout of its own: it trusts the
//! last-will mechanism entirely (documented gap, see DESIGN.md).

use crate::profile::WireProfile;

// ---------------------------------------------------------------------------
// Sink-side liveness state
// ---------------------------------------------------------------------------

/// Whether the source is believed alive.  Driven solely by the retained
/// status topic, and authoritative over every per-metric message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivenessState {
    /// No proof of life yet, or an explicit/willed offline message.
    #[default]
    Offline,
    /// The retained status topic carries the online value.
    Online,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The retained-status/last-will agreement for one house.
#[derive(Debug, Clone)]
pub struct LivenessContract {
    topic: String,
    profile: WireProfile,
}

impl LivenessContract {
    pub fn new(topic: impl Into<String>, profile: WireProfile) -> Self {
        Self {
            topic: topic.into(),
            profile,
        }
    }

    /// The retained status topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Payload announcing the source alive.
    pub fn online_payload(&self) -> &'static str {
        self.profile.online_payload()
    }

    /// Payload announcing the source gone; identical for explicit
    /// disconnects and the broker-published last will.
    pub fn offline_payload(&self) -> &'static str {
        self.profile.offline_payload()
    }

    /// Interpret a status payload.  Anything that is not exactly the online
    /// value counts as offline — the conservative reading for a two-valued
    /// contract.
    pub fn classify(&self, payload: &str) -> LivenessState {
        if payload == self.online_payload() {
            LivenessState::Online
        } else {
            LivenessState::Offline
        }
    }
}

// ---------------------------------------------------------------------------
// Heartbeat timer
// ---------------------------------------------------------------------------

/// Fixed-period republish timer for the retained online value.
///
/// Plain wall-clock comparison against an injected `now_ms`, checked every
/// scheduler tick; never blocks.
#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    interval_ms: u64,
    last_sent_ms: Option<u64>,
}

impl Heartbeat {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_sent_ms: None,
        }
    }

    /// True when a republish is due.  The first call after [`Self::reset`]
    /// is never due — the handshake itself already published "online".
    pub fn due(&self, now_ms: u64) -> bool {
        match self.last_sent_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
            None => false,
        }
    }

    /// Record a publish at `now_ms`.
    pub fn mark_sent(&mut self, now_ms: u64) {
        self.last_sent_ms = Some(now_ms);
    }

    /// Restart the period, anchored at the (re)connect instant.
    pub fn reset(&mut self, now_ms: u64) {
        self.last_sent_ms = Some(now_ms);
    }
}
