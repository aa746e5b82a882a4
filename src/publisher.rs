//! Source-side publishing: category debounce, numeric telemetry cadence,
//! and the retained-online heartbeat.
//!
//! The publisher owns only "last published" comparison state — a category
//! per metric plus two timers.  Raw readings live for one cycle and are
//! never stored here.  A category goes out when it differs from the last
//! *successfully* published one (or nothing was published since connect),
//! subject to a single global minimum spacing shared by all metrics.  A
//! deferred change is not lost: the comparison state only advances on a
//! successful publish, so the change re-qualifies next tick.

use log::{debug, info, warn};

use crate::app::events::LinkEvent;
use crate::app::ports::{BrokerPort, EventSink};
use crate::config::NodeConfig;
use crate::liveness::{Heartbeat, LivenessContract};
use crate::metric::{Category, MetricKind, SemanticReading};
use crate::profile::{encode_numeric, TopicScheme};

pub struct StatePublisher {
    /// Last category that actually made it to the broker, per metric.
    last_category: [Option<Category>; MetricKind::ALL.len()],
    last_category_publish_ms: Option<u64>,
    category_min_spacing_ms: u64,
    numeric_interval_ms: u64,
    last_numeric_ms: Option<u64>,
    heartbeat: Heartbeat,
}

impl StatePublisher {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            last_category: [None; MetricKind::ALL.len()],
            last_category_publish_ms: None,
            category_min_spacing_ms: config.category_min_spacing_ms,
            numeric_interval_ms: config.numeric_interval_ms,
            last_numeric_ms: None,
            heartbeat: Heartbeat::new(config.heartbeat_interval_ms),
        }
    }

    /// On-connect duties for a fresh session: overwrite any stale retained
    /// status with "online" and restart every cadence from the connect
    /// instant.  Forgetting the comparison state guarantees the first
    /// classification after a reconnect publishes even if it matches the
    /// pre-disconnect value.
    pub fn on_connect(
        &mut self,
        now_ms: u64,
        broker: &mut impl BrokerPort,
        contract: &LivenessContract,
    ) -> Result<(), crate::error::LinkError> {
        broker.publish(contract.topic(), contract.online_payload(), true)?;
        info!("pub: announced online on '{}'", contract.topic());

        self.last_category = [None; MetricKind::ALL.len()];
        self.last_category_publish_ms = None;
        self.last_numeric_ms = Some(now_ms);
        self.heartbeat.reset(now_ms);
        Ok(())
    }

    /// One publishing pass: categories, then numeric telemetry, then the
    /// heartbeat.  Call only while the session is usable; every publish
    /// failure is logged and retried on a later tick by virtue of the
    /// comparison/timer state not advancing.
    pub fn tick(
        &mut self,
        now_ms: u64,
        readings: &[SemanticReading],
        scheme: &TopicScheme,
        contract: &LivenessContract,
        broker: &mut impl BrokerPort,
        events: &mut impl EventSink,
    ) {
        self.publish_categories(now_ms, readings, scheme, broker, events);
        self.publish_numeric(now_ms, readings, scheme, broker, events);
        self.publish_heartbeat(now_ms, contract, broker, events);
    }

    fn publish_categories(
        &mut self,
        now_ms: u64,
        readings: &[SemanticReading],
        scheme: &TopicScheme,
        broker: &mut impl BrokerPort,
        events: &mut impl EventSink,
    ) {
        for reading in readings {
            // Unavailable reading: hold the previous published state.
            let Some(category) = reading.category else {
                continue;
            };
            let Some(topic) = scheme.category_topic(reading.metric) else {
                // Numeric profile: classification is the sink's job.
                continue;
            };
            if self.last_category[reading.metric.index()] == Some(category) {
                continue;
            }
            if let Some(last) = self.last_category_publish_ms {
                if now_ms.saturating_sub(last) < self.category_min_spacing_ms {
                    // Global spacing; the change stays pending.
                    continue;
                }
            }
            match broker.publish(topic, category.word(), true) {
                Ok(()) => {
                    debug!("pub: {} -> {category}", reading.metric.name());
                    self.last_category[reading.metric.index()] = Some(category);
                    self.last_category_publish_ms = Some(now_ms);
                    events.emit(&LinkEvent::CategoryPublished {
                        metric: reading.metric,
                        category,
                    });
                }
                Err(e) => warn!("pub: category publish failed — {e}"),
            }
        }
    }

    fn publish_numeric(
        &mut self,
        now_ms: u64,
        readings: &[SemanticReading],
        scheme: &TopicScheme,
        broker: &mut impl BrokerPort,
        events: &mut impl EventSink,
    ) {
        let due = match self.last_numeric_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.numeric_interval_ms,
            None => true,
        };
        if !due {
            return;
        }

        let mut all_ok = true;
        for reading in readings {
            // Unavailable metrics are simply absent from this round.
            let Some(raw) = reading.raw else { continue };
            let topic = scheme.numeric_topic(reading.metric);
            match broker.publish(topic, &encode_numeric(raw), false) {
                Ok(()) => {
                    debug!("pub: {} = {raw:.2}", reading.metric.raw_name());
                    events.emit(&LinkEvent::NumericPublished {
                        metric: reading.metric,
                        value: raw,
                    });
                }
                Err(e) => {
                    warn!("pub: telemetry publish failed — {e}");
                    all_ok = false;
                }
            }
        }
        if all_ok {
            self.last_numeric_ms = Some(now_ms);
        }
    }

    fn publish_heartbeat(
        &mut self,
        now_ms: u64,
        contract: &LivenessContract,
        broker: &mut impl BrokerPort,
        events: &mut impl EventSink,
    ) {
        if !self.heartbeat.due(now_ms) {
            return;
        }
        match broker.publish(contract.topic(), contract.online_payload(), true) {
            Ok(()) => {
                debug!("pub: heartbeat");
                self.heartbeat.mark_sent(now_ms);
                events.emit(&LinkEvent::HeartbeatSent);
            }
            Err(e) => warn!("pub: heartbeat failed — {e}"),
        }
    }
}
