//! Role services: the per-tick orchestration for each half of the link.
//!
//! A service owns its ports, the connection supervisor, and the publishing
//! or reducing state.  `tick(now_ms)` is the single entry point, called by
//! the cooperative loop in `main`; it never blocks beyond the bounded
//! network join and never panics on transient failures.

use log::warn;

use crate::config::{NodeConfig, NodeRole};
use crate::liveness::LivenessContract;
use crate::metric::{MetricKind, SemanticReading};
use crate::profile::TopicScheme;
use crate::publisher::StatePublisher;
use crate::subscriber::{RenderAction, StateSubscriber};
use crate::supervisor::ConnectionSupervisor;

use super::events::LinkEvent;
use super::ports::{
    BrokerPort, ConnectOptions, EventSink, NetworkPort, RenderPort, SensorPort, WillMessage,
};

/// Broker session parameters for a node.  Only the source registers a last
/// will: its death must flip the retained status to offline, while a sink
/// dying is invisible to the protocol.
pub fn connect_options(config: &NodeConfig) -> ConnectOptions {
    let will = match config.role {
        NodeRole::Source => {
            let scheme = TopicScheme::new(config.profile, &config.namespace, &config.house_id);
            Some(WillMessage {
                topic: scheme.status_topic().to_string(),
                payload: config.profile.offline_payload().to_string(),
                retain: true,
            })
        }
        NodeRole::Sink => None,
    };
    ConnectOptions {
        host: config.broker_host.clone(),
        port: config.broker_port,
        client_id: config.client_id.clone(),
        username: config.username.clone(),
        password: config.password.clone(),
        will,
    }
}

// ───────────────────────────────────────────────────────────────
// Source service
// ───────────────────────────────────────────────────────────────

/// Sensor house: samples, classifies, publishes.
pub struct SourceService<B, N, S, E>
where
    B: BrokerPort,
    N: NetworkPort,
    S: SensorPort,
    E: EventSink,
{
    broker: B,
    net: N,
    sensors: S,
    events: E,
    options: ConnectOptions,
    scheme: TopicScheme,
    contract: LivenessContract,
    supervisor: ConnectionSupervisor,
    publisher: StatePublisher,
    thresholds: [f32; MetricKind::ALL.len()],
}

impl<B, N, S, E> SourceService<B, N, S, E>
where
    B: BrokerPort,
    N: NetworkPort,
    S: SensorPort,
    E: EventSink,
{
    pub fn new(config: &NodeConfig, broker: B, net: N, sensors: S, events: E) -> Self {
        let scheme = TopicScheme::new(config.profile, &config.namespace, &config.house_id);
        let contract = LivenessContract::new(scheme.status_topic(), config.profile);
        let mut thresholds = [0.0; MetricKind::ALL.len()];
        for metric in MetricKind::ALL {
            thresholds[metric.index()] = config.threshold(metric);
        }
        Self {
            broker,
            net,
            sensors,
            events,
            options: connect_options(config),
            scheme,
            contract,
            supervisor: ConnectionSupervisor::new(
                config.reconnect_min_interval_ms,
                config.join_timeout_ms,
            ),
            publisher: StatePublisher::new(config),
            thresholds,
        }
    }

    pub fn tick(&mut self, now_ms: u64) {
        let was_usable = self.supervisor.is_usable();
        let fresh =
            self.supervisor
                .ensure_connected(now_ms, &mut self.net, &mut self.broker, &self.options);
        if was_usable && !self.supervisor.is_usable() {
            self.events.emit(&LinkEvent::ConnectionLost);
        }

        if fresh {
            match self
                .publisher
                .on_connect(now_ms, &mut self.broker, &self.contract)
            {
                Ok(()) => self.events.emit(&LinkEvent::Connected),
                Err(e) => {
                    // A session that never announced online is useless: every
                    // sink is still seeing the retained offline status.  Tear
                    // it down and let the supervisor retry from scratch.
                    warn!("source: online announce failed — {e}");
                    self.broker.disconnect();
                    return;
                }
            }
        }

        if !self.supervisor.is_usable() {
            return;
        }

        let readings = self.sample();
        self.publisher.tick(
            now_ms,
            &readings,
            &self.scheme,
            &self.contract,
            &mut self.broker,
            &mut self.events,
        );

        // The source subscribes to nothing; drain anything spurious.
        while self.broker.poll().is_some() {}
    }

    fn sample(&mut self) -> [SemanticReading; MetricKind::ALL.len()] {
        let light = f32::from(self.sensors.read_light_adc());
        [
            SemanticReading::from_raw(
                MetricKind::Light,
                Some(light),
                self.thresholds[MetricKind::Light.index()],
            ),
            SemanticReading::from_raw(
                MetricKind::Humidity,
                self.sensors.read_humidity(),
                self.thresholds[MetricKind::Humidity.index()],
            ),
        ]
    }
}

// ───────────────────────────────────────────────────────────────
// Sink service
// ───────────────────────────────────────────────────────────────

/// Display house: subscribes, reduces, renders.
pub struct SinkService<B, N, R, E>
where
    B: BrokerPort,
    N: NetworkPort,
    R: RenderPort,
    E: EventSink,
{
    broker: B,
    net: N,
    render: R,
    events: E,
    options: ConnectOptions,
    supervisor: ConnectionSupervisor,
    subscriber: StateSubscriber,
}

impl<B, N, R, E> SinkService<B, N, R, E>
where
    B: BrokerPort,
    N: NetworkPort,
    R: RenderPort,
    E: EventSink,
{
    pub fn new(config: &NodeConfig, broker: B, net: N, mut render: R, events: E) -> Self {
        // Until proven otherwise the source is offline; show it.
        render.offline();
        Self {
            broker,
            net,
            render,
            events,
            options: connect_options(config),
            supervisor: ConnectionSupervisor::new(
                config.reconnect_min_interval_ms,
                config.join_timeout_ms,
            ),
            subscriber: StateSubscriber::new(config),
        }
    }

    pub fn tick(&mut self, now_ms: u64) {
        let was_usable = self.supervisor.is_usable();
        let fresh =
            self.supervisor
                .ensure_connected(now_ms, &mut self.net, &mut self.broker, &self.options);
        if was_usable && !self.supervisor.is_usable() {
            self.events.emit(&LinkEvent::ConnectionLost);
        }

        if fresh && !self.resubscribe() {
            return;
        }

        if !self.supervisor.is_usable() {
            return;
        }

        while let Some(message) = self.broker.poll() {
            let before = self.subscriber.liveness();
            let action = self.subscriber.handle(&message);
            let after = self.subscriber.liveness();
            if after != before {
                self.events.emit(&LinkEvent::LivenessChanged { state: after });
            }
            match action {
                Some(RenderAction::Room { room, category }) => {
                    self.render.apply(room, category);
                    self.events.emit(&LinkEvent::Rendered { room, category });
                }
                Some(RenderAction::Offline) => {
                    self.render.offline();
                    self.events.emit(&LinkEvent::OfflineRendered);
                }
                None => {}
            }
        }
    }

    /// Fresh-session duties: forget the old view, fall back to the offline
    /// visual, and subscribe anew.  The retained replay that follows the
    /// subscriptions rebuilds liveness and every room.  A failed subscribe
    /// tears the session down so the supervisor retries from scratch —
    /// a half-subscribed sink would silently miss state.
    fn resubscribe(&mut self) -> bool {
        self.subscriber.reset();
        self.render.offline();
        self.events.emit(&LinkEvent::OfflineRendered);

        let topics: Vec<String> = self
            .subscriber
            .subscriptions()
            .iter()
            .map(|t| t.to_string())
            .collect();
        for topic in &topics {
            if let Err(e) = self.broker.subscribe(topic) {
                warn!("sink: subscribe '{topic}' failed — {e}");
                self.broker.disconnect();
                return false;
            }
        }
        self.events.emit(&LinkEvent::Connected);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::InboundMessage;
    use crate::error::LinkError;

    /// Handshakes fine, then fails the next N publishes.
    struct FlakyBroker {
        connected: bool,
        publish_failures: u32,
        published: Vec<(String, String, bool)>,
    }

    impl FlakyBroker {
        fn new(publish_failures: u32) -> Self {
            Self {
                connected: false,
                publish_failures,
                published: Vec::new(),
            }
        }
    }

    impl BrokerPort for FlakyBroker {
        fn connect(&mut self, _: &ConnectOptions) -> Result<(), LinkError> {
            self.connected = true;
            Ok(())
        }
        fn is_connected(&self) -> bool {
            self.connected
        }
        fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), LinkError> {
            if self.publish_failures > 0 {
                self.publish_failures -= 1;
                return Err(LinkError::PublishFailed);
            }
            self.published
                .push((topic.to_string(), payload.to_string(), retain));
            Ok(())
        }
        fn subscribe(&mut self, _: &str) -> Result<(), LinkError> {
            Ok(())
        }
        fn poll(&mut self) -> Option<InboundMessage> {
            None
        }
        fn disconnect(&mut self) {
            self.connected = false;
        }
    }

    struct UpNetwork;

    impl NetworkPort for UpNetwork {
        fn is_up(&self) -> bool {
            true
        }
        fn join(&mut self, _timeout_ms: u64) -> Result<(), LinkError> {
            Ok(())
        }
    }

    struct FixedSensors;

    impl SensorPort for FixedSensors {
        fn read_light_adc(&mut self) -> u16 {
            2500
        }
        fn read_humidity(&mut self) -> Option<f32> {
            None
        }
    }

    #[derive(Default)]
    struct RecordingSink(Vec<LinkEvent>);

    impl EventSink for RecordingSink {
        fn emit(&mut self, event: &LinkEvent) {
            self.0.push(*event);
        }
    }

    #[test]
    fn failed_online_announce_tears_down_and_retries() {
        let config = NodeConfig {
            role: NodeRole::Source,
            ..Default::default()
        };
        let mut source = SourceService::new(
            &config,
            FlakyBroker::new(1),
            UpNetwork,
            FixedSensors,
            RecordingSink::default(),
        );

        // The handshake succeeds but the retained online publish does not.
        // Nothing else may go out on this session.
        source.tick(0);
        assert!(source.broker.published.is_empty());
        assert!(!source.broker.is_connected());
        assert!(!source.events.0.contains(&LinkEvent::Connected));

        // Past the retry spacing: a fresh session announces online before
        // any category or telemetry traffic.
        source.tick(2500);
        assert_eq!(
            source
                .broker
                .published
                .first()
                .map(|(t, p, r)| (t.as_str(), p.as_str(), *r)),
            Some(("h2h/haus1/status", "online", true))
        );
        assert!(source.events.0.contains(&LinkEvent::Connected));
    }
}
