//! Property tests for the publisher emission rule and the sink's
//! offline-dominance gate.

use proptest::prelude::*;

use hauslink::app::events::LinkEvent;
use hauslink::app::ports::{BrokerPort, ConnectOptions, EventSink, InboundMessage};
use hauslink::config::NodeConfig;
use hauslink::error::LinkError;
use hauslink::liveness::{LivenessContract, LivenessState};
use hauslink::metric::{Category, MetricKind, SemanticReading};
use hauslink::profile::{TopicScheme, WireProfile};
use hauslink::publisher::StatePublisher;
use hauslink::subscriber::{RenderAction, StateSubscriber};

// ── Mock ports ────────────────────────────────────────────────

#[derive(Default)]
struct RecordingBroker {
    published: Vec<(String, String, bool)>,
}

impl BrokerPort for RecordingBroker {
    fn connect(&mut self, _: &ConnectOptions) -> Result<(), LinkError> {
        Ok(())
    }
    fn is_connected(&self) -> bool {
        true
    }
    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), LinkError> {
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
    fn disconnect(&mut self) {}
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _: &LinkEvent) {}
}

fn msg(topic: &str, payload: &str) -> InboundMessage {
    InboundMessage {
        topic: topic.to_string(),
        payload: payload.as_bytes().to_vec(),
    }
}

// ── Properties ────────────────────────────────────────────────

proptest! {
    /// A category word goes out exactly when the classification differs
    /// from the previous published one, or nothing was published since
    /// connect.  Spacing is ruled out by ticking far apart.
    #[test]
    fn category_emitted_iff_changed_or_first(raws in prop::collection::vec(0u16..=4095, 1..40)) {
        let config = NodeConfig::default();
        let scheme = TopicScheme::new(WireProfile::Descriptive, "h2h", "haus1");
        let contract = LivenessContract::new(scheme.status_topic(), WireProfile::Descriptive);
        let mut publisher = StatePublisher::new(&config);
        let mut broker = RecordingBroker::default();

        publisher.on_connect(0, &mut broker, &contract).unwrap();
        broker.published.clear();

        let threshold = config.light_bright_threshold;
        let mut expected: Vec<&str> = Vec::new();
        let mut last: Option<Category> = None;

        for (i, raw) in raws.iter().enumerate() {
            let now_ms = (i as u64 + 1) * 2000;
            let reading =
                SemanticReading::from_raw(MetricKind::Light, Some(f32::from(*raw)), threshold);
            publisher.tick(now_ms, &[reading], &scheme, &contract, &mut broker, &mut NullSink);

            let category = MetricKind::Light.classify(f32::from(*raw), threshold);
            if last != Some(category) {
                expected.push(category.word());
                last = Some(category);
            }
        }

        let emitted: Vec<&str> = broker
            .published
            .iter()
            .filter(|(topic, _, _)| topic.ends_with("/state"))
            .map(|(_, payload, _)| payload.as_str())
            .collect();
        prop_assert_eq!(emitted, expected);
    }

    /// While the status topic says offline, no per-metric message of any
    /// shape produces a render action or primes the suppression cache.
    #[test]
    fn offline_dominance_blocks_all_category_traffic(
        words in prop::collection::vec(
            prop_oneof![
                Just("bright".to_string()),
                Just("dark".to_string()),
                Just("wet".to_string()),
                "[a-z0-9]{0,12}",
            ],
            0..30,
        )
    ) {
        let mut subscriber = StateSubscriber::new(&NodeConfig::default());
        prop_assert_eq!(subscriber.liveness(), LivenessState::Offline);

        for word in &words {
            let action = subscriber.handle(&msg("h2h/haus1/stube/light/state", word));
            prop_assert_eq!(action, None);
        }
        prop_assert_eq!(subscriber.liveness(), LivenessState::Offline);

        // Nothing leaked into the cache: the first valid category after
        // coming online always renders.
        subscriber.handle(&msg("h2h/haus1/status", "online"));
        let action = subscriber.handle(&msg("h2h/haus1/stube/light/state", "bright"));
        prop_assert_eq!(
            action,
            Some(RenderAction::Room {
                room: hauslink::metric::Room::Stube,
                category: Category::Bright,
            })
        );
    }

    /// Malformed numeric payloads never move the display.
    #[test]
    fn malformed_numerics_are_inert(junk in "[^0-9]{0,16}") {
        let config = NodeConfig {
            profile: WireProfile::Numeric,
            ..Default::default()
        };
        let mut subscriber = StateSubscriber::new(&config);
        subscriber.handle(&msg("h2h/haus1/sys/status", "1"));

        let action = subscriber.handle(&msg("h2h/haus1/stube/light_adc", &junk));
        prop_assert_eq!(action, None);
    }
}
