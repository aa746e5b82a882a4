//! End-to-end scenarios: a source and a sink service talking through the
//! in-memory loopback broker, with scripted sensors and a recorded display.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hauslink::adapters::loopback::LoopbackHub;
use hauslink::adapters::net::WifiNetwork;
use hauslink::app::events::LinkEvent;
use hauslink::app::ports::{EventSink, RenderPort, SensorPort};
use hauslink::app::service::{SinkService, SourceService};
use hauslink::config::{NodeConfig, NodeRole};
use hauslink::liveness::LivenessState;
use hauslink::metric::{Category, Room};

// ── Mock ports ────────────────────────────────────────────────

struct ScriptedSensors {
    light: Rc<Cell<u16>>,
    humidity: Rc<Cell<Option<f32>>>,
}

impl SensorPort for ScriptedSensors {
    fn read_light_adc(&mut self) -> u16 {
        self.light.get()
    }
    fn read_humidity(&mut self) -> Option<f32> {
        self.humidity.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Paint {
    Room(Room, Category),
    Offline,
}

struct RenderLog(Rc<RefCell<Vec<Paint>>>);

impl RenderPort for RenderLog {
    fn apply(&mut self, room: Room, category: Category) {
        self.0.borrow_mut().push(Paint::Room(room, category));
    }
    fn offline(&mut self) {
        self.0.borrow_mut().push(Paint::Offline);
    }
}

struct EventLog(Rc<RefCell<Vec<LinkEvent>>>);

impl EventSink for EventLog {
    fn emit(&mut self, event: &LinkEvent) {
        self.0.borrow_mut().push(*event);
    }
}

// ── Fixture ───────────────────────────────────────────────────

struct Link {
    hub: LoopbackHub,
    source: SourceService<
        hauslink::adapters::loopback::LoopbackBroker,
        WifiNetwork,
        ScriptedSensors,
        EventLog,
    >,
    sink: SinkService<
        hauslink::adapters::loopback::LoopbackBroker,
        WifiNetwork,
        RenderLog,
        EventLog,
    >,
    source_broker_id: usize,
    light: Rc<Cell<u16>>,
    humidity: Rc<Cell<Option<f32>>>,
    paints: Rc<RefCell<Vec<Paint>>>,
    sink_events: Rc<RefCell<Vec<LinkEvent>>>,
}

impl Link {
    fn new() -> Self {
        let hub = LoopbackHub::new();

        let source_config = NodeConfig {
            role: NodeRole::Source,
            client_id: "e2e-source".to_string(),
            ..Default::default()
        };
        let sink_config = NodeConfig {
            role: NodeRole::Sink,
            client_id: "e2e-sink".to_string(),
            ..Default::default()
        };

        let light = Rc::new(Cell::new(2500u16));
        let humidity = Rc::new(Cell::new(None));
        let paints = Rc::new(RefCell::new(Vec::new()));
        let sink_events = Rc::new(RefCell::new(Vec::new()));

        let source_broker = hub.client();
        let source_broker_id = source_broker.id();
        let source = SourceService::new(
            &source_config,
            source_broker,
            WifiNetwork::new("hausnetz", "hauspass").unwrap(),
            ScriptedSensors {
                light: Rc::clone(&light),
                humidity: Rc::clone(&humidity),
            },
            EventLog(Rc::new(RefCell::new(Vec::new()))),
        );

        let sink = SinkService::new(
            &sink_config,
            hub.client(),
            WifiNetwork::new("hausnetz", "hauspass").unwrap(),
            RenderLog(Rc::clone(&paints)),
            EventLog(Rc::clone(&sink_events)),
        );

        Self {
            hub,
            source,
            sink,
            source_broker_id,
            light,
            humidity,
            paints,
            sink_events,
        }
    }

    /// Source tick, then sink tick — the common delivery order.
    fn tick_both(&mut self, now_ms: u64) {
        self.source.tick(now_ms);
        self.sink.tick(now_ms);
    }

    fn paints(&self) -> Vec<Paint> {
        self.paints.borrow().clone()
    }
}

// ── Scenarios ─────────────────────────────────────────────────

#[test]
fn bright_dark_round_trip_without_redundant_renders() {
    let mut link = Link::new();
    link.light.set(2500);

    link.tick_both(0);

    // Steady state: nothing new should be rendered.
    for step in 1..20u64 {
        link.tick_both(step * 20);
    }

    // Threshold crossing.
    link.light.set(100);
    link.tick_both(2000);
    link.tick_both(2020);

    assert_eq!(
        link.paints(),
        vec![
            Paint::Offline, // at construction
            Paint::Offline, // fresh session, before retained replay
            Paint::Room(Room::Stube, Category::Bright),
            Paint::Room(Room::Stube, Category::Dark),
        ]
    );
}

#[test]
fn source_death_and_recovery() {
    let mut link = Link::new();
    link.light.set(2500);
    link.tick_both(0);
    assert_eq!(
        link.paints().last(),
        Some(&Paint::Room(Room::Stube, Category::Bright))
    );

    // The source's transport dies uncleanly; the broker fires the will.
    link.hub.sever(link.source_broker_id);
    link.sink.tick(3000);
    assert_eq!(link.paints().last(), Some(&Paint::Offline));
    assert!(link
        .sink_events
        .borrow()
        .contains(&LinkEvent::LivenessChanged {
            state: LivenessState::Offline
        }));

    // A stale category arriving while offline must not repaint anything.
    let mut intruder = link.hub.client();
    {
        use hauslink::app::ports::{BrokerPort, ConnectOptions};
        intruder
            .connect(&ConnectOptions {
                host: "loopback".into(),
                port: 0,
                client_id: "intruder".into(),
                username: String::new(),
                password: String::new(),
                will: None,
            })
            .unwrap();
        intruder
            .publish("h2h/haus1/stube/light/state", "bright", true)
            .unwrap();
    }
    link.sink.tick(3100);
    assert_eq!(link.paints().last(), Some(&Paint::Offline));

    // Source recovers: retry spacing elapsed, reconnect, online + replay.
    link.tick_both(4000);
    link.sink.tick(4020);

    assert_eq!(
        link.paints().last(),
        Some(&Paint::Room(Room::Stube, Category::Bright)),
        "unchanged category must repaint over the offline visual"
    );
    assert!(link
        .sink_events
        .borrow()
        .contains(&LinkEvent::LivenessChanged {
            state: LivenessState::Online
        }));
}

#[test]
fn fresh_humidity_after_recovery_renders_wet() {
    let mut link = Link::new();
    link.light.set(2500);
    link.humidity.set(Some(40.0));
    link.tick_both(0);
    // Humidity waits for the global category spacing behind the light.
    link.tick_both(1000);
    assert!(link.paints().contains(&Paint::Room(Room::Wc, Category::Dry)));

    link.hub.sever(link.source_broker_id);
    link.sink.tick(2000);
    assert_eq!(link.paints().last(), Some(&Paint::Offline));

    // The bathroom got wet while the source was away.
    link.humidity.set(Some(70.0));
    link.tick_both(4000); // reconnect, online, light takes the first slot
    link.tick_both(5000); // humidity's slot after the spacing

    assert_eq!(
        link.paints().last(),
        Some(&Paint::Room(Room::Wc, Category::Wet))
    );
}

#[test]
fn heartbeat_does_not_disturb_the_sink() {
    let mut link = Link::new();
    link.light.set(2500);
    link.tick_both(0);
    let settled = link.paints();

    // Cross the heartbeat period with no sensor change.
    for step in 0..40u64 {
        link.tick_both(1000 + step * 500);
    }

    assert_eq!(link.paints(), settled);
}

#[test]
fn late_joining_sink_catches_up_from_retained_state() {
    let hub = LoopbackHub::new();
    let light = Rc::new(Cell::new(2500u16));

    let source_config = NodeConfig {
        role: NodeRole::Source,
        ..Default::default()
    };
    let mut source = SourceService::new(
        &source_config,
        hub.client(),
        WifiNetwork::new("hausnetz", "hauspass").unwrap(),
        ScriptedSensors {
            light: Rc::clone(&light),
            humidity: Rc::new(Cell::new(None)),
        },
        EventLog(Rc::new(RefCell::new(Vec::new()))),
    );
    source.tick(0);

    // Sink starts long after the source published.
    let paints = Rc::new(RefCell::new(Vec::new()));
    let sink_config = NodeConfig {
        role: NodeRole::Sink,
        ..Default::default()
    };
    let mut sink = SinkService::new(
        &sink_config,
        hub.client(),
        WifiNetwork::new("hausnetz", "hauspass").unwrap(),
        RenderLog(Rc::clone(&paints)),
        EventLog(Rc::new(RefCell::new(Vec::new()))),
    );
    sink.tick(60_000);

    assert_eq!(
        paints.borrow().last(),
        Some(&Paint::Room(Room::Stube, Category::Bright))
    );
}
