//! Connection lifecycle state machine.
//!
//! ```text
//! Disconnected ──(attempt succeeds)──▶ Connected
//!      ▲                                  │
//!      └───(transport reports loss)───────┘
//! ```
//!
//! `Connecting` is a transient sub-state of a single attempt, never
//! scheduled on its own.  `ensure_connected()` is idempotent and cheap to
//! call every tick: already connected is a no-op, and a failed attempt
//! simply leaves the state `Disconnected` for a later tick to retry.
//!
//! Retries run at a constant cadence — the minimum retry interval — with
//! no exponential backoff.  Under a dead broker the node retries forever
//! at that fixed rate; this is a deliberate choice (see DESIGN.md), sized
//! so a revived broker is picked up within seconds without hammering it.

use log::{info, warn};

use crate::app::ports::{BrokerPort, ConnectOptions, NetworkPort};

/// Broker-session lifecycle state.  Owned exclusively by the supervisor;
/// transitions only on explicit attempt results or transport-reported loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Owns network-join and broker-connect state for one node.
pub struct ConnectionSupervisor {
    state: ConnectionState,
    min_retry_interval_ms: u64,
    join_timeout_ms: u64,
    last_attempt_ms: Option<u64>,
}

impl ConnectionSupervisor {
    pub fn new(min_retry_interval_ms: u64, join_timeout_ms: u64) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            min_retry_interval_ms,
            join_timeout_ms,
            last_attempt_ms: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the session can carry traffic right now.
    pub fn is_usable(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Idempotent per-tick connection maintenance.
    ///
    /// Returns `true` exactly when this call produced a **fresh** session,
    /// so the caller can run its on-connect duties (retained online
    /// publish, subscription setup, debounce reset).
    ///
    /// At most one attempt is started per minimum retry interval; the
    /// network join is bounded by the join timeout and polled, never
    /// waited on indefinitely.  Failure is observable only as the state
    /// staying `Disconnected`.
    pub fn ensure_connected(
        &mut self,
        now_ms: u64,
        net: &mut impl NetworkPort,
        broker: &mut impl BrokerPort,
        options: &ConnectOptions,
    ) -> bool {
        if broker.is_connected() {
            self.state = ConnectionState::Connected;
            return false;
        }

        if self.state == ConnectionState::Connected {
            warn!("link: broker session lost");
            self.state = ConnectionState::Disconnected;
        }

        if let Some(last) = self.last_attempt_ms {
            if now_ms.saturating_sub(last) < self.min_retry_interval_ms {
                return false;
            }
        }
        self.last_attempt_ms = Some(now_ms);
        self.state = ConnectionState::Connecting;

        if !net.is_up() {
            if let Err(e) = net.join(self.join_timeout_ms) {
                warn!("link: network join failed — {e}");
                self.state = ConnectionState::Disconnected;
                return false;
            }
        }

        match broker.connect(options) {
            Ok(()) => {
                info!("link: broker session established as '{}'", options.client_id);
                self.state = ConnectionState::Connected;
                true
            }
            Err(e) => {
                warn!("link: broker handshake failed — {e}");
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use crate::app::ports::InboundMessage;

    struct FakeNet {
        up: bool,
        join_result: Result<(), LinkError>,
        join_calls: usize,
    }

    impl FakeNet {
        fn up() -> Self {
            Self {
                up: true,
                join_result: Ok(()),
                join_calls: 0,
            }
        }

        fn down(join_result: Result<(), LinkError>) -> Self {
            Self {
                up: false,
                join_result,
                join_calls: 0,
            }
        }
    }

    impl NetworkPort for FakeNet {
        fn is_up(&self) -> bool {
            self.up
        }
        fn join(&mut self, _timeout_ms: u64) -> Result<(), LinkError> {
            self.join_calls += 1;
            if self.join_result.is_ok() {
                self.up = true;
            }
            self.join_result
        }
    }

    struct FakeBroker {
        connected: bool,
        accept: bool,
        connect_calls: usize,
    }

    impl FakeBroker {
        fn accepting() -> Self {
            Self {
                connected: false,
                accept: true,
                connect_calls: 0,
            }
        }

        fn refusing() -> Self {
            Self {
                connected: false,
                accept: false,
                connect_calls: 0,
            }
        }
    }

    impl BrokerPort for FakeBroker {
        fn connect(&mut self, _options: &ConnectOptions) -> Result<(), LinkError> {
            self.connect_calls += 1;
            if self.accept {
                self.connected = true;
                Ok(())
            } else {
                Err(LinkError::HandshakeFailed)
            }
        }
        fn is_connected(&self) -> bool {
            self.connected
        }
        fn publish(&mut self, _: &str, _: &str, _: bool) -> Result<(), LinkError> {
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

    fn options() -> ConnectOptions {
        ConnectOptions {
            host: "broker.local".into(),
            port: 1883,
            client_id: "test".into(),
            username: String::new(),
            password: String::new(),
            will: None,
        }
    }

    #[test]
    fn connects_and_reports_fresh() {
        let mut sup = ConnectionSupervisor::new(2000, 15_000);
        let mut net = FakeNet::up();
        let mut broker = FakeBroker::accepting();

        assert!(sup.ensure_connected(0, &mut net, &mut broker, &options()));
        assert_eq!(sup.state(), ConnectionState::Connected);

        // Already connected: no-op, not fresh.
        assert!(!sup.ensure_connected(10, &mut net, &mut broker, &options()));
        assert_eq!(broker.connect_calls, 1);
    }

    #[test]
    fn retry_spacing_allows_one_attempt_per_interval() {
        let mut sup = ConnectionSupervisor::new(2000, 15_000);
        let mut net = FakeNet::up();
        let mut broker = FakeBroker::refusing();

        assert!(!sup.ensure_connected(0, &mut net, &mut broker, &options()));
        assert!(!sup.ensure_connected(500, &mut net, &mut broker, &options()));
        assert!(!sup.ensure_connected(1999, &mut net, &mut broker, &options()));
        assert_eq!(broker.connect_calls, 1, "spaced calls must coalesce");

        assert!(!sup.ensure_connected(2000, &mut net, &mut broker, &options()));
        assert_eq!(broker.connect_calls, 2);
    }

    #[test]
    fn failure_leaves_disconnected_never_panics() {
        let mut sup = ConnectionSupervisor::new(2000, 15_000);
        let mut net = FakeNet::down(Err(LinkError::JoinTimeout));
        let mut broker = FakeBroker::accepting();

        assert!(!sup.ensure_connected(0, &mut net, &mut broker, &options()));
        assert_eq!(sup.state(), ConnectionState::Disconnected);
        assert_eq!(broker.connect_calls, 0, "handshake skipped when join fails");
    }

    #[test]
    fn joins_network_before_handshake_when_down() {
        let mut sup = ConnectionSupervisor::new(2000, 15_000);
        let mut net = FakeNet::down(Ok(()));
        let mut broker = FakeBroker::accepting();

        assert!(sup.ensure_connected(0, &mut net, &mut broker, &options()));
        assert_eq!(net.join_calls, 1);
        assert_eq!(sup.state(), ConnectionState::Connected);
    }

    #[test]
    fn transport_loss_transitions_to_disconnected() {
        let mut sup = ConnectionSupervisor::new(2000, 15_000);
        let mut net = FakeNet::up();
        let mut broker = FakeBroker::accepting();

        assert!(sup.ensure_connected(0, &mut net, &mut broker, &options()));

        // Transport drops the session behind our back.
        broker.connected = false;
        broker.accept = false;
        assert!(!sup.ensure_connected(100, &mut net, &mut broker, &options()));
        // Loss noticed within spacing of the original attempt: state falls
        // back but no second attempt is burned before the interval elapses.
        assert_eq!(sup.state(), ConnectionState::Disconnected);

        broker.accept = true;
        assert!(sup.ensure_connected(2500, &mut net, &mut broker, &options()));
        assert_eq!(sup.state(), ConnectionState::Connected);
    }

    #[test]
    fn reconnect_after_loss_reports_fresh_again() {
        let mut sup = ConnectionSupervisor::new(2000, 15_000);
        let mut net = FakeNet::up();
        let mut broker = FakeBroker::accepting();

        assert!(sup.ensure_connected(0, &mut net, &mut broker, &options()));
        broker.connected = false;
        let _ = sup.ensure_connected(3000, &mut net, &mut broker, &options());
        // The 3000ms call re-attempted (interval elapsed) and reconnected.
        assert!(sup.is_usable());
        assert_eq!(broker.connect_calls, 2);
    }
}
