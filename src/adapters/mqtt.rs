//! Host-side MQTT adapter over a blocking `rumqttc` session.
//!
//! `rumqttc` wants a thread driving its event loop; the protocol core
//! wants a synchronous, poll-based port.  The adapter bridges the two:
//! each `connect()` builds a fresh client and spawns a driver thread that
//! owns the `Connection`, forwards inbound publishes over a channel, and
//! exits on the first transport error.  Reconnect policy stays with the
//! supervisor — the driver never retries on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rumqttc::{Client, Event, Incoming, LastWill, MqttOptions, QoS};

use crate::app::ports::{BrokerPort, ConnectOptions, InboundMessage};
use crate::error::LinkError;

const KEEP_ALIVE_SECS: u64 = 5;
const OUTGOING_QUEUE: usize = 32;
/// How long `connect()` waits for the broker's CONNACK.
const CONNACK_WAIT_MS: u64 = 5000;

struct Session {
    client: Client,
    inbound: Receiver<InboundMessage>,
    connected: Arc<AtomicBool>,
    driver: Option<thread::JoinHandle<()>>,
}

/// [`BrokerPort`] adapter over rumqttc.
#[derive(Default)]
pub struct RumqttBroker {
    session: Option<Session>,
}

impl RumqttBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BrokerPort for RumqttBroker {
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), LinkError> {
        // Drop any previous session; its driver exits when the connection
        // errors out.
        self.disconnect();

        let mut mqtt_options =
            MqttOptions::new(&options.client_id, &options.host, options.port);
        mqtt_options.set_keep_alive(Duration::from_secs(KEEP_ALIVE_SECS));
        if !options.username.is_empty() {
            mqtt_options.set_credentials(&options.username, &options.password);
        }
        if let Some(will) = &options.will {
            mqtt_options.set_last_will(LastWill::new(
                &will.topic,
                will.payload.as_bytes(),
                QoS::AtLeastOnce,
                will.retain,
            ));
        }

        let (client, mut connection) = Client::new(mqtt_options, OUTGOING_QUEUE);
        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let connected = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&connected);

        let driver = thread::spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        flag.store(true, Ordering::SeqCst);
                        let _ = ready_tx.send(());
                    }
                    Ok(Event::Incoming(Incoming::Publish(publish))) => {
                        let _ = inbound_tx.send(InboundMessage {
                            topic: publish.topic.clone(),
                            payload: publish.payload.to_vec(),
                        });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("mqtt: driver exiting — {e}");
                        flag.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            }
        });

        match ready_rx.recv_timeout(Duration::from_millis(CONNACK_WAIT_MS)) {
            Ok(()) => {
                self.session = Some(Session {
                    client,
                    inbound: inbound_rx,
                    connected,
                    driver: Some(driver),
                });
                Ok(())
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                warn!("mqtt: no CONNACK within {CONNACK_WAIT_MS}ms");
                let _ = client.disconnect();
                let _ = driver.join();
                Err(LinkError::HandshakeFailed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.connected.load(Ordering::SeqCst))
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), LinkError> {
        let session = self.session.as_ref().ok_or(LinkError::NotConnected)?;
        session
            .client
            .publish(topic, QoS::AtLeastOnce, retain, payload.as_bytes())
            .map_err(|_| LinkError::PublishFailed)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        let session = self.session.as_ref().ok_or(LinkError::NotConnected)?;
        session
            .client
            .subscribe(topic, QoS::AtLeastOnce)
            .map_err(|_| LinkError::SubscribeFailed)
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.session.as_ref()?.inbound.try_recv().ok()
    }

    fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            let _ = session.client.disconnect();
            session.connected.store(false, Ordering::SeqCst);
            if let Some(driver) = session.driver.take() {
                let _ = driver.join();
            }
        }
    }
}

impl Drop for RumqttBroker {
    fn drop(&mut self) {
        self.disconnect();
    }
}
