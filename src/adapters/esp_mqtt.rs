//! Device-side MQTT adapter over the ESP-IDF client.
//!
//! Same shape as the host adapter: a driver thread owns the connection,
//! forwards inbound publishes over a channel, and leaves reconnect policy
//! to the supervisor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
};
use log::{debug, warn};

use crate::app::ports::{BrokerPort, ConnectOptions, InboundMessage};
use crate::error::LinkError;

const KEEP_ALIVE_SECS: u64 = 5;
const CONNACK_WAIT_MS: u64 = 5000;

struct Session {
    client: EspMqttClient<'static>,
    inbound: Receiver<InboundMessage>,
    connected: Arc<AtomicBool>,
}

/// [`BrokerPort`] adapter over `esp_idf_svc::mqtt`.
#[derive(Default)]
pub struct EspBroker {
    session: Option<Session>,
}

impl EspBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BrokerPort for EspBroker {
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), LinkError> {
        self.disconnect();

        let url = format!("mqtt://{}:{}", options.host, options.port);
        let conf = MqttClientConfiguration {
            client_id: Some(&options.client_id),
            username: (!options.username.is_empty()).then_some(options.username.as_str()),
            password: (!options.password.is_empty()).then_some(options.password.as_str()),
            keep_alive_interval: Some(Duration::from_secs(KEEP_ALIVE_SECS)),
            lwt: options.will.as_ref().map(|will| LwtConfiguration {
                topic: &will.topic,
                payload: will.payload.as_bytes(),
                qos: QoS::AtLeastOnce,
                retain: will.retain,
            }),
            ..Default::default()
        };

        let (client, mut connection) =
            EspMqttClient::new(&url, &conf).map_err(|_| LinkError::HandshakeFailed)?;

        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let connected = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&connected);

        thread::spawn(move || {
            while let Ok(event) = connection.next() {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        flag.store(true, Ordering::SeqCst);
                        let _ = ready_tx.send(());
                    }
                    EventPayload::Disconnected => {
                        flag.store(false, Ordering::SeqCst);
                    }
                    EventPayload::Received {
                        topic: Some(topic),
                        data,
                        ..
                    } => {
                        let _ = inbound_tx.send(InboundMessage {
                            topic: topic.to_string(),
                            payload: data.to_vec(),
                        });
                    }
                    _ => {}
                }
            }
            debug!("mqtt: driver exiting");
            flag.store(false, Ordering::SeqCst);
        });

        match ready_rx.recv_timeout(Duration::from_millis(CONNACK_WAIT_MS)) {
            Ok(()) => {
                self.session = Some(Session {
                    client,
                    inbound: inbound_rx,
                    connected,
                });
                Ok(())
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                warn!("mqtt: no CONNACK within {CONNACK_WAIT_MS}ms");
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
        let session = self.session.as_mut().ok_or(LinkError::NotConnected)?;
        session
            .client
            .publish(topic, QoS::AtLeastOnce, retain, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| LinkError::PublishFailed)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        let session = self.session.as_mut().ok_or(LinkError::NotConnected)?;
        session
            .client
            .subscribe(topic, QoS::AtLeastOnce)
            .map(|_| ())
            .map_err(|_| LinkError::SubscribeFailed)
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.session.as_ref()?.inbound.try_recv().ok()
    }

    fn disconnect(&mut self) {
        // Dropping the client tears the session down cleanly; the driver
        // thread exits when the connection closes.
        if let Some(session) = self.session.take() {
            session.connected.store(false, Ordering::SeqCst);
            drop(session.client);
        }
    }
}
