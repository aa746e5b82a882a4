//! In-memory broker adapter.
//!
//! Implements enough of the broker contract for end-to-end tests without a
//! network: retained messages replayed on subscribe, last-will fired on
//! unclean disconnect (and only then), exact-topic matching.  All clients
//! attached to one [`LoopbackHub`] share the broker state; the hub keeps a
//! handle so tests can sever a client's session from outside.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::app::ports::{BrokerPort, ConnectOptions, InboundMessage, WillMessage};
use crate::error::LinkError;

#[derive(Default)]
struct ClientSlot {
    connected: bool,
    subscriptions: Vec<String>,
    inbound: VecDeque<InboundMessage>,
    will: Option<WillMessage>,
}

#[derive(Default)]
struct BrokerCore {
    retained: HashMap<String, String>,
    clients: Vec<ClientSlot>,
}

impl BrokerCore {
    /// Deliver to every connected subscriber; retained messages overwrite
    /// the stored value (an empty retained payload clears it, like a real
    /// broker).
    fn route(&mut self, topic: &str, payload: &str, retain: bool) {
        if retain {
            if payload.is_empty() {
                self.retained.remove(topic);
            } else {
                self.retained.insert(topic.to_string(), payload.to_string());
            }
        }
        for slot in &mut self.clients {
            if slot.connected && slot.subscriptions.iter().any(|s| s == topic) {
                slot.inbound.push_back(InboundMessage {
                    topic: topic.to_string(),
                    payload: payload.as_bytes().to_vec(),
                });
            }
        }
    }

    fn sever(&mut self, id: usize) {
        let will = {
            let slot = &mut self.clients[id];
            if !slot.connected {
                return;
            }
            slot.connected = false;
            slot.will.take()
        };
        if let Some(will) = will {
            self.route(&will.topic, &will.payload, will.retain);
        }
    }
}

/// Shared broker state; hand out one [`LoopbackBroker`] per node.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    core: Arc<Mutex<BrokerCore>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new client handle.
    pub fn client(&self) -> LoopbackBroker {
        let mut core = self.core.lock().unwrap();
        core.clients.push(ClientSlot::default());
        LoopbackBroker {
            core: Arc::clone(&self.core),
            id: core.clients.len() - 1,
            refuse_connect: false,
        }
    }

    /// Sever a client's session as the network would: connection gone,
    /// last will fired.  Takes the id so the handle itself can live inside
    /// a service.
    pub fn sever(&self, client_id: usize) {
        self.core.lock().unwrap().sever(client_id);
    }

    /// Retained payload currently stored for a topic.
    pub fn retained(&self, topic: &str) -> Option<String> {
        self.core.lock().unwrap().retained.get(topic).cloned()
    }
}

/// One node's session with the [`LoopbackHub`].
pub struct LoopbackBroker {
    core: Arc<Mutex<BrokerCore>>,
    id: usize,
    refuse_connect: bool,
}

impl LoopbackBroker {
    /// Identifier for [`LoopbackHub::sever`].
    pub fn id(&self) -> usize {
        self.id
    }

    /// Make subsequent `connect()` calls fail, for exercising retry paths.
    pub fn set_refuse_connect(&mut self, refuse: bool) {
        self.refuse_connect = refuse;
    }
}

impl BrokerPort for LoopbackBroker {
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), LinkError> {
        if self.refuse_connect {
            return Err(LinkError::HandshakeFailed);
        }
        let mut core = self.core.lock().unwrap();
        let slot = &mut core.clients[self.id];
        slot.connected = true;
        slot.subscriptions.clear();
        slot.inbound.clear();
        slot.will = options.will.clone();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.core.lock().unwrap().clients[self.id].connected
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), LinkError> {
        let mut core = self.core.lock().unwrap();
        if !core.clients[self.id].connected {
            return Err(LinkError::NotConnected);
        }
        core.route(topic, payload, retain);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        let mut core = self.core.lock().unwrap();
        if !core.clients[self.id].connected {
            return Err(LinkError::NotConnected);
        }
        let replay = core.retained.get(topic).cloned();
        let slot = &mut core.clients[self.id];
        if !slot.subscriptions.iter().any(|s| s == topic) {
            slot.subscriptions.push(topic.to_string());
        }
        // Retained replay, exactly like a broker answering a new subscriber.
        if let Some(payload) = replay {
            slot.inbound.push_back(InboundMessage {
                topic: topic.to_string(),
                payload: payload.into_bytes(),
            });
        }
        Ok(())
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.core.lock().unwrap().clients[self.id].inbound.pop_front()
    }

    fn disconnect(&mut self) {
        // Clean disconnect: the will is discarded, not fired.
        let mut core = self.core.lock().unwrap();
        let slot = &mut core.clients[self.id];
        slot.connected = false;
        slot.will = None;
    }
}
