//! Application layer: port traits, structured events, and the role
//! services that tie the protocol state machines to the adapters.

pub mod events;
pub mod ports;
pub mod service;
