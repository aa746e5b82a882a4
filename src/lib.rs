//! HausLink firmware library.
//!
//! Exposes the protocol core for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod liveness;
pub mod metric;
pub mod profile;
pub mod publisher;
pub mod subscriber;
pub mod supervisor;

pub mod adapters;
