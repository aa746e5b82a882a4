//! Unified error types for the HausLink firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so they
//! can be cheaply passed around without allocation.
//!
//! The design philosophy of this layer is "stay alive, keep retrying,
//! prefer silence over guessing": nothing here is unrecoverable, and most
//! errors only ever reach a `log::warn!` in the tick loop.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Network join or broker session failure.
    Link(LinkError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

/// Connectivity failures.  All of these are transient by design: the
/// supervisor leaves the node `Disconnected` and a later tick retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Network join did not complete within the join timeout.
    JoinTimeout,
    /// Network join was rejected (bad credentials, no AP).
    JoinFailed,
    /// Broker TCP connect or CONNECT/CONNACK handshake failed.
    HandshakeFailed,
    /// Operation requires a live broker session and there is none.
    NotConnected,
    /// A publish could not be handed to the transport.
    PublishFailed,
    /// A subscribe could not be handed to the transport.
    SubscribeFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinTimeout => write!(f, "network join timed out"),
            Self::JoinFailed => write!(f, "network join failed"),
            Self::HandshakeFailed => write!(f, "broker handshake failed"),
            Self::NotConnected => write!(f, "no broker session"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
