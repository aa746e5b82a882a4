//! Startup-mode selection.
//!
//! Holding the boot input through the hold window forces credential
//! reprovisioning instead of a normal reconnect.  The gate only decides
//! the mode; what provisioning looks like is outside the protocol core.

/// How the node should come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapMode {
    /// Reconnect with stored credentials.
    Normal,
    /// Enter forced credential reconfiguration.
    Provision,
}

/// Debounced hold detector for the boot input, sampled with an injected
/// `now_ms` during startup.
pub struct BootstrapGate {
    hold_ms: u64,
    pressed_since: Option<u64>,
}

impl BootstrapGate {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            pressed_since: None,
        }
    }

    /// Feed one input sample.  Returns the mode as soon as it is decided:
    /// released before the hold window → `Normal`; held through the full
    /// window → `Provision`; still held but short of the window → `None`.
    pub fn sample(&mut self, now_ms: u64, pressed: bool) -> Option<BootstrapMode> {
        if !pressed {
            return Some(BootstrapMode::Normal);
        }
        let since = *self.pressed_since.get_or_insert(now_ms);
        if now_ms.saturating_sub(since) >= self.hold_ms {
            Some(BootstrapMode::Provision)
        } else {
            None
        }
    }
}
