//! WiFi station adapter.
//!
//! Implements [`NetworkPort`] — the join side of the connection
//! supervisor.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: ESP-IDF WiFi STA via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stub for host runs and tests.

use log::info;

use crate::app::ports::NetworkPort;
use crate::error::LinkError;

/// Station-mode WiFi behind the network port.
pub struct WifiNetwork {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    up: bool,
}

impl WifiNetwork {
    /// Credentials longer than the 802.11 limits are rejected up front
    /// rather than truncated.
    pub fn new(ssid: &str, password: &str) -> Result<Self, crate::error::Error> {
        let ssid = heapless::String::try_from(ssid)
            .map_err(|_| crate::error::Error::Config("wifi_ssid longer than 32 bytes"))?;
        let password = heapless::String::try_from(password)
            .map_err(|_| crate::error::Error::Config("wifi_password longer than 64 bytes"))?;
        Ok(Self {
            ssid,
            password,
            up: false,
        })
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_join(&mut self, _timeout_ms: u64) -> Result<(), LinkError> {
        // ESP-IDF WiFi STA join.
        //
        // The full wiring requires:
        // 1. EspWifi::new(peripherals.modem, sysloop, nvs)
        // 2. wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        //        ssid: self.ssid.as_str().try_into().unwrap(),
        //        password: self.password.as_str().try_into().unwrap(),
        //        auth_method: AuthMethod::WPA2Personal,
        //        ..Default::default()
        //    }))
        // 3. wifi.start(); wifi.connect()
        // 4. poll wifi.is_up() until true or timeout_ms elapses
        //
        // These handles (EspWifi, EspEventLoop, NVS partition) are threaded
        // in from main.rs once peripheral wiring lands.
        info!("wifi(espidf): STA join deferred until peripheral wiring");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_join(&mut self, _timeout_ms: u64) -> Result<(), LinkError> {
        let _ = &self.password;
        info!("wifi(sim): joined '{}'", self.ssid);
        Ok(())
    }
}

impl NetworkPort for WifiNetwork {
    fn is_up(&self) -> bool {
        self.up
    }

    fn join(&mut self, timeout_ms: u64) -> Result<(), LinkError> {
        if self.up {
            return Ok(());
        }
        if self.ssid.is_empty() {
            return Err(LinkError::JoinFailed);
        }
        self.platform_join(timeout_ms)?;
        self.up = true;
        Ok(())
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn join_is_idempotent() {
        let mut net = WifiNetwork::new("hausnetz", "hauspass").unwrap();
        assert!(!net.is_up());
        net.join(15_000).unwrap();
        assert!(net.is_up());
        net.join(15_000).unwrap();
    }

    #[test]
    fn empty_ssid_refused() {
        let mut net = WifiNetwork::new("", "").unwrap();
        assert!(net.join(15_000).is_err());
    }

    #[test]
    fn oversize_ssid_rejected() {
        assert!(WifiNetwork::new(&"x".repeat(33), "pw").is_err());
    }
}
