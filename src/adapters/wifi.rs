//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.  Link state is published to the uploader thread through
//! [`set_network_up`](crate::uplink::channels::set_network_up) and to the
//! main loop as [`Event::NetworkUp`] / [`Event::NetworkDown`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! Nothing here blocks.  `connect()` only starts association; `poll()`
//! (called every control tick) notices when the link comes up, times out
//! a stuck attempt, and retries after an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s).

use core::fmt;
use log::{info, warn};

use crate::events::{Event, push_event};
use crate::uplink::channels::set_network_up;

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl From<ConnectivityError> for crate::error::CommsError {
    fn from(_: ConnectivityError) -> Self {
        Self::WifiConnectFailed
    }
}

pub trait ConnectivityPort {
    /// Start association.  Returns once the attempt is under way.
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Drive the reconnection state machine.  Call once per control tick.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting { since_ms: u64 },
    Connected,
    Reconnecting { attempt: u32, next_try_ms: u64 },
}

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;
/// An association that has not completed by now is abandoned.
const CONNECT_TIMEOUT_MS: u64 = 15_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub(crate) fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_secs: u32,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: Option<esp_idf_svc::wifi::EspWifi<'static>>,
    /// Simulation: pending injected connect failures.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_connects: u32,
    /// Simulation: association state of the fake radio.
    #[cfg(not(target_os = "espidf"))]
    sim_link: bool,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            last_rssi: None,
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_fail_connects: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_link: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Hand over the ESP-IDF WiFi driver (built in `main` from the modem
    /// peripheral, system event loop and NVS partition).
    #[cfg(target_os = "espidf")]
    pub fn attach_driver(&mut self, driver: esp_idf_svc::wifi::EspWifi<'static>) {
        self.driver = Some(driver);
    }

    /// Make the next `n` association attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next_connects(&mut self, n: u32) {
        self.sim_fail_connects = n;
    }

    /// Simulate the AP going away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        self.sim_link = false;
    }

    fn schedule_retry(&mut self, attempt: u32, now_ms: u64) {
        let next_try_ms = now_ms + u64::from(self.backoff_secs) * 1_000;
        info!(
            "WiFi: retry #{} in {}s",
            attempt + 1,
            self.backoff_secs
        );
        self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
        self.state = WifiState::Reconnecting {
            attempt,
            next_try_ms,
        };
    }

    fn link_up(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_secs = INITIAL_BACKOFF_SECS;
        self.last_rssi = self.platform_rssi();
        set_network_up(true);
        if !push_event(Event::NetworkUp) {
            warn!("WiFi: event queue full (NetworkUp)");
        }
        info!("WiFi: connected (RSSI={:?})", self.last_rssi);
    }

    fn link_down(&mut self) {
        self.last_rssi = None;
        set_network_up(false);
        if !push_event(Event::NetworkDown) {
            warn!("WiFi: event queue full (NetworkDown)");
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let driver = self
            .driver
            .as_mut()
            .ok_or(ConnectivityError::ConnectionFailed)?;

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        driver.set_configuration(&cfg).map_err(|e| {
            warn!("WiFi: set_configuration failed: {}", e);
            ConnectivityError::ConnectionFailed
        })?;
        if !driver.is_started().unwrap_or(false) {
            driver.start().map_err(|e| {
                warn!("WiFi: start failed: {}", e);
                ConnectivityError::ConnectionFailed
            })?;
        }
        driver.connect().map_err(|e| {
            warn!("WiFi: connect failed: {}", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_fail_connects > 0 {
            self.sim_fail_connects -= 1;
            warn!("WiFi(sim): simulated association failure");
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.sim_link = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(driver) = self.driver.as_mut() {
            let _ = driver.disconnect();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_link = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| {
            d.is_connected().unwrap_or(false) && d.sta_netif().is_up().unwrap_or(false)
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = Default::default();
        // SAFETY: ap_info is a valid out-pointer; the call fails cleanly
        // when not associated.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == esp_idf_svc::sys::ESP_OK as i32).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        self.sim_link.then_some(-60)
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting { since_ms: now_ms };
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                self.schedule_retry(0, now_ms);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        let was_up = self.state == WifiState::Connected;
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        if was_up {
            self.link_down();
        }
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Disconnected => {}
            WifiState::Connecting { since_ms } => {
                if self.platform_is_connected() {
                    self.link_up();
                } else if now_ms.saturating_sub(since_ms) >= CONNECT_TIMEOUT_MS {
                    warn!("WiFi: association timed out");
                    self.platform_disconnect();
                    self.schedule_retry(0, now_ms);
                }
            }
            WifiState::Connected => {
                if self.platform_is_connected() {
                    self.last_rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.link_down();
                    self.schedule_retry(0, now_ms);
                }
            }
            WifiState::Reconnecting {
                attempt,
                next_try_ms,
            } => {
                if now_ms < next_try_ms {
                    return;
                }
                info!("WiFi: reconnect attempt {}", attempt + 1);
                match self.platform_connect() {
                    Ok(()) => self.state = WifiState::Connecting { since_ms: now_ms },
                    Err(_) => self.schedule_retry(attempt + 1, now_ms),
                }
            }
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
