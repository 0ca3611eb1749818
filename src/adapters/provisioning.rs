//! Configuration writes from the companion app.
//!
//! The BLE config characteristic takes one JSON object holding any subset
//! of the runtime-tunable fields:
//!
//! ```text
//! {"wifi_ssid":"ward-3","wifi_password":"s3cret-pass","uplink_enabled":true}
//! ```
//!
//! ```text
//!  BLE write ──▶ decode_config_write ──▶ AppCommand::UpdateConfig
//!                                              │ auto-save (5 s)
//!                                              ▼
//!            indicators · uplink · WiFi ◀── ConfigFollower
//! ```
//!
//! Buzzer tone, DHT model and control-loop rate are read once at boot and
//! are refused here, as is any unknown field.

use log::{info, warn};
use serde::Deserialize;

use crate::app::ports::ConfigError;
use crate::config::{AlertPattern, ReminderConfig};
use crate::uplink::channels::{ServerUrl, UplinkTarget};

use super::hardware::HardwareIndicators;
use super::uplink::QueuedUplink;
use super::wifi::{self, ConnectivityPort, WifiAdapter, WifiState};

// ───────────────────────────────────────────────────────────────
// Decoding
// ───────────────────────────────────────────────────────────────

/// The fields a config write may carry.  Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatch {
    pub alert_delay_ms: Option<u32>,
    pub notification_interval_ms: Option<u32>,
    pub ack_debounce_ms: Option<u32>,
    pub alert_pattern: Option<AlertPattern>,
    pub uplink_enabled: Option<bool>,
    pub server_url: Option<ServerUrl>,
    pub wifi_ssid: Option<heapless::String<32>>,
    pub wifi_password: Option<heapless::String<64>>,
}

impl ConfigPatch {
    fn apply_to(self, config: &mut ReminderConfig) {
        if let Some(v) = self.alert_delay_ms {
            config.alert_delay_ms = v;
        }
        if let Some(v) = self.notification_interval_ms {
            config.notification_interval_ms = v;
        }
        if let Some(v) = self.ack_debounce_ms {
            config.ack_debounce_ms = v;
        }
        if let Some(v) = self.alert_pattern {
            config.alert_pattern = v;
        }
        if let Some(v) = self.uplink_enabled {
            config.uplink_enabled = v;
        }
        if let Some(v) = self.server_url {
            config.server_url = v;
        }
        if let Some(v) = self.wifi_ssid {
            config.wifi_ssid = v;
        }
        if let Some(v) = self.wifi_password {
            config.wifi_password = v;
        }
    }
}

/// Merge a raw config write over `current` and validate the result.
///
/// Malformed JSON is [`ConfigError::Corrupted`]; a well-formed write that
/// produces an invalid config is [`ConfigError::ValidationFailed`].
pub fn decode_config_write(
    current: &ReminderConfig,
    raw: &[u8],
) -> Result<ReminderConfig, ConfigError> {
    let patch: ConfigPatch = serde_json::from_slice(raw).map_err(|e| {
        warn!("config write: not accepted ({})", e);
        ConfigError::Corrupted
    })?;

    let mut next = current.clone();
    patch.apply_to(&mut next);
    next.validate()?;

    // An empty SSID turns WiFi off; anything else must be joinable.
    if !next.wifi_ssid.is_empty() {
        wifi::validate_ssid(&next.wifi_ssid)
            .map_err(|_| ConfigError::ValidationFailed("wifi_ssid must be 1-32 printable ASCII"))?;
        wifi::validate_password(&next.wifi_password).map_err(|_| {
            ConfigError::ValidationFailed("wifi_password must be empty or 8-64 bytes")
        })?;
    }
    Ok(next)
}

// ───────────────────────────────────────────────────────────────
// Applying a saved config
// ───────────────────────────────────────────────────────────────

/// Adapters whose behaviour follows the saved configuration.
pub struct ConfigFollower<'a, 'u> {
    pub indicators: &'a mut HardwareIndicators,
    pub uplink: &'a mut QueuedUplink<'u>,
    pub wifi: &'a mut WifiAdapter,
    pub target: &'a UplinkTarget,
}

impl ConfigFollower<'_, '_> {
    /// Move the adapters from `applied` to `saved`.  Only what changed is
    /// touched; a WiFi credential change drops the link and reconnects.
    pub fn follow(&mut self, applied: &ReminderConfig, saved: &ReminderConfig, now_ms: u64) {
        if saved.alert_pattern != applied.alert_pattern {
            self.indicators.set_alert_pattern(saved.alert_pattern);
        }
        if saved.uplink_enabled != applied.uplink_enabled {
            info!("Uplink {}", if saved.uplink_enabled { "enabled" } else { "disabled" });
            self.uplink.set_enabled(saved.uplink_enabled);
        }
        if saved.server_url != applied.server_url {
            self.target.signal(saved.server_url.clone());
        }

        let credentials_changed = saved.wifi_ssid != applied.wifi_ssid
            || saved.wifi_password != applied.wifi_password;
        if !credentials_changed {
            return;
        }
        if self.wifi.state() != WifiState::Disconnected {
            self.wifi.disconnect();
        }
        if saved.wifi_ssid.is_empty() {
            info!("WiFi: SSID cleared, uplink stays offline");
            return;
        }
        match self.wifi.set_credentials(&saved.wifi_ssid, &saved.wifi_password) {
            Ok(()) => {
                if let Err(e) = self.wifi.connect(now_ms) {
                    warn!("WiFi: connect failed ({}), retrying in background", e);
                }
            }
            Err(e) => warn!("WiFi: new credentials rejected ({})", e),
        }
    }
}
