//! Reminder configuration parameters
//!
//! All tunable parameters for the MedAlert controller.
//! Values can be overridden via NVS (non-volatile storage) at runtime.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Longest accepted alert delay (one day).
pub const MAX_ALERT_DELAY_MS: u32 = 24 * 60 * 60 * 1000;

/// How the alert indicator is rendered while a dose is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertPattern {
    /// Alert LED and buzzer held on.
    Solid,
    /// Alert LED and buzzer toggled at 2 Hz.
    Blink,
}

/// Which member of the DHT family is fitted on the sensor header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DhtModel {
    Dht11,
    Dht22,
}

/// Core reminder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderConfig {
    // --- Dose timing ---
    /// Time from cycle start until the dose alert fires (milliseconds)
    pub alert_delay_ms: u32,
    /// Spacing between repeat BLE reminders while alerting (milliseconds)
    pub notification_interval_ms: u32,
    /// Acknowledgment debounce window after the first press edge (milliseconds)
    pub ack_debounce_ms: u32,

    // --- Indicators ---
    /// Buzzer tone frequency (Hz)
    pub buzzer_tone_hz: u32,
    /// Alert LED / buzzer rendering
    pub alert_pattern: AlertPattern,

    // --- Sensors ---
    /// Fitted humidity/temperature sensor
    pub dht_model: DhtModel,

    // --- Uplink ---
    /// Send confirmation and environment records to the log server
    pub uplink_enabled: bool,
    /// Log server base URL, e.g. `http://192.168.1.100:5000`
    pub server_url: heapless::String<64>,
    /// WiFi station SSID (empty = WiFi disabled)
    pub wifi_ssid: heapless::String<32>,
    /// WiFi station passphrase (empty = open network)
    pub wifi_password: heapless::String<64>,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        let mut server_url = heapless::String::new();
        let _ = server_url.push_str("http://192.168.1.100:5000");

        Self {
            // Dose timing
            alert_delay_ms: 10_000,          // 10 s after boot
            notification_interval_ms: 5_000, // one reminder per 5 s
            ack_debounce_ms: 200,

            // Indicators
            buzzer_tone_hz: 2_000,
            alert_pattern: AlertPattern::Blink,

            // Sensors
            dht_model: DhtModel::Dht22,

            // Uplink
            uplink_enabled: false,
            server_url,
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),

            // Timing
            control_loop_interval_ms: 50, // 20 Hz
        }
    }
}

impl ReminderConfig {
    /// Range-check every field.
    ///
    /// Invalid values are rejected, never clamped, so a bad stored blob or a
    /// bad runtime update cannot reach a running cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alert_delay_ms > MAX_ALERT_DELAY_MS {
            return Err(ConfigError::ValidationFailed(
                "alert_delay_ms must be 0–86400000",
            ));
        }
        if !(1_000..=3_600_000).contains(&self.notification_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "notification_interval_ms must be 1000–3600000",
            ));
        }
        if !(20..=2_000).contains(&self.ack_debounce_ms) {
            return Err(ConfigError::ValidationFailed(
                "ack_debounce_ms must be 20–2000",
            ));
        }
        if !(10..=100).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 10–100",
            ));
        }
        if !(100..=10_000).contains(&self.buzzer_tone_hz) {
            return Err(ConfigError::ValidationFailed(
                "buzzer_tone_hz must be 100–10000",
            ));
        }
        if self.uplink_enabled && !self.server_url.starts_with("http://") {
            return Err(ConfigError::ValidationFailed(
                "server_url must start with http:// when uplink is enabled",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = ReminderConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.alert_delay_ms, 10_000);
        assert_eq!(c.notification_interval_ms, 5_000);
        assert_eq!(c.ack_debounce_ms, 200);
        assert!(!c.uplink_enabled);
    }

    #[test]
    fn zero_alert_delay_is_legal() {
        let c = ReminderConfig {
            alert_delay_ms: 0,
            ..Default::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_zero_interval() {
        let c = ReminderConfig {
            notification_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_slow_control_loop() {
        let c = ReminderConfig {
            control_loop_interval_ms: 500,
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_uplink_without_http_url() {
        let mut url = heapless::String::new();
        url.push_str("ftp://example").unwrap();
        let c = ReminderConfig {
            uplink_enabled: true,
            server_url: url,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = ReminderConfig::default();
        assert!(
            c.control_loop_interval_ms < c.ack_debounce_ms,
            "control loop must sample faster than the debounce window"
        );
        assert!(c.ack_debounce_ms < c.notification_interval_ms);
    }

    #[test]
    fn serde_roundtrip() {
        let c = ReminderConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: ReminderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let c = ReminderConfig {
            alert_pattern: AlertPattern::Solid,
            dht_model: DhtModel::Dht11,
            ..Default::default()
        };
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: ReminderConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }
}
