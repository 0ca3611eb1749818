//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (environment sensor, indicators, BLE notifier, NVS,
//! uplink queue, event sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! Every write-side port is fire-and-forget from the core's point of
//! view: errors are returned for logging, never for control flow.

use crate::config::ReminderConfig;
use crate::error::{CommsError, SensorError};
use crate::sensors::{EnvironmentClass, EnvironmentReading};

use super::effects::NotificationKind;

// ───────────────────────────────────────────────────────────────
// Environment port (driven adapter: sensor → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the humidity/temperature sensor.
///
/// Called only at the confirmation instant, never on the regular tick path.
pub trait EnvironmentPort {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → LEDs / buzzer)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the visual and audible indicators.
pub trait IndicatorPort {
    /// Cycle running, dose not yet due.
    fn show_waiting(&mut self);

    /// Dose due: alert LED and buzzer on.
    fn start_alert(&mut self);

    /// Alert LED and buzzer off.
    fn stop_alert(&mut self);

    /// Dose taken.
    fn show_confirmed(&mut self);

    /// Every indicator off.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Notification port (driven adapter: domain → BLE peer)
// ───────────────────────────────────────────────────────────────

/// Pushes reminder and confirmation messages to the connected peer.
pub trait NotificationPort {
    fn notify(&mut self, kind: NotificationKind, sequence: u32, text: &str)
        -> Result<(), CommsError>;

    /// Whether a central is connected and subscribed.
    fn is_peer_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Confirmation port (driven adapter: domain → durable flag)
// ───────────────────────────────────────────────────────────────

/// Durable single-bit "last dose confirmed" flag.
///
/// Writes must survive power loss.  At-least-once delivery is acceptable.
pub trait ConfirmationPort {
    fn persist_confirmation(&mut self, confirmed: bool) -> Result<(), StorageError>;

    /// Read the stored flag.  `Ok(false)` when nothing was ever written.
    fn load_confirmation(&self) -> Result<bool, StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Uplink port (driven adapter: domain → network log server)
// ───────────────────────────────────────────────────────────────

/// A record bound for the log server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UplinkRecord {
    /// A dose was acknowledged.
    DoseConfirmed { timestamp_ms: u64 },
    /// Classified environment reading taken at confirmation.
    Environment {
        temperature: f32,
        humidity: f32,
        classification: EnvironmentClass,
        timestamp_ms: u64,
    },
}

/// Hands records to the uploader.  Must never block.
pub trait UplinkPort {
    fn submit(&mut self, record: UplinkRecord) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists reminder configuration.
///
/// Implementations MUST call [`ReminderConfig::validate`] before
/// persisting.  Invalid ranges are rejected with
/// [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ReminderConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ReminderConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ReminderConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic; no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
