//! Unified error types for the MedAlert firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot path's error handling uniform. All variants are `Copy` so they can
//! be passed through the control loop without allocation.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The environment sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer the start pulse or a bit timed out.
    Timeout,
    /// The five-byte frame failed its checksum.
    ChecksumMismatch,
    /// A decoded value was not a number.
    NotANumber,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// GPIO access on the data line failed.
    BusFault,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor timed out"),
            Self::ChecksumMismatch => write!(f, "frame checksum mismatch"),
            Self::NotANumber => write!(f, "reading is not a number"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::BusFault => write!(f, "data line fault"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    BleInitFailed,
    /// No BLE central is subscribed.
    PeerNotConnected,
    /// The notification payload did not fit the characteristic.
    PayloadTooLarge,
    WifiConnectFailed,
    /// Uplink is disabled in configuration.
    UplinkDisabled,
    /// The upload queue is full; the record was dropped.
    UplinkQueueFull,
    /// HTTP request failed (ESP-IDF error code or HTTP status).
    HttpFailed(i32),
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BleInitFailed => write!(f, "BLE init failed"),
            Self::PeerNotConnected => write!(f, "no BLE peer connected"),
            Self::PayloadTooLarge => write!(f, "notification payload too large"),
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::UplinkDisabled => write!(f, "uplink disabled"),
            Self::UplinkQueueFull => write!(f, "uplink queue full"),
            Self::HttpFailed(code) => write!(f, "HTTP request failed ({code})"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
