//! Uplink inter-task communication.
//!
//! Uses an `embassy-sync` bounded channel to bridge the synchronous
//! control loop with the async uploader thread, an atomic link flag
//! published by the WiFi adapter, and a signal carrying a new server URL
//! after the configuration changes.
//!
//! ```text
//! ┌──────────────┐  UplinkMsg   ┌──────────────┐
//! │ Control Loop │────────────▶│ Uploader     │
//! │  (sync)      │             │  (async)     │
//! └──────────────┘             └──────────────┘
//!         ▲ NETWORK_UP (WiFi adapter)  │
//!         └────────────────────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use crate::app::ports::UplinkRecord;

/// One record bound for the log server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UplinkMsg {
    pub record: UplinkRecord,
    /// Wall-clock time of the record, `None` if the clock was not synced.
    pub unix_ms: Option<u64>,
}

/// Channel depth.  One confirmation produces two records.
pub const UPLINK_DEPTH: usize = 8;

/// Channel type shared by the queue adapter and the uploader.
pub type UplinkChannel = Channel<CriticalSectionRawMutex, UplinkMsg, UPLINK_DEPTH>;

/// Outbound records: control loop → uploader.
pub static UPLINK_CHANNEL: UplinkChannel = Channel::new();

static NETWORK_UP: AtomicBool = AtomicBool::new(false);

/// Publish the station link state.
pub fn set_network_up(up: bool) {
    NETWORK_UP.store(up, Ordering::Release);
}

/// Whether the station link is up.
pub fn network_up() -> bool {
    NETWORK_UP.load(Ordering::Acquire)
}

/// Log server base URL, as stored in the configuration.
pub type ServerUrl = heapless::String<64>;

/// Latest server URL not yet picked up by the uploader.
pub type UplinkTarget = Signal<CriticalSectionRawMutex, ServerUrl>;

/// Config → uploader.  Only the newest value is kept.
pub static UPLINK_TARGET: UplinkTarget = Signal::new();
