//! Queue-backed uplink adapter.
//!
//! Implements [`UplinkPort`] by stamping each record with wall-clock time
//! and handing it to the uploader thread through a bounded channel.  It
//! never blocks the control loop: a disabled uplink, a down link, or a
//! full queue all drop the record and report why.

use log::debug;

use crate::app::ports::{UplinkPort, UplinkRecord};
use crate::error::CommsError;
use crate::uplink::channels::{UplinkChannel, UplinkMsg};

use super::time::Esp32TimeAdapter;

pub struct QueuedUplink<'a> {
    channel: &'a UplinkChannel,
    clock: Esp32TimeAdapter,
    enabled: bool,
    link_up: fn() -> bool,
    dropped: u32,
}

impl<'a> QueuedUplink<'a> {
    pub fn new(
        channel: &'a UplinkChannel,
        clock: Esp32TimeAdapter,
        enabled: bool,
        link_up: fn() -> bool,
    ) -> Self {
        Self {
            channel,
            clock,
            enabled,
            link_up,
            dropped: 0,
        }
    }

    /// Follow a config change.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records refused since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn record_time(record: &UplinkRecord) -> u64 {
        match record {
            UplinkRecord::DoseConfirmed { timestamp_ms }
            | UplinkRecord::Environment { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

impl UplinkPort for QueuedUplink<'_> {
    fn submit(&mut self, record: UplinkRecord) -> Result<(), CommsError> {
        let result = if !self.enabled {
            Err(CommsError::UplinkDisabled)
        } else if !(self.link_up)() {
            Err(CommsError::WifiConnectFailed)
        } else {
            let msg = UplinkMsg {
                record,
                unix_ms: self.clock.to_unix_ms(Self::record_time(&record)),
            };
            self.channel
                .try_send(msg)
                .map_err(|_| CommsError::UplinkQueueFull)
        };

        match result {
            Ok(()) => debug!("uplink: queued ({} pending)", self.channel.len()),
            Err(_) => self.dropped = self.dropped.wrapping_add(1),
        }
        result
    }
}
