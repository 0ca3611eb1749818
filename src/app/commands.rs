//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (the ack
//! button's long press, a config write over BLE) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::ReminderConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Open a new dose cycle starting now.
    StartCycle,

    /// Hot-reload configuration.  Validated first; cycle timing takes
    /// effect from the next cycle.
    UpdateConfig(ReminderConfig),

    /// Persist the current config to NVS on the next auto-save check.
    SaveConfig,
}
