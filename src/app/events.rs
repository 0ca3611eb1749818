//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, count them in tests,
//! etc.

use crate::error::SensorError;
use crate::fsm::DosePhase;
use crate::sensors::EnvironmentClass;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial phase and when
    /// the first alert is due).
    Started { phase: DosePhase, due_at_ms: u64 },

    /// The dose phase moved forward.
    PhaseChanged {
        from: DosePhase,
        to: DosePhase,
        at_ms: u64,
    },

    /// A repeat reminder was queued for the peer.
    ReminderSent { sequence: u32 },

    /// The dose was acknowledged.
    Confirmed { at_ms: u64, peer_notified: bool },

    /// Environment reading taken at confirmation.
    TelemetryReady(TelemetryData),

    /// The sensor could not be read at confirmation; no upload.
    TelemetrySkipped(SensorError),

    /// A new cycle was opened.
    CycleReset { start_ms: u64, due_at_ms: u64 },
}

/// Classified reading suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub temperature: f32,
    pub humidity: f32,
    pub classification: EnvironmentClass,
    pub timestamp_ms: u64,
}
