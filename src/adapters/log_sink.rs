//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { emitted: 0 }
    }

    /// Number of events rendered so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started { phase, due_at_ms } => {
                info!("START | phase={:?} | due_at={}ms", phase, due_at_ms);
            }
            AppEvent::PhaseChanged { from, to, at_ms } => {
                info!("PHASE | {:?} -> {:?} | t={}ms", from, to, at_ms);
            }
            AppEvent::ReminderSent { sequence } => {
                info!("NOTIFY | reminder #{}", sequence);
            }
            AppEvent::Confirmed {
                at_ms,
                peer_notified,
            } => {
                info!(
                    "CONFIRM | t={}ms | peer={}",
                    at_ms,
                    if *peer_notified { "notified" } else { "absent" }
                );
            }
            AppEvent::TelemetryReady(t) => {
                info!(
                    "TELEM | T={:.1}\u{00b0}C | RH={:.1}% | status={} | t={}ms",
                    t.temperature, t.humidity, t.classification, t.timestamp_ms,
                );
            }
            AppEvent::TelemetrySkipped(e) => {
                warn!("TELEM | skipped: {}", e);
            }
            AppEvent::CycleReset {
                start_ms,
                due_at_ms,
            } => {
                info!("CYCLE | reset at {}ms | due_at={}ms", start_ms, due_at_ms);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::DosePhase;

    #[test]
    fn counts_every_event() {
        let mut sink = LogEventSink::new();
        sink.emit(&AppEvent::Started {
            phase: DosePhase::Waiting,
            due_at_ms: 10_000,
        });
        sink.emit(&AppEvent::ReminderSent { sequence: 1 });
        assert_eq!(sink.emitted(), 2);
    }
}
