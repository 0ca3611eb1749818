//! Reminder scheduling.
//!
//! While a dose is overdue the state machine polls [`should_notify`] every
//! tick.  The notification channel has no delivery acknowledgment, so the
//! reminder repeats on a fixed interval until the dose is confirmed.
//!
//! ```text
//!   Alerting tick ──▶ should_notify(now, last, interval, peer)
//!                        │ true
//!                        ▼
//!                 seq += 1, reminder_text(seq), last = now
//! ```

use core::fmt::Write;

use crate::app::effects::NotificationText;

/// Decide whether a reminder is due.
///
/// True iff a peer is connected and either nothing has been sent yet this
/// alert (`last_ms == None`) or at least `interval_ms` has elapsed.
pub fn should_notify(now_ms: u64, last_ms: Option<u64>, interval_ms: u32, peer_connected: bool) -> bool {
    if !peer_connected {
        return false;
    }
    match last_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) >= u64::from(interval_ms),
    }
}

/// Repeat reminder text.  Carries the sequence number for client-side dedup.
pub fn reminder_text(sequence: u32) -> NotificationText {
    let mut text = NotificationText::new();
    // 64 bytes always fits the fixed text plus a u32.
    let _ = write!(text, "Time to take your medication (#{sequence})");
    text
}

/// Final notice sent on confirmation.
pub fn confirmed_text(sequence: u32) -> NotificationText {
    let mut text = NotificationText::new();
    let _ = write!(text, "Medication confirmed (#{sequence})");
    text
}
