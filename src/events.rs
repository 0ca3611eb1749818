//! Cross-task event queue.
//!
//! Events are produced by:
//! - the Bluedroid GATTS callback (peer connect / disconnect)
//! - the WiFi adapter (link up / down)
//!
//! and consumed by the main control loop, which drains the queue once per
//! tick before sampling inputs.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GATTS cb     │────▶│              │     │              │
//! │ WiFi adapter │────▶│ EVENT_CHANNEL│────▶│  Main Loop   │
//! │              │     │  (bounded)   │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Maximum number of pending events.
const EVENT_QUEUE_CAP: usize = 16;

/// System events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // ── Wireless notification channel ─────────────────────
    /// A BLE central connected.
    PeerConnected,
    /// The BLE central went away; advertising has been restarted.
    PeerDisconnected,

    // ── Network uplink ────────────────────────────────────
    /// WiFi station associated and got an address.
    NetworkUp,
    /// WiFi station lost its link.
    NetworkDown,
}

type EventChannel = Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP>;

static EVENT_CHANNEL: EventChannel = Channel::new();

/// Push an event into the queue.
/// Never blocks; returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    push_to(&EVENT_CHANNEL, event)
}

/// Drain all pending events into a callback, in FIFO order.
pub fn drain_events(handler: impl FnMut(Event)) {
    drain_from(&EVENT_CHANNEL, handler);
}

fn push_to(channel: &EventChannel, event: Event) -> bool {
    channel.try_send(event).is_ok()
}

fn drain_from(channel: &EventChannel, mut handler: impl FnMut(Event)) {
    while let Ok(event) = channel.try_receive() {
        handler(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global queue is shared with adapter tests running in parallel,
    // so queue semantics are checked on a private channel.
    #[test]
    fn fifo_order() {
        let ch: EventChannel = Channel::new();
        assert!(push_to(&ch, Event::PeerConnected));
        assert!(push_to(&ch, Event::NetworkUp));
        assert_eq!(ch.len(), 2);

        let mut seen = Vec::new();
        drain_from(&ch, |e| seen.push(e));
        assert_eq!(seen, vec![Event::PeerConnected, Event::NetworkUp]);
        assert!(ch.is_empty());
    }

    #[test]
    fn overflow_drops_newest() {
        let ch: EventChannel = Channel::new();
        for _ in 0..EVENT_QUEUE_CAP {
            assert!(push_to(&ch, Event::PeerDisconnected));
        }
        assert!(!push_to(&ch, Event::NetworkDown));
        let mut seen = Vec::new();
        drain_from(&ch, |e| seen.push(e));
        assert!(!seen.contains(&Event::NetworkDown));
    }
}
