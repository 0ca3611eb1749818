//! Acknowledgment button driver with ISR tap latch and long-press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with internal pull-up on
//! [`ACK_BUTTON_GPIO`](crate::pins::ACK_BUTTON_GPIO). The GPIO fires on
//! falling edge; the ISR records the press timestamp into an atomic so a
//! tap shorter than one control tick still reaches the main loop.
//!
//! ## Output
//!
//! | Field        | Meaning                                          |
//! |--------------|--------------------------------------------------|
//! | `pressed`    | Line held low now, or a new tap was latched      |
//! | `long_press` | One-shot, after the line has been held for 5 s   |
//!
//! A press that acknowledged a dose never turns into a long press: the
//! main loop calls [`AckButton::rearm`] on the confirming tick, and the
//! hold has to be released before the next one counts.
//!
//! Debouncing of `pressed` is the state machine's job, not this driver's.

use core::sync::atomic::{AtomicU32, Ordering};

/// Hold time that turns a press into a long press.
pub const LONG_PRESS_MS: u64 = 5000;

/// Raw ISR timestamp (milliseconds since boot, truncated to u32; 0 = never).
/// Written by the ISR, read by the main loop.
static BUTTON_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

/// One control-tick view of the button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSample {
    pub pressed: bool,
    pub long_press: bool,
}

pub struct AckButton {
    gpio: i32,
    last_isr_ms: u32,
    held_since_ms: Option<u64>,
    long_fired: bool,
}

impl AckButton {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            // A press latched before the driver existed does not count.
            last_isr_ms: BUTTON_ISR_TIMESTAMP.load(Ordering::Acquire),
            held_since_ms: None,
            long_fired: false,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Call from the main loop at each control tick.
    pub fn sample(&mut self, now_ms: u64) -> ButtonSample {
        let isr_ms = BUTTON_ISR_TIMESTAMP.load(Ordering::Acquire);
        let level_pressed = self.is_pressed_hw();
        self.update(now_ms, level_pressed, isr_ms)
    }

    /// Forget the current hold.  Until the line is released, no long
    /// press is reported.
    pub fn rearm(&mut self) {
        self.held_since_ms = None;
        self.long_fired = true;
    }

    /// Pure gesture step: `level_pressed` is the debounced-by-nothing line
    /// level, `isr_ms` the latest ISR latch.
    pub fn update(&mut self, now_ms: u64, level_pressed: bool, isr_ms: u32) -> ButtonSample {
        let new_tap = isr_ms != 0 && isr_ms != self.last_isr_ms;
        if new_tap {
            self.last_isr_ms = isr_ms;
        }

        let mut long_press = false;
        if level_pressed {
            let since = *self.held_since_ms.get_or_insert(now_ms);
            if !self.long_fired && now_ms.saturating_sub(since) >= LONG_PRESS_MS {
                self.long_fired = true;
                long_press = true;
            }
        } else {
            self.held_since_ms = None;
            self.long_fired = false;
        }

        ButtonSample {
            pressed: level_pressed || new_tap,
            long_press,
        }
    }

    /// Active low.
    fn is_pressed_hw(&self) -> bool {
        !crate::drivers::hw_init::gpio_read(self.gpio)
    }
}

/// ISR handler, registered on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomic store).
pub fn button_isr_handler(now_ms: u32) {
    // 0 is the "never" marker.
    BUTTON_ISR_TIMESTAMP.store(now_ms.max(1), Ordering::Release);
}
