//! Acknowledgment debouncer.
//!
//! The first rising edge of the ack input is latched.  Once the debounce
//! window has elapsed since that edge the acknowledgment is consumed,
//! exactly once.  Further edges inside the window are contact bounce and
//! are ignored.  After consumption nothing fires until [`AckDebouncer::reset`].

/// Edge-latching debouncer for the acknowledgment input.
#[derive(Debug, Clone, Copy, Default)]
pub struct AckDebouncer {
    /// Input level seen on the previous sample.
    last_level: bool,
    /// Time of the first edge still waiting out the window.
    edge_at_ms: Option<u64>,
    /// Acknowledgment already handed out.
    consumed: bool,
}

impl AckDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-arm.  `current_level` is the input level right now, so a button
    /// already held down does not count as a fresh edge.
    pub fn reset(&mut self, current_level: bool) {
        self.last_level = current_level;
        self.edge_at_ms = None;
        self.consumed = false;
    }

    /// Feed one sample.  Returns `true` exactly once per arm, on the first
    /// sample at least `window_ms` after the first detected edge.
    pub fn update(&mut self, pressed: bool, now_ms: u64, window_ms: u32) -> bool {
        let rising = pressed && !self.last_level;
        self.last_level = pressed;

        if self.consumed {
            return false;
        }

        if rising && self.edge_at_ms.is_none() {
            self.edge_at_ms = Some(now_ms);
        }

        match self.edge_at_ms {
            Some(edge) if now_ms.saturating_sub(edge) >= u64::from(window_ms) => {
                self.consumed = true;
                self.edge_at_ms = None;
                true
            }
            _ => false,
        }
    }

    /// An edge has been seen and is waiting out the window.
    pub fn is_pending(&self) -> bool {
        self.edge_at_ms.is_some()
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}
