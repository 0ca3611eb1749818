//! On/off pattern engine for the alert LED and buzzer.
//!
//! The main loop calls `tick()` each control cycle and writes the returned
//! level to the alert outputs.  Patterns are monochrome: the engine only
//! decides *when* the output is on.
//!
//! | Pattern      | Description                      | Rate   |
//! |-------------|----------------------------------|--------|
//! | Off          | Always off                       | -      |
//! | Solid        | Always on                        | -      |
//! | Blink        | On/off square wave               | 2 Hz   |
//! | DoubleBlink  | Two quick flashes, then pause    | 1 Hz   |

/// Pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    Off,
    Solid,
    Blink,
    DoubleBlink,
}

impl From<crate::config::AlertPattern> for PatternId {
    fn from(p: crate::config::AlertPattern) -> Self {
        match p {
            crate::config::AlertPattern::Solid => Self::Solid,
            crate::config::AlertPattern::Blink => Self::Blink,
        }
    }
}

const BLINK_PERIOD_MS: u32 = 500;

/// Pattern engine. Stack-allocated, no heap.
pub struct LedPatternEngine {
    phase_ms: u32,
    pattern: PatternId,
}

impl Default for LedPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedPatternEngine {
    pub fn new() -> Self {
        Self {
            phase_ms: 0,
            pattern: PatternId::Off,
        }
    }

    /// Select a pattern.  Changing pattern restarts its phase so a new
    /// alert always begins "on".
    pub fn set_pattern(&mut self, pattern: PatternId) {
        if pattern != self.pattern {
            self.pattern = pattern;
            self.phase_ms = 0;
        }
    }

    pub fn pattern(&self) -> PatternId {
        self.pattern
    }

    /// Current output level without advancing.
    pub fn level(&self) -> bool {
        match self.pattern {
            PatternId::Off => false,
            PatternId::Solid => true,
            PatternId::Blink => (self.phase_ms % BLINK_PERIOD_MS) < BLINK_PERIOD_MS / 2,
            PatternId::DoubleBlink => {
                let cycle = self.phase_ms % 1000;
                cycle < 100 || (200..300).contains(&cycle)
            }
        }
    }

    /// Advance the pattern phase and return the output level.
    /// `delta_ms` is the time since the last call.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        self.level()
    }
}
