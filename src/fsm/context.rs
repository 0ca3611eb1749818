//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the tick inputs, the [`DoseCycle`], the debouncer,
//! configuration, and the effect list the current tick is building.
//! Think of it as the "blackboard" in a blackboard architecture.

use crate::app::effects::{Effect, Effects, push_effect};
use crate::config::ReminderConfig;

use super::DosePhase;
use super::debounce::AckDebouncer;

// ---------------------------------------------------------------------------
// Dose cycle (owned by the state machine, read-only to everyone else)
// ---------------------------------------------------------------------------

/// One Waiting → Alerting → Confirmed progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseCycle {
    /// Mirror of the engine's current state.
    pub phase: DosePhase,
    /// Clock value when this cycle opened.
    pub cycle_start_ms: u64,
    /// Delay from cycle start until the alert fires.
    pub alert_delay_ms: u32,
    /// Last reminder send, `None` = nothing sent this alert.
    pub last_notification_ms: Option<u64>,
    /// Spacing between repeat reminders.
    pub notification_interval_ms: u32,
    /// Acknowledgment debounce window for this cycle.
    pub ack_debounce_ms: u32,
    /// Incremented on every notification, never reset.  Saturates.
    pub notify_sequence: u32,
}

impl DoseCycle {
    pub fn new(start_ms: u64, config: &ReminderConfig) -> Self {
        Self {
            phase: DosePhase::Waiting,
            cycle_start_ms: start_ms,
            alert_delay_ms: config.alert_delay_ms,
            last_notification_ms: None,
            notification_interval_ms: config.notification_interval_ms,
            ack_debounce_ms: config.ack_debounce_ms,
            notify_sequence: 0,
        }
    }

    /// Open a new cycle at `start_ms`.  The sequence keeps counting so
    /// messages stay unique across cycles.
    pub fn restart(&mut self, start_ms: u64, config: &ReminderConfig) {
        let sequence = self.notify_sequence;
        *self = Self::new(start_ms, config);
        self.notify_sequence = sequence;
    }

    /// Clock value at which the alert becomes due.
    pub fn due_at_ms(&self) -> u64 {
        self.cycle_start_ms + u64::from(self.alert_delay_ms)
    }

    /// Bump and return the notification sequence.  Sticks at `u32::MAX`
    /// rather than wrapping back below earlier messages.
    pub fn next_sequence(&mut self) -> u32 {
        self.notify_sequence = self.notify_sequence.saturating_add(1);
        self.notify_sequence
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Tick inputs --
    /// Monotonic clock for this tick (milliseconds).
    pub now_ms: u64,
    /// Raw acknowledgment input level.
    pub ack_pressed: bool,
    /// A wireless peer is connected.
    pub peer_connected: bool,

    // -- Domain state --
    pub cycle: DoseCycle,
    pub debouncer: AckDebouncer,

    // -- Outputs --
    /// Effects produced during the current tick, in order.
    pub effects: Effects,
    /// Set on confirmation; the service answers it with a sensor read.
    pub telemetry_requested: bool,

    // -- Configuration --
    pub config: ReminderConfig,
}

impl FsmContext {
    /// Create a context whose first cycle opens at `start_ms`.
    pub fn new(config: ReminderConfig, start_ms: u64) -> Self {
        Self {
            now_ms: start_ms,
            ack_pressed: false,
            peer_connected: false,
            cycle: DoseCycle::new(start_ms, &config),
            debouncer: AckDebouncer::new(),
            effects: Effects::new(),
            telemetry_requested: false,
            config,
        }
    }

    /// Latch this tick's inputs and clear last tick's outputs.
    pub fn begin_tick(&mut self, now_ms: u64, ack_pressed: bool, peer_connected: bool) {
        self.now_ms = now_ms;
        self.ack_pressed = ack_pressed;
        self.peer_connected = peer_connected;
        self.effects.clear();
        self.telemetry_requested = false;
    }

    /// Move the accumulated effects out.
    pub fn take_effects(&mut self) -> Effects {
        core::mem::take(&mut self.effects)
    }

    pub fn emit(&mut self, effect: Effect) {
        push_effect(&mut self.effects, effect);
    }

    /// Milliseconds since the cycle opened.
    pub fn elapsed_in_cycle_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.cycle.cycle_start_ms)
    }
}
