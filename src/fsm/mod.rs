//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌───────────┬──────────┬──────────┬───────────────────┬────────┐│
//! │  │ DosePhase │ on_enter │ on_exit  │ on_update         │on_poll ││
//! │  ├───────────┼──────────┼──────────┼───────────────────┼────────┤│
//! │  │ Waiting   │ fn(ctx)  │    -     │ fn(ctx)->Option<> │   -    ││
//! │  │ Alerting  │ fn(ctx)  │ fn(ctx)  │ fn(ctx)->Option<> │fn(ctx) ││
//! │  │ Confirmed │ fn(ctx)  │    -     │ fn(ctx)->Option<> │   -    ││
//! │  └───────────┴──────────┴──────────┴───────────────────┴────────┘│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  Only then does it run `on_poll` for whichever state
//! is now current, so a recurring action never fires for a state the
//! tick has just left.  All functions receive `&mut FsmContext`.
//!
//! Phases only move forward within a cycle.  [`Fsm::restart`] is the one
//! way back to `Waiting`.

pub mod context;
pub mod debounce;
pub mod states;

use context::FsmContext;
use log::{info, warn};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Lifecycle stage of the current dose.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DosePhase {
    Waiting = 0,
    Alerting = 1,
    Confirmed = 2,
}

impl DosePhase {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `DosePhase`.  Out-of-range indices assert in
    /// debug builds and map to `Waiting` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Waiting,
            1 => Self::Alerting,
            2 => Self::Confirmed,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Waiting
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter`, `on_exit` and `on_poll` actions.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<DosePhase>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: DosePhase,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
    /// Recurring action, run after transition evaluation.
    pub on_poll: Option<StateActionFn>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `DosePhase as usize`.
    table: [StateDescriptor; DosePhase::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Clock value when the current state was entered.
    state_entry_ms: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; DosePhase::COUNT], initial: DosePhase) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entry_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.state_entry_ms = ctx.now_ms;
        ctx.cycle.phase = self.current_state();
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    /// 3. Call `on_poll` for the (possibly new) current state.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }

        if let Some(poll) = self.table[self.current].on_poll {
            poll(ctx);
        }
    }

    /// Open a new cycle at `ctx.now_ms` and re-enter `Waiting`.
    ///
    /// Runs the current state's `on_exit` first, so restarting mid-alert
    /// still silences the alert indicator.
    pub fn restart(&mut self, ctx: &mut FsmContext) {
        info!(
            "FSM restart: {} -> {}",
            self.table[self.current].name,
            self.table[DosePhase::Waiting as usize].name
        );
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }
        let now = ctx.now_ms;
        ctx.cycle.restart(now, &ctx.config);
        ctx.debouncer.reset(ctx.ack_pressed);
        self.current = DosePhase::Waiting as usize;
        self.state_entry_ms = now;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> DosePhase {
        DosePhase::from_index(self.current)
    }

    /// Milliseconds spent in the current state as of `now_ms`.
    pub fn time_in_current_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_entry_ms)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: DosePhase, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        if next_idx <= self.current {
            warn!(
                "FSM refused backward transition: {} -> {}",
                self.table[self.current].name, self.table[next_idx].name
            );
            return;
        }

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_ms = ctx.now_ms;
        ctx.cycle.phase = next_id;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
