//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  WAITING ──[now - start >= delay]──▶ ALERTING ──[debounced ack]──▶ CONFIRMED
//!                                        │  ▲
//!                                        └──┘ poll: repeat reminder
//!                                             every interval while a
//!                                             peer is connected
//! ```
//!
//! CONFIRMED is terminal for the cycle; only `Fsm::restart` leaves it.

use super::context::FsmContext;
use super::{DosePhase, StateDescriptor};
use crate::app::effects::{Effect, NotificationKind};
use crate::scheduler;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; DosePhase::COUNT] {
    [
        // Index 0: Waiting
        StateDescriptor {
            id: DosePhase::Waiting,
            name: "Waiting",
            on_enter: Some(waiting_enter),
            on_exit: None,
            on_update: waiting_update,
            on_poll: None,
        },
        // Index 1: Alerting
        StateDescriptor {
            id: DosePhase::Alerting,
            name: "Alerting",
            on_enter: Some(alerting_enter),
            on_exit: Some(alerting_exit),
            on_update: alerting_update,
            on_poll: Some(alerting_poll),
        },
        // Index 2: Confirmed
        StateDescriptor {
            id: DosePhase::Confirmed,
            name: "Confirmed",
            on_enter: Some(confirmed_enter),
            on_exit: None,
            on_update: confirmed_update,
            on_poll: None,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAITING state
// ═══════════════════════════════════════════════════════════════════════════

fn waiting_enter(ctx: &mut FsmContext) {
    info!(
        "Waiting: alert due at {} ms ({} ms from now)",
        ctx.cycle.due_at_ms(),
        ctx.cycle.alert_delay_ms
    );
    ctx.emit(Effect::ActivateWaitingIndicator);
}

fn waiting_update(ctx: &mut FsmContext) -> Option<DosePhase> {
    // A press while waiting is premature and deliberately not looked at.
    if ctx.elapsed_in_cycle_ms() >= u64::from(ctx.cycle.alert_delay_ms) {
        return Some(DosePhase::Alerting);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALERTING state
// ═══════════════════════════════════════════════════════════════════════════

fn alerting_enter(ctx: &mut FsmContext) {
    info!("Alerting: dose due, awaiting acknowledgment");
    ctx.cycle.last_notification_ms = None;
    // A button held since before the alert is not an acknowledgment.
    ctx.debouncer.reset(ctx.ack_pressed);
    ctx.emit(Effect::ActivateAlertIndicator);
}

fn alerting_exit(ctx: &mut FsmContext) {
    ctx.emit(Effect::DeactivateAlertIndicator);
}

fn alerting_update(ctx: &mut FsmContext) -> Option<DosePhase> {
    let window = ctx.cycle.ack_debounce_ms;
    if ctx.debouncer.update(ctx.ack_pressed, ctx.now_ms, window) {
        return Some(DosePhase::Confirmed);
    }
    None
}

fn alerting_poll(ctx: &mut FsmContext) {
    let due = scheduler::should_notify(
        ctx.now_ms,
        ctx.cycle.last_notification_ms,
        ctx.cycle.notification_interval_ms,
        ctx.peer_connected,
    );
    if !due {
        return;
    }

    let sequence = ctx.cycle.next_sequence();
    debug!("Alerting: reminder #{}", sequence);
    ctx.emit(Effect::SendNotification {
        text: scheduler::reminder_text(sequence),
        sequence,
        kind: NotificationKind::Reminder,
    });
    ctx.cycle.last_notification_ms = Some(ctx.now_ms);
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONFIRMED state
// ═══════════════════════════════════════════════════════════════════════════

fn confirmed_enter(ctx: &mut FsmContext) {
    info!(
        "Confirmed: dose acknowledged {} ms after it was due",
        ctx.now_ms.saturating_sub(ctx.cycle.due_at_ms())
    );
    ctx.emit(Effect::ActivateConfirmedIndicator);
    ctx.emit(Effect::PersistConfirmation(true));

    if ctx.peer_connected {
        let sequence = ctx.cycle.next_sequence();
        ctx.emit(Effect::SendNotification {
            text: scheduler::confirmed_text(sequence),
            sequence,
            kind: NotificationKind::Confirmed,
        });
    }

    ctx.emit(Effect::ReportDoseConfirmed {
        timestamp_ms: ctx.now_ms,
    });
    ctx.telemetry_requested = true;
}

fn confirmed_update(_ctx: &mut FsmContext) -> Option<DosePhase> {
    None
}
