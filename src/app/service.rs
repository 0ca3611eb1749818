//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM and its context.  It exposes a clean,
//! hardware-agnostic API: every tick returns the [`Effects`] the outside
//! world should carry out, and the only port it calls directly is the
//! environment sensor at the confirmation instant.
//!
//! ```text
//!  TickInput ──────▶ ┌────────────────────────┐ ──▶ Effects
//! EnvironmentPort ──▶│       AppService       │ ──▶ EventSink
//!                    │  FSM · reminders · env │
//!                    └────────────────────────┘
//! ```
//!
//! Tick order is fixed: FSM update and transition, then the reminder poll,
//! then the telemetry effect.

use log::{info, warn};

use crate::config::ReminderConfig;
use crate::error::Result;
use crate::fsm::context::{DoseCycle, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{DosePhase, Fsm};

use super::commands::AppCommand;
use super::effects::{Effect, Effects, NotificationKind};
use super::events::{AppEvent, TelemetryData};
use super::ports::{ConfigPort, EnvironmentPort, EventSink};

/// Delay between a config change and its automatic write to NVS.
pub const AUTO_SAVE_DELAY_MS: u64 = 5_000;

/// Everything the host samples once per control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Monotonic clock (milliseconds since boot).
    pub now_ms: u64,
    /// Raw acknowledgment input level.
    pub ack_pressed: bool,
    /// A wireless peer is connected.
    pub peer_connected: bool,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    tick_count: u64,
    config_dirty: bool,
    dirty_since_ms: u64,
}

impl AppService {
    /// Construct the service and open the first cycle at `now_ms`.
    ///
    /// Invalid configuration is rejected here, never mid-cycle.
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: ReminderConfig, now_ms: u64) -> Result<Self> {
        config.validate()?;
        let ctx = FsmContext::new(config, now_ms);
        let fsm = Fsm::new(build_state_table(), DosePhase::Waiting);

        Ok(Self {
            fsm,
            ctx,
            tick_count: 0,
            config_dirty: false,
            dirty_since_ms: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial state entry.  Returns the startup effects.
    pub fn start(&mut self, sink: &mut impl EventSink) -> Effects {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started {
            phase: self.fsm.current_state(),
            due_at_ms: self.ctx.cycle.due_at_ms(),
        });
        info!("AppService started in {:?}", self.fsm.current_state());
        self.ctx.take_effects()
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle and return the effects it produced.
    ///
    /// `env` is read only when this tick confirms the dose.  A sensor
    /// failure skips the telemetry effect and nothing else.
    pub fn tick(
        &mut self,
        input: TickInput,
        env: &mut impl EnvironmentPort,
        sink: &mut impl EventSink,
    ) -> Effects {
        self.tick_count += 1;
        let prev = self.fsm.current_state();

        // 1. FSM: transition evaluation, then the reminder poll
        self.ctx
            .begin_tick(input.now_ms, input.ack_pressed, input.peer_connected);
        self.fsm.tick(&mut self.ctx);

        // 2. Environment snapshot, only on the confirming tick
        if self.ctx.telemetry_requested {
            self.capture_environment(env, sink);
        }

        // 3. Events
        let now = self.fsm.current_state();
        if now != prev {
            sink.emit(&AppEvent::PhaseChanged {
                from: prev,
                to: now,
                at_ms: input.now_ms,
            });
        }
        self.emit_effect_events(input.now_ms, sink);

        self.ctx.take_effects()
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  Returns any effects it produced.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) -> Effects {
        match cmd {
            AppCommand::StartCycle => {
                self.ctx.effects.clear();
                self.ctx.now_ms = now_ms;
                let prev = self.fsm.current_state();
                self.fsm.restart(&mut self.ctx);
                sink.emit(&AppEvent::CycleReset {
                    start_ms: now_ms,
                    due_at_ms: self.ctx.cycle.due_at_ms(),
                });
                if prev != DosePhase::Waiting {
                    info!("New dose cycle opened from {:?}", prev);
                }
                return self.ctx.take_effects();
            }
            AppCommand::UpdateConfig(new_config) => match new_config.validate() {
                Ok(()) => {
                    self.ctx.config = new_config;
                    self.mark_config_dirty(now_ms);
                    info!("Configuration updated at runtime (timing applies next cycle)");
                }
                Err(e) => warn!("Rejected config update: {}", e),
            },
            AppCommand::SaveConfig => {
                self.mark_config_dirty(now_ms);
                self.dirty_since_ms = now_ms.saturating_sub(AUTO_SAVE_DELAY_MS);
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
        Effects::new()
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current dose phase.
    pub fn phase(&self) -> DosePhase {
        self.fsm.current_state()
    }

    /// Read-only view of the running cycle.
    pub fn cycle(&self) -> &DoseCycle {
        &self.ctx.cycle
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Clone of the live configuration.
    pub fn current_config(&self) -> ReminderConfig {
        self.ctx.config.clone()
    }

    // ── Internal ──────────────────────────────────────────────

    fn capture_environment(&mut self, env: &mut impl EnvironmentPort, sink: &mut impl EventSink) {
        match env.read_environment() {
            Ok(reading) => {
                let data = TelemetryData {
                    temperature: reading.temperature(),
                    humidity: reading.humidity(),
                    classification: reading.classify(),
                    timestamp_ms: self.ctx.now_ms,
                };
                self.ctx.emit(Effect::UploadTelemetry {
                    temperature: data.temperature,
                    humidity: data.humidity,
                    classification: data.classification,
                    timestamp_ms: data.timestamp_ms,
                });
                sink.emit(&AppEvent::TelemetryReady(data));
            }
            Err(e) => {
                warn!("Environment read failed at confirmation: {}", e);
                sink.emit(&AppEvent::TelemetrySkipped(e));
            }
        }
    }

    fn emit_effect_events(&self, now_ms: u64, sink: &mut impl EventSink) {
        for effect in &self.ctx.effects {
            match effect {
                Effect::SendNotification {
                    sequence,
                    kind: NotificationKind::Reminder,
                    ..
                } => sink.emit(&AppEvent::ReminderSent {
                    sequence: *sequence,
                }),
                Effect::PersistConfirmation(true) => {
                    let peer_notified = self.ctx.effects.iter().any(|e| {
                        matches!(
                            e,
                            Effect::SendNotification {
                                kind: NotificationKind::Confirmed,
                                ..
                            }
                        )
                    });
                    sink.emit(&AppEvent::Confirmed {
                        at_ms: now_ms,
                        peer_notified,
                    });
                }
                _ => {}
            }
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    fn mark_config_dirty(&mut self, now_ms: u64) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = now_ms;
        }
    }

    /// Save the config once it has been stable for [`AUTO_SAVE_DELAY_MS`].
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        if now_ms.saturating_sub(self.dirty_since_ms) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(&self.ctx.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
