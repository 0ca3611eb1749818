//! Integration tests for the AppService → FSM → effects → ports pipeline.
//!
//! Every tick is routed through the real [`EffectRouter`] into recording
//! mocks, so these tests see exactly what the hardware would see.

use super::mock_hw::{
    IndicatorCall, LogSink, MockEnvironment, MockHardware, MockNotifier, MockNvs, MockUplink,
};

use medalert::app::commands::AppCommand;
use medalert::app::effects::{Effect, EffectRouter, Effects, NotificationKind};
use medalert::app::events::AppEvent;
use medalert::app::ports::UplinkRecord;
use medalert::app::service::{AUTO_SAVE_DELAY_MS, AppService, TickInput};
use medalert::config::{AlertPattern, ReminderConfig};
use medalert::drivers::button::AckButton;
use medalert::error::SensorError;
use medalert::fsm::DosePhase;
use medalert::sensors::EnvironmentClass;

pub struct Rig {
    pub app: AppService,
    pub hw: MockHardware,
    pub ble: MockNotifier,
    pub nvs: MockNvs,
    pub uplink: MockUplink,
    pub env: MockEnvironment,
    pub sink: LogSink,
}

impl Rig {
    pub fn new(config: ReminderConfig) -> Self {
        let mut rig = Self {
            app: AppService::new(config, 0).unwrap(),
            hw: MockHardware::new(),
            ble: MockNotifier::new(false),
            nvs: MockNvs::new(),
            uplink: MockUplink::new(true),
            env: MockEnvironment::new(22.0, 45.0),
            sink: LogSink::new(),
        };
        let effects = rig.app.start(&mut rig.sink);
        rig.route(&effects);
        rig
    }

    pub fn tick(&mut self, now_ms: u64, ack_pressed: bool) -> Effects {
        let input = TickInput {
            now_ms,
            ack_pressed,
            peer_connected: self.ble.connected,
        };
        let effects = self.app.tick(input, &mut self.env, &mut self.sink);
        self.route(&effects);
        effects
    }

    pub fn command(&mut self, cmd: AppCommand, now_ms: u64) -> Effects {
        let effects = self.app.handle_command(cmd, now_ms, &mut self.sink);
        self.route(&effects);
        effects
    }

    fn route(&mut self, effects: &[Effect]) {
        EffectRouter {
            indicators: &mut self.hw,
            notifier: &mut self.ble,
            store: &mut self.nvs,
            uplink: &mut self.uplink,
        }
        .apply(effects);
    }

    /// Tick from `from_ms` to `to_ms` inclusive in `step_ms` increments.
    pub fn run(&mut self, from_ms: u64, to_ms: u64, step_ms: u64, ack_pressed: bool) {
        let mut t = from_ms;
        while t <= to_ms {
            self.tick(t, ack_pressed);
            t += step_ms;
        }
    }

    /// One control-loop step driven by the physical button, routed the
    /// way the firmware loop does it: a long press while confirmed opens a
    /// new cycle, and the confirming press re-arms the button.
    pub fn button_tick(&mut self, button: &mut AckButton, now_ms: u64, level: bool) -> Effects {
        let sample = button.update(now_ms, level, 0);
        let before = self.app.phase();
        let effects = if sample.long_press && before == DosePhase::Confirmed {
            self.command(AppCommand::StartCycle, now_ms)
        } else {
            self.tick(now_ms, sample.pressed)
        };
        if before != DosePhase::Confirmed && self.app.phase() == DosePhase::Confirmed {
            button.rearm();
        }
        effects
    }

    /// Drive a clean press (edge plus held past the debounce window).
    pub fn acknowledge(&mut self, at_ms: u64) {
        let window = u64::from(self.app.current_config().ack_debounce_ms);
        self.tick(at_ms, true);
        self.tick(at_ms + window, true);
        self.tick(at_ms + window + 50, false);
    }
}

fn rig() -> Rig {
    Rig::new(ReminderConfig::default())
}

// ── Startup ──────────────────────────────────────────────────

#[test]
fn start_lights_waiting_indicator() {
    let r = rig();
    assert_eq!(r.app.phase(), DosePhase::Waiting);
    assert_eq!(r.hw.calls, vec![IndicatorCall::ShowWaiting]);
    assert!(matches!(
        r.sink.events.first(),
        Some(AppEvent::Started {
            phase: DosePhase::Waiting,
            due_at_ms: 10_000
        })
    ));
}

#[test]
fn invalid_config_is_refused_at_construction() {
    let cfg = ReminderConfig {
        notification_interval_ms: 10,
        ..ReminderConfig::default()
    };
    assert!(AppService::new(cfg, 0).is_err());
}

// ── Alert onset ──────────────────────────────────────────────

#[test]
fn alert_starts_once_at_deadline() {
    let mut r = rig();
    r.run(0, 9_950, 50, false);
    assert_eq!(r.app.phase(), DosePhase::Waiting);
    assert_eq!(r.hw.count(IndicatorCall::StartAlert), 0);

    r.run(10_000, 20_000, 50, false);
    assert_eq!(r.app.phase(), DosePhase::Alerting);
    assert_eq!(r.hw.count(IndicatorCall::StartAlert), 1);
    assert!(r.hw.alerting());
}

#[test]
fn early_press_is_ignored() {
    let mut r = rig();
    r.tick(1_000, true);
    r.tick(2_000, true);
    r.tick(3_000, false);
    assert_eq!(r.app.phase(), DosePhase::Waiting);
    assert!(r.nvs.confirmation_writes.is_empty());
}

// ── Reminders ────────────────────────────────────────────────

#[test]
fn reminders_repeat_while_peer_connected() {
    let mut r = rig();
    r.ble.connected = true;
    r.run(0, 25_000, 50, false);

    // Due at 10 000, then every 5 000 ms: 10k, 15k, 20k, 25k.
    assert_eq!(r.ble.sequences(), vec![1, 2, 3, 4]);
    assert!(
        r.ble
            .sent
            .iter()
            .all(|(kind, _, _)| *kind == NotificationKind::Reminder)
    );
    let reminders = r
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::ReminderSent { .. }))
        .count();
    assert_eq!(reminders, 4);
}

#[test]
fn no_reminders_without_peer() {
    let mut r = rig();
    r.run(0, 30_000, 100, false);
    assert!(r.ble.sent.is_empty());
    assert_eq!(r.app.cycle().notify_sequence, 0);
}

#[test]
fn late_peer_gets_immediate_reminder() {
    let mut r = rig();
    r.run(0, 12_000, 100, false);
    assert!(r.ble.sent.is_empty());
    r.ble.connected = true;
    r.tick(12_100, false);
    assert_eq!(r.ble.sequences(), vec![1]);
}

// ── Confirmation ─────────────────────────────────────────────

#[test]
fn confirmation_fans_out_to_every_port() {
    let mut r = rig();
    r.ble.connected = true;
    r.run(0, 12_000, 100, false);
    r.acknowledge(12_100);

    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert!(!r.hw.alerting());
    assert_eq!(r.hw.calls.last(), Some(&IndicatorCall::ShowConfirmed));
    assert_eq!(r.nvs.confirmation_writes, vec![true]);

    let (kind, _, text) = r.ble.sent.last().unwrap();
    assert_eq!(*kind, NotificationKind::Confirmed);
    assert!(text.contains("confirmed"));

    assert_eq!(r.uplink.records.len(), 2);
    assert_eq!(
        r.uplink.records[0],
        UplinkRecord::DoseConfirmed {
            timestamp_ms: 12_300
        }
    );
    match r.uplink.records[1] {
        UplinkRecord::Environment {
            classification,
            timestamp_ms,
            ..
        } => {
            assert_eq!(classification, EnvironmentClass::Optimal);
            assert_eq!(timestamp_ms, 12_300);
        }
        other => panic!("expected environment record, got {:?}", other),
    }
    assert_eq!(r.env.reads, 1);
}

#[test]
fn held_button_confirms_exactly_once() {
    let mut r = rig();
    r.run(0, 10_000, 100, false);
    r.run(10_100, 20_000, 100, true);
    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert_eq!(r.nvs.confirmation_writes, vec![true]);
    assert_eq!(r.hw.count(IndicatorCall::ShowConfirmed), 1);
    assert_eq!(r.env.reads, 1);
}

#[test]
fn confirmation_without_peer_skips_final_notice() {
    let mut r = rig();
    r.run(0, 10_000, 100, false);
    r.acknowledge(10_500);
    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert!(r.ble.sent.is_empty());
    assert!(r.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::Confirmed {
            peer_notified: false,
            ..
        }
    )));
}

#[test]
fn sensor_failure_only_drops_telemetry() {
    let mut r = rig();
    r.env = MockEnvironment::failing(SensorError::Timeout);
    r.run(0, 10_000, 100, false);
    r.acknowledge(10_500);

    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert_eq!(r.nvs.confirmation_writes, vec![true]);
    assert_eq!(
        r.uplink.records,
        vec![UplinkRecord::DoseConfirmed {
            timestamp_ms: 10_700
        }]
    );
    assert!(
        r.sink
            .events
            .contains(&AppEvent::TelemetrySkipped(SensorError::Timeout))
    );
}

#[test]
fn collaborator_failures_do_not_stall_confirmation() {
    let mut r = rig();
    r.nvs.fail_writes = true;
    r.uplink.enabled = false;
    r.run(0, 10_000, 100, false);
    r.acknowledge(10_200);
    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert!(r.nvs.confirmation_writes.is_empty());
    assert!(r.uplink.records.is_empty());
    assert_eq!(r.hw.calls.last(), Some(&IndicatorCall::ShowConfirmed));
}

// ── New cycle ────────────────────────────────────────────────

#[test]
fn start_cycle_reopens_waiting() {
    let mut r = rig();
    r.ble.connected = true;
    r.run(0, 10_000, 100, false);
    r.acknowledge(10_100);
    let last_seq = r.app.cycle().notify_sequence;

    let effects = r.command(AppCommand::StartCycle, 60_000);
    assert_eq!(effects.as_slice(), &[Effect::ActivateWaitingIndicator]);
    assert_eq!(r.app.phase(), DosePhase::Waiting);
    assert_eq!(r.app.cycle().due_at_ms(), 70_000);

    r.run(60_100, 70_000, 100, false);
    assert_eq!(r.app.phase(), DosePhase::Alerting);
    // The sequence keeps counting across cycles.
    assert_eq!(r.ble.sequences().last().copied(), Some(last_seq + 1));
}

#[test]
fn holding_the_confirming_press_keeps_cycle_closed() {
    let mut r = rig();
    let mut button = AckButton::new(33);
    for t in (0..10_500).step_by(50) {
        r.button_tick(&mut button, t, false);
    }
    assert_eq!(r.app.phase(), DosePhase::Alerting);

    // Pressed at 10.5 s and never let go.
    for t in (10_500..30_000).step_by(50) {
        r.button_tick(&mut button, t, true);
    }
    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert!(
        !r.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::CycleReset { .. }))
    );

    // Release, then a deliberate 5 s hold opens the next cycle.
    r.button_tick(&mut button, 30_000, false);
    for t in (30_050..=35_050).step_by(50) {
        r.button_tick(&mut button, t, true);
    }
    assert_eq!(r.app.phase(), DosePhase::Waiting);
    assert_eq!(r.app.cycle().cycle_start_ms, 35_050);
}

#[test]
fn start_cycle_mid_alert_silences_indicator() {
    let mut r = rig();
    r.run(0, 10_000, 100, false);
    assert!(r.hw.alerting());
    r.command(AppCommand::StartCycle, 11_000);
    assert!(!r.hw.alerting());
    assert_eq!(r.app.phase(), DosePhase::Waiting);
}

// ── Configuration ────────────────────────────────────────────

#[test]
fn update_config_applies_next_cycle() {
    let mut r = rig();
    let cfg = ReminderConfig {
        alert_delay_ms: 30_000,
        alert_pattern: AlertPattern::Solid,
        ..ReminderConfig::default()
    };
    r.command(AppCommand::UpdateConfig(cfg), 1_000);
    assert!(r.app.is_config_dirty());

    // The running cycle keeps its 10 s delay.
    r.run(1_000, 10_000, 100, false);
    assert_eq!(r.app.phase(), DosePhase::Alerting);

    r.command(AppCommand::StartCycle, 20_000);
    assert_eq!(r.app.cycle().due_at_ms(), 50_000);
}

#[test]
fn invalid_update_is_rejected() {
    let mut r = rig();
    let cfg = ReminderConfig {
        ack_debounce_ms: 0,
        ..ReminderConfig::default()
    };
    r.command(AppCommand::UpdateConfig(cfg), 1_000);
    assert!(!r.app.is_config_dirty());
    assert_eq!(r.app.current_config(), ReminderConfig::default());
}

#[test]
fn auto_save_waits_for_quiet_period() {
    let mut r = rig();
    let cfg = ReminderConfig {
        notification_interval_ms: 2_000,
        ..ReminderConfig::default()
    };
    r.command(AppCommand::UpdateConfig(cfg.clone()), 1_000);

    assert!(!r.app.auto_save_if_needed(1_000 + AUTO_SAVE_DELAY_MS - 1, &r.nvs));
    assert!(r.app.auto_save_if_needed(1_000 + AUTO_SAVE_DELAY_MS, &r.nvs));
    assert!(!r.app.is_config_dirty());
    assert_eq!(r.nvs.saved.borrow().last(), Some(&cfg));
}

#[test]
fn save_config_flushes_on_next_check() {
    let mut r = rig();
    r.command(AppCommand::SaveConfig, 8_000);
    assert!(r.app.auto_save_if_needed(8_000, &r.nvs));
    assert_eq!(r.nvs.saved.borrow().len(), 1);
}

#[test]
fn failed_save_stays_dirty() {
    let mut r = rig();
    r.nvs.fail_writes = true;
    r.command(AppCommand::SaveConfig, 8_000);
    assert!(!r.app.auto_save_if_needed(8_000, &r.nvs));
    assert!(r.app.is_config_dirty());
}
