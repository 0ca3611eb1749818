//! End-to-end walk through one dose cycle, checking the effect list of
//! every tick that matters.

use super::app_service_tests::Rig;
use super::mock_hw::IndicatorCall;

use medalert::app::effects::{Effect, NotificationKind};
use medalert::app::events::AppEvent;
use medalert::config::ReminderConfig;
use medalert::fsm::DosePhase;

#[test]
fn reference_scenario() {
    let cfg = ReminderConfig {
        alert_delay_ms: 10_000,
        notification_interval_ms: 5_000,
        ack_debounce_ms: 200,
        ..ReminderConfig::default()
    };
    let mut r = Rig::new(cfg);

    // t=0: nothing happens.
    assert!(r.tick(0, false).is_empty());
    assert_eq!(r.app.phase(), DosePhase::Waiting);

    // t=10000: due, no peer yet.
    let fx = r.tick(10_000, false);
    assert_eq!(fx.as_slice(), &[Effect::ActivateAlertIndicator]);
    assert_eq!(r.app.phase(), DosePhase::Alerting);

    // t=15000: peer arrives, first reminder.
    r.ble.connected = true;
    let fx = r.tick(15_000, false);
    assert_eq!(fx.len(), 1);
    assert!(matches!(
        &fx[0],
        Effect::SendNotification {
            sequence: 1,
            kind: NotificationKind::Reminder,
            ..
        }
    ));

    // t=15100: press edge, still inside the debounce window.
    assert!(r.tick(15_100, true).is_empty());
    assert_eq!(r.app.phase(), DosePhase::Alerting);

    // t=15300: still held, window elapsed.
    let fx = r.tick(15_300, true);
    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert_eq!(fx[0], Effect::DeactivateAlertIndicator);
    assert_eq!(fx[1], Effect::ActivateConfirmedIndicator);
    assert_eq!(fx[2], Effect::PersistConfirmation(true));
    assert!(matches!(
        &fx[3],
        Effect::SendNotification {
            sequence: 2,
            kind: NotificationKind::Confirmed,
            ..
        }
    ));
    assert_eq!(
        fx[4],
        Effect::ReportDoseConfirmed {
            timestamp_ms: 15_300
        }
    );
    assert!(matches!(fx[5], Effect::UploadTelemetry { .. }));
    assert_eq!(fx.len(), 6);

    // Afterwards the cycle is settled no matter what the inputs do.
    for t in (15_400..40_000).step_by(100) {
        assert!(r.tick(t, t % 200 == 0).is_empty());
    }
    assert_eq!(r.nvs.confirmation_writes, vec![true]);
    assert_eq!(
        r.hw.calls,
        vec![
            IndicatorCall::ShowWaiting,
            IndicatorCall::StartAlert,
            IndicatorCall::StopAlert,
            IndicatorCall::ShowConfirmed,
        ]
    );

    let phases: Vec<_> = r
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::PhaseChanged { to, at_ms, .. } => Some((*to, *at_ms)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![(DosePhase::Alerting, 10_000), (DosePhase::Confirmed, 15_300)]
    );
}

#[test]
fn bounce_inside_window_is_one_press() {
    let mut r = Rig::new(ReminderConfig::default());
    r.tick(10_000, false);

    // Contact chatter: the first edge opens the window, the rest are noise.
    r.tick(10_050, true);
    r.tick(10_060, false);
    r.tick(10_070, true);
    r.tick(10_080, false);
    assert_eq!(r.app.phase(), DosePhase::Alerting);

    // Window measured from the first edge; the level no longer matters.
    r.tick(10_250, false);
    assert_eq!(r.app.phase(), DosePhase::Confirmed);
    assert_eq!(r.nvs.confirmation_writes, vec![true]);
}

#[test]
fn press_held_through_onset_needs_release() {
    let mut r = Rig::new(ReminderConfig::default());
    r.run(9_000, 12_000, 100, true);
    assert_eq!(r.app.phase(), DosePhase::Alerting);

    r.tick(12_100, false);
    r.tick(12_200, true);
    r.tick(12_400, true);
    assert_eq!(r.app.phase(), DosePhase::Confirmed);
}

#[test]
fn zero_delay_alerts_on_first_tick() {
    let cfg = ReminderConfig {
        alert_delay_ms: 0,
        ..ReminderConfig::default()
    };
    let mut r = Rig::new(cfg);
    let fx = r.tick(0, false);
    assert_eq!(fx.as_slice(), &[Effect::ActivateAlertIndicator]);
}
