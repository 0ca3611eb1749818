//! Side-effect requests returned by the dose state machine.
//!
//! The core never touches hardware, radio, flash or network.  Every tick
//! returns a short list of [`Effect`]s in the order they were produced;
//! [`EffectRouter`] hands them to the driven ports.  Collaborator errors are
//! logged here and go no further, so a dead radio or a full flash can never
//! stall a transition.

use log::{debug, warn};

use crate::sensors::EnvironmentClass;

use super::ports::{
    ConfirmationPort, IndicatorPort, NotificationPort, UplinkPort, UplinkRecord,
};

/// Upper bound on effects produced by one tick.
///
/// The busiest tick (confirmation) produces six.
pub const MAX_EFFECTS_PER_TICK: usize = 8;

/// Effect list returned by `start` / `tick`.
pub type Effects = heapless::Vec<Effect, MAX_EFFECTS_PER_TICK>;

/// Message text carried by [`Effect::SendNotification`].
pub type NotificationText = heapless::String<64>;

/// What a notification is about.  Rendered into the BLE payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Reminder,
    Confirmed,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Confirmed => "confirmed",
        }
    }
}

/// A request for the outside world, produced by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Cycle opened: waiting indicator on.
    ActivateWaitingIndicator,
    /// Dose due: alert indicator and tone on.
    ActivateAlertIndicator,
    /// Alert indicator and tone off.
    DeactivateAlertIndicator,
    /// Dose taken: confirmed indicator on.
    ActivateConfirmedIndicator,
    /// Push a message to the wireless peer.
    SendNotification {
        text: NotificationText,
        sequence: u32,
        kind: NotificationKind,
    },
    /// Write the durable "last dose confirmed" flag.
    PersistConfirmation(bool),
    /// Log the confirmation with the remote server.
    ReportDoseConfirmed { timestamp_ms: u64 },
    /// Upload the environment reading taken at confirmation.
    UploadTelemetry {
        temperature: f32,
        humidity: f32,
        classification: EnvironmentClass,
        timestamp_ms: u64,
    },
}

/// Push onto an effect list, logging instead of panicking on overflow.
pub(crate) fn push_effect(effects: &mut Effects, effect: Effect) {
    if let Err(dropped) = effects.push(effect) {
        warn!("effect list full, dropping {:?}", dropped);
    }
}

/// Routes [`Effect`]s to the driven ports.
///
/// Borrowing the adapters for the duration of one dispatch keeps the
/// router free of ownership; the main loop builds one per tick.
pub struct EffectRouter<'a, I, N, C, U>
where
    I: IndicatorPort,
    N: NotificationPort,
    C: ConfirmationPort,
    U: UplinkPort,
{
    pub indicators: &'a mut I,
    pub notifier: &'a mut N,
    pub store: &'a mut C,
    pub uplink: &'a mut U,
}

impl<I, N, C, U> EffectRouter<'_, I, N, C, U>
where
    I: IndicatorPort,
    N: NotificationPort,
    C: ConfirmationPort,
    U: UplinkPort,
{
    /// Apply every effect in order.
    pub fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            self.apply_one(effect);
        }
    }

    fn apply_one(&mut self, effect: &Effect) {
        match effect {
            Effect::ActivateWaitingIndicator => self.indicators.show_waiting(),
            Effect::ActivateAlertIndicator => self.indicators.start_alert(),
            Effect::DeactivateAlertIndicator => self.indicators.stop_alert(),
            Effect::ActivateConfirmedIndicator => self.indicators.show_confirmed(),
            Effect::SendNotification {
                text,
                sequence,
                kind,
            } => {
                if let Err(e) = self.notifier.notify(*kind, *sequence, text) {
                    warn!("notification #{} not delivered: {}", sequence, e);
                }
            }
            Effect::PersistConfirmation(flag) => {
                if let Err(e) = self.store.persist_confirmation(*flag) {
                    warn!("confirmation flag not persisted: {}", e);
                }
            }
            Effect::ReportDoseConfirmed { timestamp_ms } => {
                let record = UplinkRecord::DoseConfirmed {
                    timestamp_ms: *timestamp_ms,
                };
                self.submit(record);
            }
            Effect::UploadTelemetry {
                temperature,
                humidity,
                classification,
                timestamp_ms,
            } => {
                let record = UplinkRecord::Environment {
                    temperature: *temperature,
                    humidity: *humidity,
                    classification: *classification,
                    timestamp_ms: *timestamp_ms,
                };
                self.submit(record);
            }
        }
    }

    fn submit(&mut self, record: UplinkRecord) {
        match self.uplink.submit(record) {
            Ok(()) => debug!("uplink queued: {:?}", record),
            Err(e) => warn!("uplink dropped {:?}: {}", record, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::StorageError;
    use crate::error::CommsError;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        notified: Vec<(NotificationKind, u32, String)>,
        persisted: Vec<bool>,
        records: Vec<UplinkRecord>,
        fail_all: bool,
    }

    impl IndicatorPort for Recorder {
        fn show_waiting(&mut self) {
            self.calls.push("waiting");
        }
        fn start_alert(&mut self) {
            self.calls.push("start_alert");
        }
        fn stop_alert(&mut self) {
            self.calls.push("stop_alert");
        }
        fn show_confirmed(&mut self) {
            self.calls.push("confirmed");
        }
        fn all_off(&mut self) {
            self.calls.push("off");
        }
    }

    impl NotificationPort for Recorder {
        fn notify(
            &mut self,
            kind: NotificationKind,
            sequence: u32,
            text: &str,
        ) -> Result<(), CommsError> {
            if self.fail_all {
                return Err(CommsError::PeerNotConnected);
            }
            self.notified.push((kind, sequence, text.to_string()));
            Ok(())
        }
        fn is_peer_connected(&self) -> bool {
            !self.fail_all
        }
    }

    impl ConfirmationPort for Recorder {
        fn persist_confirmation(&mut self, confirmed: bool) -> Result<(), StorageError> {
            if self.fail_all {
                return Err(StorageError::IoError);
            }
            self.persisted.push(confirmed);
            Ok(())
        }
        fn load_confirmation(&self) -> Result<bool, StorageError> {
            Ok(self.persisted.last().copied().unwrap_or(false))
        }
    }

    impl UplinkPort for Recorder {
        fn submit(&mut self, record: UplinkRecord) -> Result<(), CommsError> {
            if self.fail_all {
                return Err(CommsError::UplinkQueueFull);
            }
            self.records.push(record);
            Ok(())
        }
    }

    fn text(s: &str) -> NotificationText {
        let mut t = NotificationText::new();
        t.push_str(s).unwrap();
        t
    }

    fn confirm_effects() -> Vec<Effect> {
        vec![
            Effect::DeactivateAlertIndicator,
            Effect::ActivateConfirmedIndicator,
            Effect::PersistConfirmation(true),
            Effect::SendNotification {
                text: text("done"),
                sequence: 3,
                kind: NotificationKind::Confirmed,
            },
            Effect::ReportDoseConfirmed { timestamp_ms: 15_300 },
            Effect::UploadTelemetry {
                temperature: 22.0,
                humidity: 45.0,
                classification: EnvironmentClass::Optimal,
                timestamp_ms: 15_300,
            },
        ]
    }

    #[test]
    fn routes_each_effect_to_its_port() {
        // One recorder per port so borrows stay disjoint.
        let mut ind = Recorder::default();
        let mut ble = Recorder::default();
        let mut nvs = Recorder::default();
        let mut net = Recorder::default();
        EffectRouter {
            indicators: &mut ind,
            notifier: &mut ble,
            store: &mut nvs,
            uplink: &mut net,
        }
        .apply(&confirm_effects());

        assert_eq!(ind.calls, vec!["stop_alert", "confirmed"]);
        assert_eq!(
            ble.notified,
            vec![(NotificationKind::Confirmed, 3, "done".to_string())]
        );
        assert_eq!(nvs.persisted, vec![true]);
        assert_eq!(net.records.len(), 2);
        assert!(matches!(
            net.records[1],
            UplinkRecord::Environment {
                classification: EnvironmentClass::Optimal,
                ..
            }
        ));
    }

    #[test]
    fn collaborator_failures_do_not_stop_dispatch() {
        let mut ind = Recorder::default();
        let mut ble = Recorder {
            fail_all: true,
            ..Default::default()
        };
        let mut nvs = Recorder {
            fail_all: true,
            ..Default::default()
        };
        let mut net = Recorder {
            fail_all: true,
            ..Default::default()
        };
        EffectRouter {
            indicators: &mut ind,
            notifier: &mut ble,
            store: &mut nvs,
            uplink: &mut net,
        }
        .apply(&confirm_effects());

        // Indicators after the failing effects still ran.
        assert_eq!(ind.calls, vec!["stop_alert", "confirmed"]);
    }

    #[test]
    fn push_effect_drops_on_overflow() {
        let mut effects = Effects::new();
        for _ in 0..MAX_EFFECTS_PER_TICK + 2 {
            push_effect(&mut effects, Effect::ActivateAlertIndicator);
        }
        assert_eq!(effects.len(), MAX_EFFECTS_PER_TICK);
    }
}
