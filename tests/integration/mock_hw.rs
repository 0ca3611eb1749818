//! Mock adapters for integration tests.
//!
//! Every port records its calls so tests can assert on the full history
//! without touching GPIO, the radio or flash.

use std::cell::RefCell;

use medalert::app::effects::NotificationKind;
use medalert::app::events::AppEvent;
use medalert::app::ports::{
    ConfigError, ConfigPort, ConfirmationPort, EnvironmentPort, EventSink, IndicatorPort,
    NotificationPort, StorageError, UplinkPort, UplinkRecord,
};
use medalert::config::ReminderConfig;
use medalert::error::{CommsError, SensorError};
use medalert::sensors::EnvironmentReading;

// ── Indicator call record ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorCall {
    ShowWaiting,
    StartAlert,
    StopAlert,
    ShowConfirmed,
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<IndicatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    pub fn count(&self, call: IndicatorCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    pub fn alerting(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                IndicatorCall::StartAlert => Some(true),
                IndicatorCall::StopAlert | IndicatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorPort for MockHardware {
    fn show_waiting(&mut self) {
        self.calls.push(IndicatorCall::ShowWaiting);
    }

    fn start_alert(&mut self) {
        self.calls.push(IndicatorCall::StartAlert);
    }

    fn stop_alert(&mut self) {
        self.calls.push(IndicatorCall::StopAlert);
    }

    fn show_confirmed(&mut self) {
        self.calls.push(IndicatorCall::ShowConfirmed);
    }

    fn all_off(&mut self) {
        self.calls.push(IndicatorCall::AllOff);
    }
}

// ── MockNotifier ──────────────────────────────────────────────

pub struct MockNotifier {
    pub connected: bool,
    pub sent: Vec<(NotificationKind, u32, String)>,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn new(connected: bool) -> Self {
        Self {
            connected,
            sent: Vec::new(),
        }
    }

    pub fn sequences(&self) -> Vec<u32> {
        self.sent.iter().map(|(_, seq, _)| *seq).collect()
    }
}

impl NotificationPort for MockNotifier {
    fn notify(
        &mut self,
        kind: NotificationKind,
        sequence: u32,
        text: &str,
    ) -> Result<(), CommsError> {
        if !self.connected {
            return Err(CommsError::PeerNotConnected);
        }
        self.sent.push((kind, sequence, text.to_owned()));
        Ok(())
    }

    fn is_peer_connected(&self) -> bool {
        self.connected
    }
}

// ── MockNvs ───────────────────────────────────────────────────

pub struct MockNvs {
    pub confirmation_writes: Vec<bool>,
    pub saved: RefCell<Vec<ReminderConfig>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self {
            confirmation_writes: Vec::new(),
            saved: RefCell::new(Vec::new()),
            fail_writes: false,
        }
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationPort for MockNvs {
    fn persist_confirmation(&mut self, confirmed: bool) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Full);
        }
        self.confirmation_writes.push(confirmed);
        Ok(())
    }

    fn load_confirmation(&self) -> Result<bool, StorageError> {
        Ok(self.confirmation_writes.last().copied().unwrap_or(false))
    }
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<ReminderConfig, ConfigError> {
        Ok(self.saved.borrow().last().cloned().unwrap_or_default())
    }

    fn save(&self, config: &ReminderConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.fail_writes {
            return Err(ConfigError::StorageFull);
        }
        self.saved.borrow_mut().push(config.clone());
        Ok(())
    }
}

// ── MockUplink ────────────────────────────────────────────────

pub struct MockUplink {
    pub enabled: bool,
    pub records: Vec<UplinkRecord>,
}

#[allow(dead_code)]
impl MockUplink {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            records: Vec::new(),
        }
    }
}

impl UplinkPort for MockUplink {
    fn submit(&mut self, record: UplinkRecord) -> Result<(), CommsError> {
        if !self.enabled {
            return Err(CommsError::UplinkDisabled);
        }
        self.records.push(record);
        Ok(())
    }
}

// ── MockEnvironment ───────────────────────────────────────────

pub struct MockEnvironment {
    pub reading: Result<(f32, f32), SensorError>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockEnvironment {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            reading: Ok((temperature, humidity)),
            reads: 0,
        }
    }

    pub fn failing(err: SensorError) -> Self {
        Self {
            reading: Err(err),
            reads: 0,
        }
    }
}

impl EnvironmentPort for MockEnvironment {
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.reads += 1;
        let (t, h) = self.reading?;
        EnvironmentReading::new(t, h)
    }
}

// ── LogSink ───────────────────────────────────────────────────

pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
