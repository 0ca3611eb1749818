//! Hardware adapter: bridges the indicator drivers to [`IndicatorPort`].
//!
//! Owns the three indicator LEDs, the buzzer and the pattern engine that
//! animates the alert.  The main loop calls [`HardwareIndicators::advance`]
//! once per tick so a blinking alert keeps blinking between effects.  On
//! non-espidf targets the underlying drivers write to simulated GPIO.

use log::info;

use crate::app::ports::IndicatorPort;
use crate::config::AlertPattern;
use crate::drivers::indicator::{Buzzer, IndicatorLed};
use crate::drivers::led_patterns::{LedPatternEngine, PatternId};
use crate::pins;

/// Concrete adapter that combines every indicator behind [`IndicatorPort`].
pub struct HardwareIndicators {
    waiting: IndicatorLed,
    alert: IndicatorLed,
    confirmed: IndicatorLed,
    buzzer: Buzzer,
    engine: LedPatternEngine,
    alert_pattern: PatternId,
    alerting: bool,
}

impl HardwareIndicators {
    pub fn new(alert_pattern: AlertPattern) -> Self {
        Self {
            waiting: IndicatorLed::new(pins::LED_WAITING_GPIO, "waiting"),
            alert: IndicatorLed::new(pins::LED_ALERT_GPIO, "alert"),
            confirmed: IndicatorLed::new(pins::LED_CONFIRMED_GPIO, "confirmed"),
            buzzer: Buzzer::new(),
            engine: LedPatternEngine::new(),
            alert_pattern: alert_pattern.into(),
            alerting: false,
        }
    }

    /// Follow a config change.  An alert in progress switches immediately.
    pub fn set_alert_pattern(&mut self, pattern: AlertPattern) {
        self.alert_pattern = pattern.into();
        if self.alerting {
            self.engine.set_pattern(self.alert_pattern);
            self.drive_alert(self.engine.level());
        }
    }

    /// Advance the alert animation by `delta_ms`.
    pub fn advance(&mut self, delta_ms: u32) {
        if self.alerting {
            let level = self.engine.tick(delta_ms);
            self.drive_alert(level);
        }
    }

    pub fn is_alerting(&self) -> bool {
        self.alerting
    }

    pub fn waiting_on(&self) -> bool {
        self.waiting.is_on()
    }

    pub fn alert_on(&self) -> bool {
        self.alert.is_on()
    }

    pub fn confirmed_on(&self) -> bool {
        self.confirmed.is_on()
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer.is_on()
    }

    fn drive_alert(&mut self, level: bool) {
        self.alert.set(level);
        self.buzzer.set(level);
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl IndicatorPort for HardwareIndicators {
    fn show_waiting(&mut self) {
        self.stop_alert();
        self.confirmed.set(false);
        self.waiting.set(true);
    }

    fn start_alert(&mut self) {
        info!("indicators: alert on ({:?})", self.alert_pattern);
        self.waiting.set(false);
        self.alerting = true;
        self.engine.set_pattern(self.alert_pattern);
        self.drive_alert(self.engine.level());
    }

    fn stop_alert(&mut self) {
        self.alerting = false;
        self.engine.set_pattern(PatternId::Off);
        self.drive_alert(false);
    }

    fn show_confirmed(&mut self) {
        self.waiting.set(false);
        self.confirmed.set(true);
    }

    fn all_off(&mut self) {
        self.stop_alert();
        self.waiting.set(false);
        self.confirmed.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_lights_only_red() {
        let mut hw = HardwareIndicators::new(AlertPattern::Solid);
        hw.show_waiting();
        assert!(hw.waiting_on());
        assert!(!hw.alert_on());
        assert!(!hw.confirmed_on());
        assert!(!hw.buzzer_on());
    }

    #[test]
    fn solid_alert_holds_led_and_buzzer() {
        let mut hw = HardwareIndicators::new(AlertPattern::Solid);
        hw.show_waiting();
        hw.start_alert();
        assert!(!hw.waiting_on());
        for _ in 0..10 {
            hw.advance(100);
            assert!(hw.alert_on());
            assert!(hw.buzzer_on());
        }
    }

    #[test]
    fn blink_alert_toggles() {
        let mut hw = HardwareIndicators::new(AlertPattern::Blink);
        hw.start_alert();
        assert!(hw.alert_on());
        hw.advance(300);
        assert!(!hw.alert_on());
        assert!(!hw.buzzer_on());
        hw.advance(200);
        assert!(hw.alert_on());
    }

    #[test]
    fn confirmation_sequence() {
        let mut hw = HardwareIndicators::new(AlertPattern::Blink);
        hw.show_waiting();
        hw.start_alert();
        hw.stop_alert();
        hw.show_confirmed();
        assert!(!hw.is_alerting());
        assert!(!hw.alert_on());
        assert!(!hw.buzzer_on());
        assert!(hw.confirmed_on());
        // Advancing after the alert ended must not relight it.
        hw.advance(500);
        assert!(!hw.alert_on());
    }

    #[test]
    fn pattern_change_applies_to_running_alert() {
        let mut hw = HardwareIndicators::new(AlertPattern::Blink);
        hw.start_alert();
        hw.advance(300);
        assert!(!hw.alert_on());
        hw.set_alert_pattern(AlertPattern::Solid);
        assert!(hw.alert_on());
    }

    #[test]
    fn all_off_clears_everything() {
        let mut hw = HardwareIndicators::new(AlertPattern::Solid);
        hw.show_waiting();
        hw.start_alert();
        hw.show_confirmed();
        hw.all_off();
        assert!(!hw.waiting_on() && !hw.alert_on() && !hw.confirmed_on() && !hw.buzzer_on());
    }
}
