//! Discrete indicator LED and piezo buzzer drivers.
//!
//! Both track their commanded state locally so callers (and tests) can ask
//! `is_on()` without reading back a register.

use log::debug;

use super::hw_init;

/// One active-high indicator LED.
pub struct IndicatorLed {
    gpio: i32,
    name: &'static str,
    on: bool,
}

impl IndicatorLed {
    /// Create the driver and force the output low.
    pub fn new(gpio: i32, name: &'static str) -> Self {
        hw_init::gpio_write(gpio, false);
        Self {
            gpio,
            name,
            on: false,
        }
    }

    pub fn set(&mut self, on: bool) {
        if on != self.on {
            debug!("LED {}: {}", self.name, if on { "on" } else { "off" });
        }
        hw_init::gpio_write(self.gpio, on);
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}

/// LEDC-driven passive buzzer.  The tone is fixed by the LEDC timer
/// configured in [`hw_init::init_peripherals`]; this driver gates it.
pub struct Buzzer {
    on: bool,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buzzer {
    pub fn new() -> Self {
        hw_init::buzzer_set(false);
        Self { on: false }
    }

    pub fn set(&mut self, on: bool) {
        if on != self.on {
            hw_init::buzzer_set(on);
            self.on = on;
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
