//! Indicator and input drivers, hardware initialisation, and task helpers.

pub mod button;
pub mod hw_init;
pub mod indicator;
pub mod led_patterns;
pub mod task_pin;
pub mod watchdog;
