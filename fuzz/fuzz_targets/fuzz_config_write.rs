//! Fuzz target: BLE config writes
//!
//! Feeds arbitrary bytes to the config characteristic decoder.  Whatever
//! it accepts must pass `validate()`.
//!
//! cargo fuzz run fuzz_config_write

#![no_main]

use libfuzzer_sys::fuzz_target;
use medalert::adapters::provisioning::decode_config_write;
use medalert::config::ReminderConfig;

fuzz_target!(|data: &[u8]| {
    let current = ReminderConfig::default();
    if let Ok(next) = decode_config_write(&current, data) {
        assert!(next.validate().is_ok());
        assert_eq!(next.buzzer_tone_hz, current.buzzer_tone_hz);
    }
});
