//! Fuzz target: stored config decoding
//!
//! Treats the input as an NVS blob, the way a corrupted flash page would
//! present it.  Anything that decodes must either validate or be rejected
//! by `validate()`; nothing may panic.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use medalert::config::ReminderConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(cfg) = postcard::from_bytes::<ReminderConfig>(data) {
        if cfg.validate().is_ok() {
            let bytes = postcard::to_allocvec(&cfg).expect("valid config must re-encode");
            let again: ReminderConfig = postcard::from_bytes(&bytes).expect("round trip");
            assert_eq!(again, cfg);
        }
    }
});
