//! Fuzz target: `build_url`
//!
//! Splits the input into a base URL and a device id and builds both
//! request kinds.  Successful builds must stay within the fixed buffer and
//! contain nothing that needs escaping.
//!
//! cargo fuzz run fuzz_query_builder

#![no_main]

use libfuzzer_sys::fuzz_target;
use medalert::app::ports::UplinkRecord;
use medalert::sensors::classify;
use medalert::uplink::query::{MAX_URL_LEN, build_url};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let (base, device) = text.split_once('\n').unwrap_or((text, "MR-000000"));
    let t = data.first().map_or(20.0, |b| f32::from(*b) - 40.0);
    let h = data.last().map_or(50.0, |b| f32::from(*b % 101));
    let unix_ms = (data.len() as u64).checked_mul(1_000_000_007);

    let records = [
        UplinkRecord::DoseConfirmed { timestamp_ms: 0 },
        UplinkRecord::Environment {
            temperature: t,
            humidity: h,
            classification: classify(t, h),
            timestamp_ms: 0,
        },
    ];
    for record in &records {
        if let Ok(url) = build_url(base, device, record, unix_ms) {
            assert!(url.len() <= MAX_URL_LEN);
            let query = url.split_once('?').map_or("", |(_, q)| q);
            assert!(query.is_ascii(), "query must be percent-encoded");
            assert!(!query.contains(' '));
        }
    }
});
