//! Fuzz target: `decode_frame`
//!
//! Feeds arbitrary five-byte frames through both sensor models and checks
//! that every accepted frame carries a valid checksum and an in-range,
//! classifiable reading.
//!
//! cargo fuzz run fuzz_dht_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use medalert::config::DhtModel;
use medalert::sensors::dht::{FRAME_LEN, Frame, decode_frame};

fuzz_target!(|data: &[u8]| {
    let Some(chunk) = data.get(..FRAME_LEN) else {
        return;
    };
    let mut frame: Frame = [0; FRAME_LEN];
    frame.copy_from_slice(chunk);

    for model in [DhtModel::Dht11, DhtModel::Dht22] {
        if let Ok(reading) = decode_frame(&frame, model) {
            let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
            assert_eq!(sum, frame[4], "accepted a frame with a bad checksum");
            assert!(reading.temperature().is_finite());
            assert!((0.0..=100.0).contains(&reading.humidity()));
            let _ = reading.classify();
        }
    }
});
