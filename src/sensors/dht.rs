//! DHT11 / DHT22 single-wire humidity and temperature sensor.
//!
//! The sensor answers a host start pulse with a 40-bit frame:
//!
//! ```text
//!   [ RH hi ][ RH lo ][ T hi ][ T lo ][ checksum ]
//! ```
//!
//! The checksum is the low byte of the sum of the first four bytes.  The
//! DHT11 reports integral values in the high bytes and tenths in the low
//! bytes; the DHT22 reports big-endian tenths with bit 15 of the
//! temperature word as the sign.
//!
//! ## Layering
//!
//! [`decode_frame`] is pure and carries all validation.  [`DhtSensor`]
//! only does the bit-banging, generic over `embedded-hal` 1.0 pins and
//! delay so it runs on an ESP-IDF `PinDriver` or a test double alike.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::app::ports::EnvironmentPort;
use crate::config::DhtModel;
use crate::error::SensorError;

use super::environment::EnvironmentReading;

/// Frame length in bytes, checksum included.
pub const FRAME_LEN: usize = 5;

/// Raw frame as clocked off the wire.
pub type Frame = [u8; FRAME_LEN];

// Plausibility bounds shared by both models (DHT22 datasheet limits).
const TEMP_MIN_C: f32 = -40.0;
const TEMP_MAX_C: f32 = 80.0;
const HUMIDITY_MAX: f32 = 100.0;

// Wire timing (microseconds unless noted).
const DHT11_START_LOW_MS: u32 = 20;
const DHT22_START_LOW_MS: u32 = 2;
const RESPONSE_TIMEOUT_US: u32 = 100;
const BIT_TIMEOUT_US: u32 = 100;
/// A "0" bit holds the line high for ~27 µs, a "1" for ~70 µs.
const BIT_SAMPLE_US: u32 = 35;

/// Validate a raw frame and convert it into a reading.
pub fn decode_frame(frame: &Frame, model: DhtModel) -> Result<EnvironmentReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let (temperature, humidity) = match model {
        DhtModel::Dht11 => {
            let humidity = frame[0] as f32 + frame[1] as f32 * 0.1;
            let magnitude = frame[2] as f32 + (frame[3] & 0x7F) as f32 * 0.1;
            let temperature = if frame[3] & 0x80 != 0 { -magnitude } else { magnitude };
            (temperature, humidity)
        }
        DhtModel::Dht22 => {
            let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
            let raw = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]) as f32 / 10.0;
            let temperature = if frame[2] & 0x80 != 0 { -raw } else { raw };
            (temperature, humidity)
        }
    };

    if !(TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature)
        || !(0.0..=HUMIDITY_MAX).contains(&humidity)
    {
        return Err(SensorError::OutOfRange);
    }

    EnvironmentReading::new(temperature, humidity)
}

/// Bit-banged DHT driver.
///
/// `P` must be an open-drain pin with an external (or internal) pull-up:
/// driving it high releases the line.
pub struct DhtSensor<P, D> {
    pin: P,
    delay: D,
    model: DhtModel,
}

impl<P, D> DhtSensor<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(mut pin: P, delay: D, model: DhtModel) -> Self {
        // Idle high; a failure here surfaces as BusFault on the first read.
        let _ = pin.set_high();
        Self { pin, delay, model }
    }

    pub fn model(&self) -> DhtModel {
        self.model
    }

    /// Run one start/response/transfer sequence and decode the frame.
    pub fn read(&mut self) -> Result<EnvironmentReading, SensorError> {
        let frame = self.read_frame()?;
        debug!("DHT: frame {:02X?}", frame);
        decode_frame(&frame, self.model)
    }

    fn read_frame(&mut self) -> Result<Frame, SensorError> {
        let start_low_ms = match self.model {
            DhtModel::Dht11 => DHT11_START_LOW_MS,
            DhtModel::Dht22 => DHT22_START_LOW_MS,
        };

        self.pin.set_low().map_err(|_| SensorError::BusFault)?;
        self.delay.delay_ms(start_low_ms);
        self.pin.set_high().map_err(|_| SensorError::BusFault)?;

        // Sensor pulls low ~80 µs, then high ~80 µs, then starts the frame.
        self.wait_while(true, RESPONSE_TIMEOUT_US)?;
        self.wait_while(false, RESPONSE_TIMEOUT_US)?;
        self.wait_while(true, RESPONSE_TIMEOUT_US)?;

        let mut frame = [0u8; FRAME_LEN];
        for byte in frame.iter_mut() {
            for _ in 0..8 {
                // ~50 µs low preamble, then the high pulse that encodes the bit.
                self.wait_while(false, BIT_TIMEOUT_US)?;
                self.delay.delay_us(BIT_SAMPLE_US);
                let bit = self.is_high()?;
                *byte = (*byte << 1) | bit as u8;
                if bit {
                    self.wait_while(true, BIT_TIMEOUT_US)?;
                }
            }
        }
        Ok(frame)
    }

    /// Spin while the line sits at `level`; `Timeout` after `timeout_us`.
    fn wait_while(&mut self, level: bool, timeout_us: u32) -> Result<(), SensorError> {
        let mut waited = 0;
        while self.is_high()? == level {
            if waited >= timeout_us {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
            waited += 1;
        }
        Ok(())
    }

    fn is_high(&mut self) -> Result<bool, SensorError> {
        self.pin.is_high().map_err(|_| SensorError::BusFault)
    }
}

impl<P, D> EnvironmentPort for DhtSensor<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read_environment(&mut self) -> Result<EnvironmentReading, SensorError> {
        self.read().inspect_err(|e| warn!("DHT read failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(bytes: [u8; 4]) -> Frame {
        let sum = bytes.iter().fold(0u8, |a, b| a.wrapping_add(*b));
        [bytes[0], bytes[1], bytes[2], bytes[3], sum]
    }

    #[test]
    fn dht22_positive_reading() {
        // 65.2 %RH, 35.1 C
        let frame = with_checksum([0x02, 0x8C, 0x01, 0x5F]);
        let r = decode_frame(&frame, DhtModel::Dht22).unwrap();
        assert!((r.humidity() - 65.2).abs() < 0.01);
        assert!((r.temperature() - 35.1).abs() < 0.01);
    }

    #[test]
    fn dht22_negative_temperature() {
        // -10.1 C
        let frame = with_checksum([0x01, 0xF4, 0x80, 0x65]);
        let r = decode_frame(&frame, DhtModel::Dht22).unwrap();
        assert!((r.temperature() + 10.1).abs() < 0.01);
        assert!((r.humidity() - 50.0).abs() < 0.01);
    }

    #[test]
    fn dht11_integral_reading() {
        let frame = with_checksum([45, 0, 22, 0]);
        let r = decode_frame(&frame, DhtModel::Dht11).unwrap();
        assert_eq!(r.humidity(), 45.0);
        assert_eq!(r.temperature(), 22.0);
    }

    #[test]
    fn dht11_tenths_and_sign() {
        let frame = with_checksum([40, 5, 3, 0x82]);
        let r = decode_frame(&frame, DhtModel::Dht11).unwrap();
        assert!((r.humidity() - 40.5).abs() < 0.01);
        assert!((r.temperature() + 3.2).abs() < 0.01);
    }

    #[test]
    fn bad_checksum_rejected() {
        let mut frame = with_checksum([0x02, 0x8C, 0x01, 0x5F]);
        frame[4] ^= 0x01;
        assert_eq!(
            decode_frame(&frame, DhtModel::Dht22),
            Err(SensorError::ChecksumMismatch)
        );
    }

    #[test]
    fn implausible_humidity_rejected() {
        // 150.0 %RH
        let frame = with_checksum([0x05, 0xDC, 0x00, 0xC8]);
        assert_eq!(
            decode_frame(&frame, DhtModel::Dht22),
            Err(SensorError::OutOfRange)
        );
    }

    #[test]
    fn implausible_temperature_rejected() {
        let frame = with_checksum([50, 0, 120, 0]);
        assert_eq!(
            decode_frame(&frame, DhtModel::Dht11),
            Err(SensorError::OutOfRange)
        );
    }

    // ── Driver against a scripted line ────────────────────────

    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Replays a level per elapsed microsecond, starting once the host
    /// releases the line.
    struct ScriptedLine {
        levels: Vec<bool>,
        clock: std::rc::Rc<core::cell::Cell<usize>>,
        released: bool,
    }

    impl ErrorType for ScriptedLine {
        type Error = Infallible;
    }

    impl OutputPin for ScriptedLine {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.released = false;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            if !self.released {
                self.clock.set(0);
            }
            self.released = true;
            Ok(())
        }
    }

    impl InputPin for ScriptedLine {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.levels.get(self.clock.get()).copied().unwrap_or(true))
        }
        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    struct TickDelay(std::rc::Rc<core::cell::Cell<usize>>);

    impl DelayNs for TickDelay {
        fn delay_ns(&mut self, ns: u32) {
            let us = (ns / 1_000).max(1) as usize;
            self.0.set(self.0.get() + us);
        }
    }

    fn waveform(frame: &Frame) -> Vec<bool> {
        let mut w = Vec::new();
        w.extend(std::iter::repeat_n(true, 20));
        w.extend(std::iter::repeat_n(false, 80));
        w.extend(std::iter::repeat_n(true, 80));
        for byte in frame {
            for i in (0..8).rev() {
                w.extend(std::iter::repeat_n(false, 50));
                let high = if (byte >> i) & 1 == 1 { 70 } else { 26 };
                w.extend(std::iter::repeat_n(true, high));
            }
        }
        w.extend(std::iter::repeat_n(false, 50));
        w
    }

    #[test]
    fn driver_clocks_in_frame() {
        let frame = with_checksum([0x02, 0x8C, 0x01, 0x5F]);
        let clock = std::rc::Rc::new(core::cell::Cell::new(0));
        let line = ScriptedLine {
            levels: waveform(&frame),
            clock: clock.clone(),
            released: true,
        };
        let mut dht = DhtSensor::new(line, TickDelay(clock), DhtModel::Dht22);
        let r = dht.read_environment().unwrap();
        assert!((r.humidity() - 65.2).abs() < 0.01);
        assert!((r.temperature() - 35.1).abs() < 0.01);
    }

    #[test]
    fn silent_sensor_times_out() {
        let clock = std::rc::Rc::new(core::cell::Cell::new(0));
        let line = ScriptedLine {
            levels: Vec::new(),
            clock: clock.clone(),
            released: true,
        };
        let mut dht = DhtSensor::new(line, TickDelay(clock), DhtModel::Dht11);
        assert_eq!(dht.read_environment(), Err(SensorError::Timeout));
    }
}
