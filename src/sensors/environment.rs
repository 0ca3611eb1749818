//! Storage-environment classifier.
//!
//! Medication keeps best in a cool, moderately dry room.  Readings are
//! bucketed into three levels, checked in order (first match wins):
//!
//! | Class     | Temperature (°C)             | Humidity (%RH)              |
//! |-----------|------------------------------|-----------------------------|
//! | Optimal   | 18 ≤ t ≤ 25                  | **and** 40 ≤ h ≤ 55         |
//! | Regular   | 10 ≤ t < 18 **or** 25 < t ≤ 30 | **or** 30 ≤ h < 40 **or** 55 < h ≤ 65 |
//! | Danger    | anything else                |                             |

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Three-level storage-environment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentClass {
    Optimal,
    Regular,
    Danger,
}

impl EnvironmentClass {
    /// Lower-case label sent to the log server.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Regular => "regular",
            Self::Danger => "danger",
        }
    }
}

impl core::fmt::Display for EnvironmentClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated temperature/humidity pair.
///
/// Construction rejects non-finite values, so every reading that exists
/// can be classified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    temperature: f32,
    humidity: f32,
}

impl EnvironmentReading {
    pub fn new(temperature: f32, humidity: f32) -> Result<Self, SensorError> {
        if temperature.is_nan() || humidity.is_nan() {
            return Err(SensorError::NotANumber);
        }
        if !temperature.is_finite() || !humidity.is_finite() {
            return Err(SensorError::OutOfRange);
        }
        Ok(Self {
            temperature,
            humidity,
        })
    }

    /// Degrees Celsius.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Relative humidity, percent.
    pub fn humidity(&self) -> f32 {
        self.humidity
    }

    pub fn classify(&self) -> EnvironmentClass {
        classify(self.temperature, self.humidity)
    }
}

/// Classify a (temperature °C, humidity %RH) pair.
///
/// Total over finite inputs.  A NaN fails every comparison and lands in
/// `Danger`, but callers are expected to reject NaN before getting here
/// (see [`EnvironmentReading::new`]).
pub fn classify(temperature: f32, humidity: f32) -> EnvironmentClass {
    let t = temperature;
    let h = humidity;

    if (18.0..=25.0).contains(&t) && (40.0..=55.0).contains(&h) {
        return EnvironmentClass::Optimal;
    }

    let t_regular = (10.0..18.0).contains(&t) || (t > 25.0 && t <= 30.0);
    let h_regular = (30.0..40.0).contains(&h) || (h > 55.0 && h <= 65.0);
    if t_regular || h_regular {
        return EnvironmentClass::Regular;
    }

    EnvironmentClass::Danger
}
