//! GPIO / peripheral pin assignments for the MedAlert board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Indicator LEDs (discrete, active HIGH)
// ---------------------------------------------------------------------------

/// Red: cycle running, dose not yet due.
pub const LED_WAITING_GPIO: i32 = 27;
/// Yellow: dose due.
pub const LED_ALERT_GPIO: i32 = 26;
/// Green: dose confirmed.
pub const LED_CONFIRMED_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Buzzer (passive piezo, LEDC square wave)
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 32;

// ---------------------------------------------------------------------------
// Acknowledgment button (active-low, internal pull-up)
// ---------------------------------------------------------------------------

pub const ACK_BUTTON_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Environment sensor (DHT11 / DHT22 single-wire, open drain)
// ---------------------------------------------------------------------------

pub const DHT_DATA_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits) for the buzzer.  50 % duty = half scale.
pub const BUZZER_PWM_RESOLUTION_BITS: u32 = 10;
