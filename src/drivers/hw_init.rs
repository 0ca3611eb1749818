//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions, the DHT data line, the buzzer LEDC
//! timer/channel, and the button ISR using raw ESP-IDF sys calls. Called
//! once from `main()` before the event loop starts.
//!
//! On host targets the GPIO helpers are backed by atomics so tests can
//! drive inputs and observe outputs.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed(_) => Self::Init("gpio"),
            HwInitError::LedcInitFailed(_) => Self::Init("ledc"),
            HwInitError::IsrInstallFailed(_) => Self::Init("gpio isr"),
        }
    }
}

/// Indicator LED outputs, in board order.
pub const INDICATOR_GPIOS: [i32; 3] = [
    pins::LED_WAITING_GPIO,
    pins::LED_ALERT_GPIO,
    pins::LED_CONFIRMED_GPIO,
];

#[cfg(target_os = "espidf")]
pub fn init_peripherals(buzzer_tone_hz: u32) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before event loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_dht_line()?;
        init_ledc(buzzer_tone_hz)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_buzzer_tone_hz: u32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let btn_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::ACK_BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };
    let ret = unsafe { gpio_config(&btn_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!("hw_init: ack button input configured (GPIO {})", pins::ACK_BUTTON_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Simulated input levels: a set bit means the pin is pulled LOW.
#[cfg(not(target_os = "espidf"))]
static SIM_INPUTS_LOW: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    SIM_INPUTS_LOW.load(Ordering::Acquire) & (1u64 << pin) == 0
}

/// Drive a simulated input pin (pull-up idle = `true`).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_input(pin: i32, high: bool) {
    if high {
        SIM_INPUTS_LOW.fetch_and(!(1u64 << pin), Ordering::AcqRel);
    } else {
        SIM_INPUTS_LOW.fetch_or(1u64 << pin, Ordering::AcqRel);
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &INDICATOR_GPIOS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin as gpio_num_t, 0) };
    }

    info!("hw_init: indicator outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // main-loop only.
    unsafe {
        gpio_set_level(pin as gpio_num_t, if high { 1 } else { 0 });
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_OUTPUTS_HIGH: AtomicU64 = AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    if high {
        SIM_OUTPUTS_HIGH.fetch_or(1u64 << pin, Ordering::AcqRel);
    } else {
        SIM_OUTPUTS_HIGH.fetch_and(!(1u64 << pin), Ordering::AcqRel);
    }
}

/// Last level written to a simulated output pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_output(pin: i32) -> bool {
    SIM_OUTPUTS_HIGH.load(Ordering::Acquire) & (1u64 << pin) != 0
}

// ── DHT data line (open drain, pulled up) ─────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_dht_line() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::DHT_DATA_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    unsafe { gpio_set_level(pins::DHT_DATA_GPIO as gpio_num_t, 1) };
    info!("hw_init: DHT line configured (GPIO {}, open drain)", pins::DHT_DATA_GPIO);
    Ok(())
}

/// Open-drain GPIO exposed through `embedded-hal` 1.0 digital traits,
/// for the bit-banged DHT driver.
#[cfg(target_os = "espidf")]
pub struct OpenDrainPin {
    gpio: i32,
}

#[cfg(target_os = "espidf")]
impl OpenDrainPin {
    /// The pin must have been configured by [`init_peripherals`].
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::ErrorType for OpenDrainPin {
    type Error = core::convert::Infallible;
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::OutputPin for OpenDrainPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.gpio, true);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl embedded_hal::digital::InputPin for OpenDrainPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.gpio))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.gpio))
    }
}

// ── LEDC (buzzer tone) ────────────────────────────────────────

pub const LEDC_CH_BUZZER: u32 = 0;

/// 50 % duty at the configured resolution.
const BUZZER_DUTY_ON: u32 = 1 << (pins::BUZZER_PWM_RESOLUTION_BITS - 1);

#[cfg(target_os = "espidf")]
unsafe fn init_ledc(tone_hz: u32) -> Result<(), HwInitError> {
    // SAFETY: Called from single main-task context via init_peripherals().
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::BUZZER_PWM_RESOLUTION_BITS,
        freq_hz: tone_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: LEDC_CH_BUZZER,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pins::BUZZER_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    info!("hw_init: LEDC configured (buzzer=CH0 @ {} Hz)", tone_hz);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn buzzer_set(on: bool) {
    let duty = if on { BUZZER_DUTY_ON } else { 0 };
    // SAFETY: the LEDC channel was configured in init_ledc(); duty register
    // writes are race-free since only the main loop calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_CH_BUZZER, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_CH_BUZZER);
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_BUZZER_DUTY: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_set(on: bool) {
    SIM_BUZZER_DUTY.store(if on { BUZZER_DUTY_ON } else { 0 }, Ordering::Release);
}

/// Current simulated buzzer duty.
#[cfg(not(target_os = "espidf"))]
pub fn sim_buzzer_duty() -> u32 {
    SIM_BUZZER_DUTY.load(Ordering::Acquire)
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::button_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is a RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    button_isr_handler(now_ms);
}

/// Install the per-pin GPIO ISR service and register the button handler.
/// Call after init_peripherals() and before the event loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed. The handler only stores an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let pin = pins::ACK_BUTTON_GPIO as gpio_num_t;
        gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        let ret = gpio_isr_handler_add(pin, Some(button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(pin);

        info!("hw_init: ISR service installed (ack button)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
