//! One-shot hardware peripheral initialization.
//!
//! Configures ADC channels, GPIO directions, and LEDC timers/channels
//! using raw ESP-IDF sys calls. Called once from `main()` before the
//! control loop starts.
//!
//! On the host every accessor is backed by atomics so drivers and sensors
//! can be exercised in tests: `sim_*` setters inject ADC counts and button
//! levels, `ledc_duty()` reads back the last duty written to a channel.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

pub const LEDC_CH_RED: u32 = 0;
pub const LEDC_CH_NIR: u32 = 1;
pub const LEDC_CH_BUZZER: u32 = 2;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [pins::VBAT_ADC_CHANNEL, pins::TEMP_ADC_CHANNEL] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!("hw_init: ADC1 configured (CH3=VBAT, CH6=NTC)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> u16 {
    sim::ADC.get(channel as usize).map_or(0, |a| a.load(sim::ORDER))
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio() -> Result<(), HwInitError> {
    for pin in [pins::BUTTON1_GPIO, pins::BUTTON2_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    // Board power latch and backlight are driven HIGH for the whole run.
    for pin in [pins::POWER_ON_GPIO, pins::TFT_BACKLIGHT_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, 1) };
    }

    info!("hw_init: GPIO configured (buttons in, power latch + backlight on)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host: pins idle HIGH (released, pull-up) unless pulled low by a test.
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    (sim::GPIO_LOW.load(sim::ORDER) & (1u64 << pin)) == 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an output configured in init_gpio().
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    sim_set_gpio_low(pin, !high);
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: treatment LEDs (5 kHz, 8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    // Timer 1: buzzer (frequency retuned per tone)
    let timer1 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_1,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::BUZZER_BASE_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer1) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    let channels = [
        (LEDC_CH_RED, ledc_timer_t_LEDC_TIMER_0, pins::RED_LED_GPIO),
        (LEDC_CH_NIR, ledc_timer_t_LEDC_TIMER_0, pins::NIR_LED_GPIO),
        (LEDC_CH_BUZZER, ledc_timer_t_LEDC_TIMER_1, pins::BUZZER_GPIO),
    ];
    for (channel, timer, gpio) in channels {
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: timer,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    }

    info!("hw_init: LEDC configured (red=CH0, nir=CH1, buzzer=CH2)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); only the main
    // loop writes duty registers.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(channel: u32, duty: u8) {
    if let Some(slot) = sim::LEDC.get(channel as usize) {
        slot.store(duty, sim::ORDER);
    }
}

/// Last duty written to `channel` (host only).
#[cfg(not(target_os = "espidf"))]
pub fn ledc_duty(channel: u32) -> u8 {
    sim::LEDC.get(channel as usize).map_or(0, |d| d.load(sim::ORDER))
}

/// Start a square wave on the buzzer, or silence it with `0`.
#[cfg(target_os = "espidf")]
pub fn buzzer_tone(frequency_hz: u16) {
    if frequency_hz == 0 {
        ledc_set(LEDC_CH_BUZZER, 0);
        return;
    }
    // SAFETY: timer 1 is owned by the buzzer channel only.
    unsafe {
        ledc_set_freq(
            ledc_mode_t_LEDC_LOW_SPEED_MODE,
            ledc_timer_t_LEDC_TIMER_1,
            u32::from(frequency_hz),
        );
    }
    ledc_set(LEDC_CH_BUZZER, 128);
}

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_tone(frequency_hz: u16) {
    sim::BUZZER_HZ.store(frequency_hz, sim::ORDER);
    ledc_set(LEDC_CH_BUZZER, if frequency_hz == 0 { 0 } else { 128 });
}

/// Frequency currently sounding (host only, 0 = silent).
#[cfg(not(target_os = "espidf"))]
pub fn buzzer_frequency() -> u16 {
    sim::BUZZER_HZ.load(sim::ORDER)
}

// ── PWM output (embedded-hal) ─────────────────────────────────

/// One LEDC channel exposed as an `embedded_hal` duty-cycle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmChannel {
    channel: u32,
}

impl PwmChannel {
    pub const fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub const fn channel(&self) -> u32 {
        self.channel
    }
}

impl ErrorType for PwmChannel {
    type Error = Infallible;
}

impl SetDutyCycle for PwmChannel {
    fn max_duty_cycle(&self) -> u16 {
        u16::from(u8::MAX)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        ledc_set(self.channel, duty.min(u16::from(u8::MAX)) as u8);
        Ok(())
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU8, AtomicU16, AtomicU64, Ordering};

    pub const ORDER: Ordering = Ordering::SeqCst;

    pub static ADC: [AtomicU16; 10] = [const { AtomicU16::new(0) }; 10];
    pub static LEDC: [AtomicU8; 3] = [const { AtomicU8::new(0) }; 3];
    pub static GPIO_LOW: AtomicU64 = AtomicU64::new(0);
    pub static BUZZER_HZ: AtomicU16 = AtomicU16::new(0);
}

/// Inject a raw ADC count for `channel` (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(slot) = sim::ADC.get(channel as usize) {
        slot.store(raw, sim::ORDER);
    }
}

/// Drive `pin` low (pressed) or release it (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gpio_low(pin: i32, low: bool) {
    let bit = 1u64 << pin;
    if low {
        sim::GPIO_LOW.fetch_or(bit, sim::ORDER);
    } else {
        sim::GPIO_LOW.fetch_and(!bit, sim::ORDER);
    }
}
