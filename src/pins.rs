//! GPIO / peripheral pin assignments for the LilyGO T-Display S3 board.
//!
//! Every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Treatment LED channels (constant-current drivers, PWM dimmed)
// ---------------------------------------------------------------------------

/// 660 nm red emitter string.
pub const RED_LED_GPIO: i32 = 43;
/// 850 nm near-infrared emitter string.
pub const NIR_LED_GPIO: i32 = 44;

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// BOOT button: start/stop, next.
pub const BUTTON1_GPIO: i32 = 0;
/// Side button: mode, navigation.
pub const BUTTON2_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

/// Passive piezo, driven by LEDC at the tone frequency, 50 % duty.
pub const BUZZER_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Analog inputs (ADC1)
// ---------------------------------------------------------------------------

/// Battery sense through the on-board divider. ADC1 channel 3.
pub const VBAT_ADC_GPIO: i32 = 4;
pub const VBAT_ADC_CHANNEL: u32 = 3;

/// Optional NTC thermistor divider. ADC1 channel 6.
pub const TEMP_ADC_GPIO: i32 = 7;
pub const TEMP_ADC_CHANNEL: u32 = 6;

// ---------------------------------------------------------------------------
// Board power
// ---------------------------------------------------------------------------

/// Must be held HIGH to keep the board powered from battery.
pub const POWER_ON_GPIO: i32 = 15;
/// TFT backlight enable.
pub const TFT_BACKLIGHT_GPIO: i32 = 38;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits). 8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LED channel PWM frequency (5 kHz, flicker-free).
pub const LED_PWM_FREQ_HZ: u32 = 5_000;
/// Initial buzzer timer frequency; retuned per tone.
pub const BUZZER_BASE_FREQ_HZ: u32 = 2_000;
