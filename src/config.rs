//! System configuration parameters
//!
//! All tunable parameters for the RedLight controller. Defaults are
//! compile-time; the persisted NVS record never carries configuration.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::mode::TreatmentMode;
use crate::safety::MAX_SESSION_SEC;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Session ---
    /// Normal session length (minutes). Must fit under the safety ceiling.
    pub session_minutes: u16,
    /// PWM duty at full output (0-255), before thermal derating
    pub max_brightness: u8,
    /// Mode used at first boot or when the stored mode is invalid
    pub default_mode: TreatmentMode,
    /// Phase length for `Alternating` mode (seconds)
    pub alternate_period_secs: u16,

    // --- Thermal ---
    /// Degrees below `T_WARNING` before derating is released
    pub thermal_hysteresis_c: f32,
    /// Whether an NTC thermistor is fitted
    pub thermal_sensor_enabled: bool,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Battery voltage sample interval (milliseconds)
    pub battery_sample_interval_ms: u32,
    /// Thermistor sample interval (milliseconds)
    pub thermal_sample_interval_ms: u32,
    /// Periodic display refresh (milliseconds)
    pub display_refresh_interval_ms: u32,
    /// How long a session-complete alert stays up (milliseconds)
    pub alert_duration_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,

    // --- Input / feedback ---
    /// Minimum time between accepted button edges (milliseconds)
    pub debounce_ms: u32,
    /// Hold time that classifies a press as long (milliseconds)
    pub long_press_ms: u32,
    /// Buzzer output enabled
    pub buzzer_enabled: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Session
            session_minutes: 20,
            max_brightness: 255,
            default_mode: TreatmentMode::Dual,
            alternate_period_secs: 30,

            // Thermal
            thermal_hysteresis_c: 5.0,
            thermal_sensor_enabled: false,

            // Timing
            control_loop_interval_ms: 20,      // 50 Hz
            battery_sample_interval_ms: 5_000, // 0.2 Hz
            thermal_sample_interval_ms: 2_000, // 0.5 Hz
            display_refresh_interval_ms: 100,  // 10 Hz
            alert_duration_ms: 2_000,
            telemetry_interval_secs: 30,

            // Input / feedback
            debounce_ms: 50,
            long_press_ms: 1_000,
            buzzer_enabled: true,
        }
    }
}

impl SystemConfig {
    /// Configured session length in seconds.
    pub fn session_secs(&self) -> u64 {
        u64::from(self.session_minutes) * 60
    }

    /// Reject values that would defeat a safety rule or stall the loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_minutes == 0 {
            return Err(ConfigError::ValidationFailed("session_minutes must be > 0"));
        }
        if self.session_secs() > MAX_SESSION_SEC {
            return Err(ConfigError::ValidationFailed(
                "session_minutes exceeds the 30 minute ceiling",
            ));
        }
        if self.default_mode == TreatmentMode::Off {
            return Err(ConfigError::ValidationFailed("default_mode cannot be Off"));
        }
        if self.alternate_period_secs == 0 {
            return Err(ConfigError::ValidationFailed("alternate_period_secs must be > 0"));
        }
        if !(self.thermal_hysteresis_c > 0.0 && self.thermal_hysteresis_c <= 10.0) {
            return Err(ConfigError::ValidationFailed(
                "thermal_hysteresis_c must be in (0, 10]",
            ));
        }
        if self.control_loop_interval_ms == 0
            || self.battery_sample_interval_ms == 0
            || self.thermal_sample_interval_ms == 0
            || self.display_refresh_interval_ms == 0
            || self.telemetry_interval_secs == 0
        {
            return Err(ConfigError::ValidationFailed("intervals must be > 0"));
        }
        if self.long_press_ms <= self.debounce_ms {
            return Err(ConfigError::ValidationFailed(
                "long_press_ms must exceed debounce_ms",
            ));
        }
        Ok(())
    }
}
