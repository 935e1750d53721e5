//! Safety evaluator.
//!
//! Stateless: every function takes its inputs explicitly and returns a
//! verdict. The controller runs [`check_all`] **every tick before the
//! session FSM** and must act on what it returns.
//!
//! ## Evaluation order
//!
//! 1. Voltage (critical, short-circuits).
//! 2. Temperature (critical, short-circuits).
//! 3. Start eligibility *or* session duration, depending on whether a
//!    session is running (advisory, blocks only the guarded transition).
//!
//! Critical failures never fall through to the advisory checks, so an
//! over-voltage is never masked by a daily-limit message.

use crate::error::SafetyError;

// ── Battery (2S Li-ion) ───────────────────────────────────────

pub const V_OVER: f32 = 8.6;
pub const V_FULL: f32 = 8.4;
pub const V_NOMINAL: f32 = 7.4;
pub const V_LOW: f32 = 6.8;
pub const V_CUTOFF: f32 = 6.2;

// ── Thermal ───────────────────────────────────────────────────

pub const T_WARNING: f32 = 40.0;
pub const T_CUTOFF: f32 = 45.0;
pub const T_HYSTERESIS: f32 = 5.0;
/// Raw readings below this mean "no sensor fitted".
pub const T_ABSENT_BELOW: f32 = -100.0;
/// Output fraction at and above `T_CUTOFF`.
pub const DERATING_FLOOR: f32 = 0.5;

// ── Session limits ────────────────────────────────────────────

pub const MAX_DAILY: u8 = 3;
pub const MIN_GAP_SEC: u64 = 3_600;
pub const MAX_SESSION_SEC: u64 = 1_800;

// ── Irradiance (mW/cm²) ───────────────────────────────────────

pub const MAX_POWER_MW_CM2: f32 = 50.0;
pub const TARGET_POWER_MW_CM2: f32 = 5.0;

/// A temperature reading, or the absence of a sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temperature {
    Celsius(f32),
    Absent,
}

impl Temperature {
    /// Convert a raw driver reading. Anything below −100 °C (or NaN) is
    /// treated as no sensor.
    pub fn from_raw(raw: f32) -> Self {
        if raw.is_nan() || raw < T_ABSENT_BELOW {
            Self::Absent
        } else {
            Self::Celsius(raw)
        }
    }

    pub const fn celsius(self) -> Option<f32> {
        match self {
            Self::Celsius(t) => Some(t),
            Self::Absent => None,
        }
    }
}

/// Structured verdict from [`check_all`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyStatus {
    pub voltage_ok: bool,
    pub thermal_ok: bool,
    pub session_ok: bool,
    pub power_ok: bool,
    pub error: Option<SafetyError>,
    pub message: &'static str,
}

impl SafetyStatus {
    pub const ALL_OK_MESSAGE: &'static str = "All systems OK";

    pub const fn ok() -> Self {
        Self {
            voltage_ok: true,
            thermal_ok: true,
            session_ok: true,
            power_ok: true,
            error: None,
            message: Self::ALL_OK_MESSAGE,
        }
    }

    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// The error if it forces an emergency stop.
    pub fn critical_error(&self) -> Option<SafetyError> {
        self.error.filter(|e| e.is_critical())
    }

    fn fail(&mut self, err: SafetyError) {
        self.error = Some(err);
        self.message = err.message();
    }
}

impl Default for SafetyStatus {
    fn default() -> Self {
        Self::ok()
    }
}

// ── Individual checks ─────────────────────────────────────────

/// `V_CUTOFF <= v <= V_OVER` is safe. NaN reads as under-voltage.
pub fn check_voltage(v: f32) -> Result<(), SafetyError> {
    if v > V_OVER {
        Err(SafetyError::Overvoltage)
    } else if v >= V_CUTOFF {
        Ok(())
    } else {
        Err(SafetyError::Undervoltage)
    }
}

/// State of charge, linear between `V_CUTOFF` and `V_FULL`, truncated.
pub fn battery_percent(v: f32) -> u8 {
    if v >= V_FULL {
        return 100;
    }
    if v <= V_CUTOFF || v.is_nan() {
        return 0;
    }
    let pct = (v - V_CUTOFF) / (V_FULL - V_CUTOFF) * 100.0;
    (pct as u8).min(100)
}

/// Non-critical low-battery warning.
pub fn battery_low(v: f32) -> bool {
    v < V_LOW
}

pub fn check_temperature(t: Temperature) -> Result<(), SafetyError> {
    match t {
        Temperature::Celsius(c) if c >= T_CUTOFF => Err(SafetyError::Thermal),
        _ => Ok(()),
    }
}

/// True once the die is warm enough to start derating.
pub fn thermal_warning(t: Temperature) -> bool {
    matches!(t, Temperature::Celsius(c) if c >= T_WARNING)
}

/// Output scale factor in `[DERATING_FLOOR, 1.0]`.
pub fn thermal_derating(t: Temperature) -> f32 {
    let Temperature::Celsius(c) = t else {
        return 1.0;
    };
    if c < T_WARNING {
        1.0
    } else if c >= T_CUTOFF {
        DERATING_FLOOR
    } else {
        let over = (c - T_WARNING) / (T_CUTOFF - T_WARNING);
        (1.0 - over * (1.0 - DERATING_FLOOR)).clamp(DERATING_FLOOR, 1.0)
    }
}

/// The gap rule only applies once a session has already run today.
pub fn check_session_start(daily_count: u8, seconds_since_last: u64) -> Result<(), SafetyError> {
    if daily_count >= MAX_DAILY {
        return Err(SafetyError::DailyLimit);
    }
    if daily_count > 0 && seconds_since_last < MIN_GAP_SEC {
        return Err(SafetyError::SessionGap);
    }
    Ok(())
}

pub fn check_session_duration(elapsed_sec: u64) -> Result<(), SafetyError> {
    if elapsed_sec >= MAX_SESSION_SEC {
        Err(SafetyError::SessionTooLong)
    } else {
        Ok(())
    }
}

pub fn check_power(mw_per_cm2: f32) -> Result<(), SafetyError> {
    if mw_per_cm2 > MAX_POWER_MW_CM2 {
        Err(SafetyError::PowerTooHigh)
    } else {
        Ok(())
    }
}

// ── Aggregate ─────────────────────────────────────────────────

/// Evaluate every rule in priority order.
#[must_use]
pub fn check_all(
    voltage: f32,
    temp: Temperature,
    daily_count: u8,
    seconds_since_last: u64,
    session_active: bool,
    elapsed_sec: u64,
) -> SafetyStatus {
    let mut status = SafetyStatus::ok();

    if let Err(e) = check_voltage(voltage) {
        status.voltage_ok = false;
        status.fail(e);
        return status;
    }

    if let Err(e) = check_temperature(temp) {
        status.thermal_ok = false;
        status.fail(e);
        return status;
    }

    let session = if session_active {
        check_session_duration(elapsed_sec)
    } else {
        check_session_start(daily_count, seconds_since_last)
    };
    if let Err(e) = session {
        status.session_ok = false;
        status.fail(e);
    }

    status
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn voltage_ok_iff_in_band(v in 0.0f32..12.0) {
            prop_assert_eq!(check_voltage(v).is_ok(), (V_CUTOFF..=V_OVER).contains(&v));
        }

        #[test]
        fn battery_percent_monotone_and_bounded(a in 0.0f32..12.0, b in 0.0f32..12.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(battery_percent(lo) <= battery_percent(hi));
            prop_assert!(battery_percent(hi) <= 100);
        }

        #[test]
        fn absent_below_minus_hundred(raw in -1.0e6f32..-100.001) {
            prop_assert_eq!(check_temperature(Temperature::from_raw(raw)), Ok(()));
        }

        #[test]
        fn derating_bounded_and_non_increasing(a in -50.0f32..120.0, b in -50.0f32..120.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let dl = thermal_derating(Temperature::Celsius(lo));
            let dh = thermal_derating(Temperature::Celsius(hi));
            prop_assert!(dh <= dl);
            prop_assert!((DERATING_FLOOR..=1.0).contains(&dl));
            prop_assert!((DERATING_FLOOR..=1.0).contains(&dh));
        }

        #[test]
        fn first_session_never_gap_blocked(secs in any::<u64>()) {
            prop_assert_eq!(check_session_start(0, secs), Ok(()));
            prop_assert_eq!(check_session_start(MAX_DAILY, secs), Err(SafetyError::DailyLimit));
        }
    }
}
