//! Unified error types for the RedLight firmware.
//!
//! `SafetyError` is the closed vocabulary of the safety evaluator; every
//! other subsystem error funnels into the top-level [`Error`] so the binary
//! can propagate with `?`. All variants are `Copy` so verdicts pass through
//! the session FSM and UI without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A safety rule was violated.
    Safety(SafetyError),
    /// The persistence backend failed.
    Storage(StorageError),
    /// Configuration is invalid.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    HwInit(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::HwInit(e) => write!(f, "hw init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<SafetyError> for Error {
    fn from(e: SafetyError) -> Self {
        Self::Safety(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::HwInit(e)
    }
}

// ---------------------------------------------------------------------------
// Safety errors
// ---------------------------------------------------------------------------

/// The specific rule a safety check found violated.
///
/// Critical variants (`Overvoltage`, `Undervoltage`, `Thermal`) force an
/// emergency stop at the point of detection. The rest only block the
/// transition they guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyError {
    Overvoltage,
    Undervoltage,
    Thermal,
    DailyLimit,
    SessionGap,
    SessionTooLong,
    PowerTooHigh,
}

impl SafetyError {
    /// Critical errors de-energise the light channels immediately.
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Overvoltage | Self::Undervoltage | Self::Thermal)
    }

    /// Operator-facing text. Display only; never branch on it.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Overvoltage => "DANGER: Battery over-voltage!",
            Self::Undervoltage => "Battery critically low",
            Self::Thermal => "DANGER: Overheating!",
            Self::DailyLimit => "Daily session limit reached",
            Self::SessionGap => "Wait between sessions",
            Self::SessionTooLong => "Max session time exceeded",
            Self::PowerTooHigh => "Power output too high",
        }
    }
}

impl fmt::Display for SafetyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
