//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (readings, LED channels, display, persistence, feedback,
//! event sinks) implement these traits. The
//! [`Controller`](super::controller::Controller) consumes them via generics,
//! so the session and UI logic never touches hardware directly.
//!
//! Every call out of the core is fire-and-forget: no port returns data the
//! control loop has to wait on, except the one-shot `load()` at boot.

use serde::{Deserialize, Serialize};

use crate::feedback::Tone;
use crate::mode::TreatmentMode;
use crate::safety::Temperature;
use crate::ui::views::View;

// ───────────────────────────────────────────────────────────────
// Reading source (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Calibrated readings, cached at their own sampling cadence.
pub trait ReadingSource {
    /// Battery pack voltage (V).
    fn voltage(&mut self) -> f32;

    /// Die temperature, or [`Temperature::Absent`] when no sensor is fitted.
    fn temperature(&mut self) -> Temperature;
}

// ───────────────────────────────────────────────────────────────
// LED channel port (driven adapter: domain → PWM)
// ───────────────────────────────────────────────────────────────

/// Two-channel light output. Back-to-back writes must be accepted.
pub trait LedDriver {
    /// Set 650 nm and 850 nm duties (0–255).
    fn set_channels(&mut self, red: u8, nir: u8);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → screen)
// ───────────────────────────────────────────────────────────────

/// Receives pre-computed view models. Never queried by the core.
pub trait DisplaySink {
    fn render(&mut self, view: &View);
}

// ───────────────────────────────────────────────────────────────
// Feedback port (driven adapter: domain → buzzer / status LED)
// ───────────────────────────────────────────────────────────────

/// Audible and visual acknowledgement. Requests queue; they never block.
pub trait FeedbackSink {
    fn tone(&mut self, tone: Tone);

    /// Blink the status LED `count` times.
    fn blink(&mut self, count: u8);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Persistence port (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// The three values that survive power loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub lifetime_sessions: u32,
    pub lifetime_minutes: u32,
    /// Raw [`TreatmentMode`] byte, validated on restore.
    pub mode: u8,
}

impl PersistedState {
    pub fn new(lifetime_sessions: u32, lifetime_minutes: u32, mode: TreatmentMode) -> Self {
        Self { lifetime_sessions, lifetime_minutes, mode: mode.as_u8() }
    }

    /// Stored mode, replaced with `fallback` when `Off` or out of range.
    pub fn treatment_mode(&self, fallback: TreatmentMode) -> TreatmentMode {
        match TreatmentMode::from_u8(self.mode) {
            Some(TreatmentMode::Off) | None => fallback,
            Some(mode) => mode,
        }
    }
}

/// Loads and persists the session counters and selected mode.
///
/// Write operations MUST be atomic: no partial records on power loss.
/// The ESP-IDF NVS API guarantees this natively; the in-memory simulation
/// achieves it trivially.
pub trait PersistencePort {
    /// Returns [`StorageError::NotFound`] on first boot.
    fn load(&self) -> Result<PersistedState, StorageError>;

    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

/// Errors from [`PersistencePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// No record stored yet (first boot).
    NotFound,
    /// Stored record failed deserialization.
    Corrupted,
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "record not found"),
            Self::Corrupted => write!(f, "record corrupted"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_off_or_garbage_falls_back() {
        let fallback = TreatmentMode::Dual;
        let off = PersistedState { mode: 0, ..PersistedState::default() };
        assert_eq!(off.treatment_mode(fallback), fallback);
        let garbage = PersistedState { mode: 42, ..PersistedState::default() };
        assert_eq!(garbage.treatment_mode(fallback), fallback);
        let nir = PersistedState::new(3, 60, TreatmentMode::NirOnly);
        assert_eq!(nir.treatment_mode(fallback), TreatmentMode::NirOnly);
    }

    #[test]
    fn record_postcard_roundtrip() {
        let s = PersistedState::new(17, 340, TreatmentMode::Alternating);
        let bytes = postcard::to_allocvec(&s).unwrap();
        let back: PersistedState = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(s, back);
    }
}
