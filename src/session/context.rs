//! Shared mutable context threaded through every session handler.
//!
//! `SessionContext` is the blackboard the state handlers read from and
//! write to: the latest cached readings and safety verdict, the session
//! counters, the alternating-phase clock and the channel duties the
//! controller writes to the LEDs after each tick. Handlers report what
//! happened through `notices`; the controller drains them into tones,
//! events and persistence.

use heapless::Vec;
use log::warn;

use super::thermal::ThermalGovernor;
use crate::config::SystemConfig;
use crate::error::SafetyError;
use crate::mode::{AlternatePhase, ChannelDuties, TreatmentMode};
use crate::safety::{self, SafetyStatus, Temperature};

/// Rolling window for the daily session limit.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1_000;

// ---------------------------------------------------------------------------
// Readings (written by the controller from the cached sensor values)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub voltage: f32,
    pub temperature: Temperature,
}

impl Default for Readings {
    fn default() -> Self {
        Self { voltage: safety::V_NOMINAL, temperature: Temperature::Absent }
    }
}

// ---------------------------------------------------------------------------
// Session counters
// ---------------------------------------------------------------------------

/// Lifetime counters persist; the daily window and gap timestamp are RAM only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionCounters {
    pub lifetime_sessions: u32,
    pub lifetime_minutes: u32,
    pub daily_session_count: u8,
    pub day_start_ms: u64,
    pub last_session_end_ms: Option<u64>,
}

impl SessionCounters {
    /// Reset the daily count once 24 h have passed since the window opened.
    /// Returns `true` when the window rolled over.
    pub fn roll_daily_window(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.day_start_ms) >= DAY_MS {
            self.daily_session_count = 0;
            self.day_start_ms = now_ms;
            return true;
        }
        false
    }

    /// `u64::MAX` when no session has ended yet.
    pub fn seconds_since_last(&self, now_ms: u64) -> u64 {
        self.last_session_end_ms
            .map_or(u64::MAX, |end| now_ms.saturating_sub(end) / 1_000)
    }
}

// ---------------------------------------------------------------------------
// Stop reasons and notices (written by handlers; drained by the controller)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Operator pressed stop.
    User,
    /// Reached the configured session length.
    Completed,
    /// Reached the hard `MAX_SESSION_SEC` ceiling.
    SafetyCeiling,
    /// Critical safety failure.
    Emergency(SafetyError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    Started { mode: TreatmentMode },
    StartRejected(SafetyError),
    Stopped { reason: StopReason, elapsed_secs: u64, minutes: u32 },
}

const NOTICE_CAP: usize = 4;

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

pub struct SessionContext {
    pub config: SystemConfig,

    // ── Inputs (refreshed by `observe` each tick) ─────────────
    pub now_ms: u64,
    pub readings: Readings,
    pub safety: SafetyStatus,

    // ── Session state ─────────────────────────────────────────
    pub mode: TreatmentMode,
    pub counters: SessionCounters,
    pub session_start_ms: u64,
    pub phase: AlternatePhase,
    pub last_flip_ms: u64,
    pub thermal: ThermalGovernor,
    /// Effective full-scale duty after thermal derating.
    pub brightness: u8,

    // ── Requests from the controller ──────────────────────────
    pub start_requested: bool,
    pub stop_request: Option<StopReason>,

    // ── Outputs ───────────────────────────────────────────────
    pub duties: ChannelDuties,
    pub notices: Vec<SessionNotice, NOTICE_CAP>,
}

impl SessionContext {
    pub fn new(config: SystemConfig) -> Self {
        let thermal = ThermalGovernor::new(config.thermal_hysteresis_c);
        Self {
            mode: config.default_mode,
            brightness: config.max_brightness,
            now_ms: 0,
            readings: Readings::default(),
            safety: SafetyStatus::ok(),
            counters: SessionCounters::default(),
            session_start_ms: 0,
            phase: AlternatePhase::Red,
            last_flip_ms: 0,
            thermal,
            start_requested: false,
            stop_request: None,
            duties: ChannelDuties::OFF,
            notices: Vec::new(),
            config,
        }
    }

    /// Load this tick's time and readings, roll the daily window, run the
    /// safety evaluator and update the thermal derating.
    pub fn observe(&mut self, now_ms: u64, readings: Readings, session_active: bool) {
        self.now_ms = now_ms;
        self.readings = readings;
        self.counters.roll_daily_window(now_ms);

        self.safety = safety::check_all(
            readings.voltage,
            readings.temperature,
            self.counters.daily_session_count,
            self.counters.seconds_since_last(now_ms),
            session_active,
            self.elapsed_secs(),
        );

        let factor = self.thermal.update(readings.temperature);
        self.brightness = (f32::from(self.config.max_brightness) * factor).round() as u8;
    }

    /// Adopt a new treatment mode. Switching into `Alternating` restarts
    /// the flip cycle on red from now.
    pub fn set_mode(&mut self, mode: TreatmentMode) {
        if mode == TreatmentMode::Alternating && self.mode != mode {
            self.phase = AlternatePhase::Red;
            self.last_flip_ms = self.now_ms;
        }
        self.mode = mode;
    }

    /// Seconds since the current session started. Only meaningful while active.
    pub fn elapsed_secs(&self) -> u64 {
        self.now_ms.saturating_sub(self.session_start_ms) / 1_000
    }

    pub fn notify(&mut self, notice: SessionNotice) {
        if self.notices.push(notice).is_err() {
            warn!("Session notice dropped (queue full): {:?}", notice);
        }
    }

    /// Recompute channel duties from mode, phase and brightness.
    pub fn apply_output(&mut self) {
        self.duties = self.mode.duties(self.brightness, self.phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_to_alternating_restarts_flip_cycle() {
        let mut ctx = SessionContext::new(SystemConfig::default());
        ctx.now_ms = 45_000;
        ctx.phase = AlternatePhase::Nir;
        ctx.set_mode(TreatmentMode::Alternating);
        assert_eq!(ctx.phase, AlternatePhase::Red);
        assert_eq!(ctx.last_flip_ms, 45_000);

        // Re-selecting the running mode leaves the cycle alone.
        ctx.now_ms = 50_000;
        ctx.phase = AlternatePhase::Nir;
        ctx.set_mode(TreatmentMode::Alternating);
        assert_eq!(ctx.phase, AlternatePhase::Nir);
        assert_eq!(ctx.last_flip_ms, 45_000);
    }

    #[test]
    fn daily_window_rolls_after_24h() {
        let mut c = SessionCounters { daily_session_count: 3, ..SessionCounters::default() };
        assert!(!c.roll_daily_window(DAY_MS - 1));
        assert_eq!(c.daily_session_count, 3);
        assert!(c.roll_daily_window(DAY_MS));
        assert_eq!(c.daily_session_count, 0);
        assert_eq!(c.day_start_ms, DAY_MS);
    }

    #[test]
    fn seconds_since_last_without_history() {
        let c = SessionCounters::default();
        assert_eq!(c.seconds_since_last(5_000), u64::MAX);
        let c = SessionCounters { last_session_end_ms: Some(1_000), ..c };
        assert_eq!(c.seconds_since_last(61_000), 60);
    }

    #[test]
    fn observe_reports_verdict() {
        let mut ctx = SessionContext::new(SystemConfig::default());
        ctx.observe(0, Readings { voltage: 6.0, temperature: Temperature::Absent }, false);
        assert_eq!(ctx.safety.error, Some(SafetyError::Undervoltage));
        assert!(!ctx.safety.voltage_ok);
    }

    #[test]
    fn notice_overflow_is_dropped_not_panicking() {
        let mut ctx = SessionContext::new(SystemConfig::default());
        for _ in 0..NOTICE_CAP + 2 {
            ctx.notify(SessionNotice::StartRejected(SafetyError::SessionGap));
        }
        assert_eq!(ctx.notices.len(), NOTICE_CAP);
    }
}
