//! Outbound application events.
//!
//! The [`Controller`](super::controller::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to serial, mirror to a companion app,
//! etc.

use crate::error::SafetyError;
use crate::mode::{ChannelDuties, TreatmentMode};
use crate::safety::Temperature;
use crate::session::context::StopReason;
use crate::session::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The controller has booted (carries the restored mode).
    Started(TreatmentMode),

    SessionStarted { mode: TreatmentMode, daily_count: u8 },

    SessionStopped { reason: StopReason, elapsed_secs: u64, minutes: u32 },

    /// A start request was refused by a non-critical rule.
    StartRejected(SafetyError),

    /// Critical fault: channels forced off.
    EmergencyStop(SafetyError),

    /// The critical condition is no longer present.
    EmergencyCleared,

    ModeChanged(TreatmentMode),

    LowBattery { voltage: f32 },

    ThermalWarning { celsius: f32 },
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    pub mode: TreatmentMode,
    pub voltage: f32,
    pub battery_percent: u8,
    pub temperature: Temperature,
    pub duties: ChannelDuties,
    pub brightness: u8,
    pub elapsed_secs: u64,
    pub daily_sessions: u8,
    pub lifetime_sessions: u32,
    pub lifetime_minutes: u32,
    pub tick_count: u64,
}
