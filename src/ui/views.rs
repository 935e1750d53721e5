//! Pre-computed view models handed to the display sink.
//!
//! The display never reads controller state; everything it draws arrives
//! in one of these values.

use super::{Overlay, Screen, UiState};
use crate::error::SafetyError;
use crate::mode::{ChannelDuties, TreatmentMode};
use crate::safety::{self, SafetyStatus, Temperature, MAX_DAILY};

/// Read-only copy of the controller state a view may need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub voltage: f32,
    pub temperature: Temperature,
    pub safety: SafetyStatus,
    pub session_active: bool,
    pub mode: TreatmentMode,
    pub duties: ChannelDuties,
    pub elapsed_secs: u64,
    pub session_secs: u64,
    pub brightness: u8,
    pub lifetime_sessions: u32,
    pub lifetime_minutes: u32,
    pub daily_sessions: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomeView {
    pub voltage: f32,
    pub battery_percent: u8,
    pub mode: TreatmentMode,
    /// A session could start right now.
    pub ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub mode: TreatmentMode,
    pub red_on: bool,
    pub nir_on: bool,
    pub brightness_percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsView {
    pub lifetime_sessions: u32,
    pub lifetime_minutes: u32,
    pub daily_sessions: u8,
    pub max_daily: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsView {
    pub current_mode: TreatmentMode,
    pub selected_mode: TreatmentMode,
    pub settings_index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryView {
    pub voltage: f32,
    pub percent: u8,
    pub low: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyView {
    pub voltage: f32,
    pub temperature: Temperature,
    pub voltage_ok: bool,
    pub thermal_ok: bool,
    pub thermal_warning: bool,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertView {
    pub title: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmergencyView {
    pub error: SafetyError,
    pub message: &'static str,
}

/// Everything the display can be asked to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Home(HomeView),
    Session(SessionView),
    Stats(StatsView),
    Settings(SettingsView),
    Battery(BatteryView),
    Safety(SafetyView),
    Alert(AlertView),
    Emergency(EmergencyView),
}

impl View {
    pub const fn is_overlay(&self) -> bool {
        matches!(self, Self::Alert(_) | Self::Emergency(_))
    }
}

/// Overlays win over the current screen.
pub fn build_view(ui: &UiState, snap: &Snapshot) -> View {
    match ui.overlay {
        Some(Overlay::Emergency(error)) => {
            return View::Emergency(EmergencyView { error, message: error.message() });
        }
        Some(Overlay::Alert { kind, .. }) => {
            return View::Alert(AlertView { title: kind.title(), message: kind.message() });
        }
        None => {}
    }

    let percent = safety::battery_percent(snap.voltage);
    match ui.current_screen {
        Screen::Home => View::Home(HomeView {
            voltage: snap.voltage,
            battery_percent: percent,
            mode: ui.current_mode,
            ready: !snap.session_active && snap.safety.is_ok(),
        }),
        Screen::Session => View::Session(SessionView {
            elapsed_secs: if snap.session_active { snap.elapsed_secs } else { 0 },
            total_secs: snap.session_secs,
            mode: snap.mode,
            red_on: snap.duties.red > 0,
            nir_on: snap.duties.nir > 0,
            brightness_percent: (u16::from(snap.brightness) * 100 / 255) as u8,
        }),
        Screen::Stats => View::Stats(StatsView {
            lifetime_sessions: snap.lifetime_sessions,
            lifetime_minutes: snap.lifetime_minutes,
            daily_sessions: snap.daily_sessions,
            max_daily: MAX_DAILY,
        }),
        Screen::Settings => View::Settings(SettingsView {
            current_mode: ui.current_mode,
            selected_mode: ui.selected_mode,
            settings_index: ui.settings_index,
        }),
        Screen::Battery => View::Battery(BatteryView {
            voltage: snap.voltage,
            percent,
            low: safety::battery_low(snap.voltage),
        }),
        Screen::Safety => View::Safety(SafetyView {
            voltage: snap.voltage,
            temperature: snap.temperature,
            voltage_ok: snap.safety.voltage_ok,
            thermal_ok: snap.safety.thermal_ok,
            thermal_warning: safety::thermal_warning(snap.temperature),
            message: snap.safety.message,
        }),
    }
}
