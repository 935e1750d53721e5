//! Log-backed display sink.
//!
//! Stands in for the TFT panel driver: each rendered [`View`] becomes one
//! serial line. Identical consecutive frames (the periodic refresh of an
//! unchanged screen) are suppressed.

use log::{debug, info};

use crate::app::ports::DisplaySink;
use crate::ui::views::View;

#[derive(Debug, Default)]
pub struct LogDisplay {
    last: Option<View>,
    frames: u64,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames pushed, including suppressed duplicates.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_view(&self) -> Option<&View> {
        self.last.as_ref()
    }
}

impl DisplaySink for LogDisplay {
    fn render(&mut self, view: &View) {
        self.frames += 1;
        if self.last.as_ref() == Some(view) {
            return;
        }
        self.last = Some(*view);

        match view {
            View::Home(v) => info!(
                "SCREEN | HOME | {} | {:.2}V {}% | {}",
                v.mode.name(),
                v.voltage,
                v.battery_percent,
                if v.ready { "READY" } else { "NOT READY" }
            ),
            View::Session(v) => debug!(
                "SCREEN | SESSION | {} | {}:{:02} / {}:{:02} | R={} N={} {}%",
                v.mode.name(),
                v.elapsed_secs / 60,
                v.elapsed_secs % 60,
                v.total_secs / 60,
                v.total_secs % 60,
                v.red_on,
                v.nir_on,
                v.brightness_percent
            ),
            View::Stats(v) => info!(
                "SCREEN | STATS | today {}/{} | total {} sessions, {} min",
                v.daily_sessions, v.max_daily, v.lifetime_sessions, v.lifetime_minutes
            ),
            View::Settings(v) => info!(
                "SCREEN | SETTINGS | current {} | selected {} [{}]",
                v.current_mode.name(),
                v.selected_mode.name(),
                v.settings_index
            ),
            View::Battery(v) => info!(
                "SCREEN | BATTERY | {:.2}V {}%{}",
                v.voltage,
                v.percent,
                if v.low { " LOW" } else { "" }
            ),
            View::Safety(v) => info!(
                "SCREEN | SAFETY | V {} T {} | {}",
                if v.voltage_ok { "ok" } else { "FAULT" },
                if v.thermal_ok { "ok" } else { "FAULT" },
                v.message
            ),
            View::Alert(v) => info!("SCREEN | {} | {}", v.title, v.message),
            View::Emergency(v) => info!("SCREEN | EMERGENCY | {}", v.message),
        }
    }
}
