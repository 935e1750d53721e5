//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production). The level follows
//! severity: emergencies at `error`, rejections and warnings at `warn`,
//! everything else at `info`.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::safety::Temperature;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let temp = match t.temperature {
                    Temperature::Celsius(c) => c,
                    Temperature::Absent => f32::NAN,
                };
                info!(
                    "TELEM | state={:?} mode={} | V={:.2} ({}%) | T={:.1}\u{00b0}C | \
                     red={} nir={} br={} | t={}s | today={} total={} ({} min) | ticks={}",
                    t.state,
                    t.mode.name(),
                    t.voltage,
                    t.battery_percent,
                    temp,
                    t.duties.red,
                    t.duties.nir,
                    t.brightness,
                    t.elapsed_secs,
                    t.daily_sessions,
                    t.lifetime_sessions,
                    t.lifetime_minutes,
                    t.tick_count,
                );
            }
            AppEvent::Started(mode) => {
                info!("START | mode={}", mode.name());
            }
            AppEvent::SessionStarted { mode, daily_count } => {
                info!("SESSION | started mode={} today={}", mode.name(), daily_count);
            }
            AppEvent::SessionStopped { reason, elapsed_secs, minutes } => {
                info!(
                    "SESSION | stopped reason={:?} elapsed={}s credited={}min",
                    reason, elapsed_secs, minutes
                );
            }
            AppEvent::StartRejected(err) => {
                warn!("SESSION | start rejected: {}", err);
            }
            AppEvent::EmergencyStop(err) => {
                error!("EMERGENCY | {} | channels off", err);
            }
            AppEvent::EmergencyCleared => {
                info!("EMERGENCY | condition cleared");
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE | {} ({})", mode.name(), mode.description());
            }
            AppEvent::LowBattery { voltage } => {
                warn!("BATTERY | low {:.2}V", voltage);
            }
            AppEvent::ThermalWarning { celsius } => {
                warn!("THERMAL | {:.1}\u{00b0}C, derating", celsius);
            }
        }
    }
}
