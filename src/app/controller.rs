//! Controller loop: the hexagonal core.
//!
//! [`Controller`] owns the session FSM, its context and the UI state. Each
//! call to [`Controller::tick`] runs one full control cycle; all I/O flows
//! through port traits injected at the call site, so the whole loop runs
//! against mock adapters on the host.
//!
//! ```text
//!  ReadingSource ──▶ ┌──────────────────────────┐ ──▶ LedDriver
//!  ButtonEvent   ──▶ │        Controller        │ ──▶ FeedbackSink
//!                    │ Safety · Session · UI    │ ──▶ DisplaySink
//!                    └──────────────────────────┘ ──▶ PersistencePort
//!                                                 ──▶ EventSink
//! ```
//!
//! ## Tick order
//!
//! 1. Read cached readings, roll the daily window, evaluate safety.
//! 2. Critical verdict → emergency stop; buttons are discarded.
//! 3. Otherwise: UI handles the button, the action is dispatched.
//! 4. Session FSM tick; notices become tones, events and saves.
//! 5. LED duties written (every tick, idempotent).
//! 6. Display render when dirty or the refresh interval elapsed.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::error::SafetyError;
use crate::feedback::{self, Tone};
use crate::mode::{ChannelDuties, TreatmentMode};
use crate::safety::{self, SafetyStatus};
use crate::session::context::{Readings, SessionContext, SessionCounters, SessionNotice, StopReason};
use crate::session::{SessionFsm, StateId};
use crate::ui::views::{self, Snapshot, View};
use crate::ui::{AlertKind, ButtonEvent, Overlay, UiAction, UiState};

use super::events::{AppEvent, TelemetryData};
use super::ports::{
    DisplaySink, EventSink, FeedbackSink, LedDriver, PersistedState, PersistencePort,
    ReadingSource, StorageError,
};

pub struct Controller {
    fsm: SessionFsm,
    ctx: SessionContext,
    ui: UiState,
    /// Set while a critical condition is present.
    emergency: Option<SafetyError>,
    low_battery: bool,
    thermal_warning: bool,
    last_render_ms: Option<u64>,
    last_telemetry_ms: u64,
}

impl Controller {
    /// Does **not** start the FSM; call [`Self::restore`] then [`Self::start`].
    pub fn new(config: SystemConfig) -> Self {
        let mut ui = UiState::new();
        ui.sync_mode(config.default_mode);
        Self {
            fsm: SessionFsm::new(),
            ctx: SessionContext::new(config),
            ui,
            emergency: None,
            low_battery: false,
            thermal_warning: false,
            last_render_ms: None,
            last_telemetry_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the persisted counters and mode. Missing or corrupt records
    /// leave zero counters and the configured default mode.
    pub fn restore(&mut self, store: &impl PersistencePort) {
        let fallback = self.ctx.config.default_mode;
        match store.load() {
            Ok(rec) => {
                self.ctx.counters.lifetime_sessions = rec.lifetime_sessions;
                self.ctx.counters.lifetime_minutes = rec.lifetime_minutes;
                self.ctx.mode = rec.treatment_mode(fallback);
                if TreatmentMode::from_u8(rec.mode) != Some(self.ctx.mode) {
                    warn!("Stored mode {} invalid, using {}", rec.mode, fallback.name());
                }
                info!(
                    "Restored: {} sessions, {} min, mode {}",
                    rec.lifetime_sessions,
                    rec.lifetime_minutes,
                    self.ctx.mode.name()
                );
            }
            Err(StorageError::NotFound) => info!("No stored state (first boot)"),
            Err(e) => warn!("Stored state unreadable ({}), using defaults", e),
        }
        self.ui.sync_mode(self.ctx.mode);
    }

    /// Enter Idle, de-energise the channels and play the boot tone.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl LedDriver + FeedbackSink),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        self.ctx.counters.day_start_ms = now_ms;
        self.last_telemetry_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        hw.set_channels(0, 0);
        hw.tone(Tone::BOOT);
        sink.emit(&AppEvent::Started(self.ctx.mode));
        info!("Controller started, mode {}", self.ctx.mode.name());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle.
    ///
    /// `hw` satisfies the reading, LED and feedback ports at once, which
    /// avoids a triple mutable borrow of the board adapter.
    pub fn tick(
        &mut self,
        now_ms: u64,
        button: ButtonEvent,
        hw: &mut (impl ReadingSource + LedDriver + FeedbackSink),
        display: &mut impl DisplaySink,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) {
        // 1. Readings + verdict
        let readings = Readings { voltage: hw.voltage(), temperature: hw.temperature() };
        self.ctx.observe(now_ms, readings, self.fsm.is_active());
        self.ui.expire_overlay(now_ms);

        // 2. Critical failures preempt everything else this tick.
        if let Some(err) = self.ctx.safety.critical_error() {
            if button != ButtonEvent::None {
                warn!("Button {:?} ignored during emergency", button);
            }
            self.emergency_stop(err, hw, store, sink);
            self.render_if_due(now_ms, display);
            self.telemetry_if_due(now_ms, sink);
            return;
        }
        if let Some(err) = self.emergency.take() {
            info!("Critical condition cleared ({})", err);
            sink.emit(&AppEvent::EmergencyCleared);
        }

        // 3. UI
        let action = self.ui.handle_button(button);
        self.dispatch(action, button, hw, store, sink);

        // 4. Session
        self.fsm.tick(&mut self.ctx);
        self.drain_notices(hw, store, sink);
        self.check_warnings(readings, hw, sink);

        // 5. Channels
        hw.set_channels(self.ctx.duties.red, self.ctx.duties.nir);

        // 6. Display + telemetry
        self.render_if_due(now_ms, display);
        self.telemetry_if_due(now_ms, sink);
    }

    // ── Emergency ─────────────────────────────────────────────

    /// Idempotent: safe to call every tick while the condition persists.
    fn emergency_stop(
        &mut self,
        err: SafetyError,
        hw: &mut (impl LedDriver + FeedbackSink),
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) {
        let first = self.emergency.is_none();

        if self.fsm.is_active() {
            self.ctx.stop_request = Some(StopReason::Emergency(err));
            self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        }
        self.ctx.start_requested = false;
        self.ctx.duties = ChannelDuties::OFF;
        hw.set_channels(0, 0);

        if self.ui.session_active {
            self.ui.set_session_active(false);
        }
        if self.ui.overlay != Some(Overlay::Emergency(err)) {
            self.ui.show_emergency(err);
        }

        if first {
            error!("EMERGENCY STOP: {}", err);
            sink.emit(&AppEvent::EmergencyStop(err));
            for tone in feedback::alarm_pattern() {
                hw.tone(tone);
            }
        }
        self.emergency = Some(err);

        self.drain_notices(hw, store, sink);
    }

    // ── Action dispatch ───────────────────────────────────────

    fn dispatch(
        &mut self,
        action: UiAction,
        button: ButtonEvent,
        hw: &mut impl FeedbackSink,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) {
        match action {
            UiAction::None => {}
            UiAction::StartSession => {
                if !self.fsm.is_active() {
                    self.ctx.start_requested = true;
                }
            }
            UiAction::StopSession => {
                if self.fsm.is_active() {
                    self.ctx.stop_request = Some(StopReason::User);
                }
            }
            UiAction::ChangeMode | UiAction::ConfirmSetting => {
                let mode = self.ui.current_mode;
                self.ctx.set_mode(mode);
                hw.tone(Tone::mode_change(mode.index()));
                hw.blink(mode.index());
                info!("Mode -> {} ({})", mode.name(), mode.description());
                sink.emit(&AppEvent::ModeChanged(mode));
                self.persist(store);
            }
            UiAction::NavigateNext | UiAction::NavigatePrev | UiAction::SelectSetting => {
                let click = match button {
                    ButtonEvent::Button1Short | ButtonEvent::Button1Long => Tone::CLICK_1,
                    _ => Tone::CLICK_2,
                };
                hw.tone(click);
            }
        }
    }

    // ── Session notices ───────────────────────────────────────

    fn drain_notices(
        &mut self,
        hw: &mut impl FeedbackSink,
        store: &mut impl PersistencePort,
        sink: &mut impl EventSink,
    ) {
        let notices = core::mem::take(&mut self.ctx.notices);
        for notice in notices {
            match notice {
                SessionNotice::Started { mode } => {
                    hw.tone(Tone::START);
                    self.ui.set_session_active(true);
                    sink.emit(&AppEvent::SessionStarted {
                        mode,
                        daily_count: self.ctx.counters.daily_session_count,
                    });
                    self.persist(store);
                }
                SessionNotice::StartRejected(err) => {
                    hw.tone(Tone::REJECT);
                    sink.emit(&AppEvent::StartRejected(err));
                }
                SessionNotice::Stopped { reason, elapsed_secs, minutes } => {
                    let alert_until = self.ctx.now_ms + u64::from(self.ctx.config.alert_duration_ms);
                    match reason {
                        StopReason::User => hw.tone(Tone::STOP),
                        StopReason::Completed => {
                            hw.tone(Tone::COMPLETE);
                            hw.tone(Tone::COMPLETE);
                            self.ui.show_alert(AlertKind::SessionComplete, alert_until);
                        }
                        StopReason::SafetyCeiling => {
                            hw.tone(Tone::STOP);
                            self.ui.show_alert(AlertKind::SessionCeiling, alert_until);
                        }
                        // The alarm pattern already played.
                        StopReason::Emergency(_) => {}
                    }
                    self.ui.set_session_active(false);
                    sink.emit(&AppEvent::SessionStopped { reason, elapsed_secs, minutes });
                    self.persist(store);
                }
            }
        }
    }

    /// Rising-edge advisories: low battery and thermal warning.
    fn check_warnings(
        &mut self,
        readings: Readings,
        hw: &mut impl FeedbackSink,
        sink: &mut impl EventSink,
    ) {
        let low = safety::battery_low(readings.voltage);
        if low && !self.low_battery {
            warn!("Battery low: {:.2}V", readings.voltage);
            hw.tone(Tone::WARNING);
            sink.emit(&AppEvent::LowBattery { voltage: readings.voltage });
        }
        self.low_battery = low;

        // Follows the derating latch so readings dithering around the
        // threshold warn once; re-arms below `T_WARNING - hysteresis`.
        let warm = self.ctx.thermal.is_derating();
        if warm && !self.thermal_warning {
            let celsius = readings.temperature.celsius().unwrap_or_default();
            warn!("Thermal warning: {:.1}\u{00b0}C, derating output", celsius);
            hw.tone(Tone::WARNING);
            sink.emit(&AppEvent::ThermalWarning { celsius });
        }
        self.thermal_warning = warm;
    }

    fn persist(&self, store: &mut impl PersistencePort) {
        let c = &self.ctx.counters;
        let state = PersistedState::new(c.lifetime_sessions, c.lifetime_minutes, self.ctx.mode);
        if let Err(e) = store.save(&state) {
            warn!("Persisting session state failed: {}", e);
        }
    }

    // ── Display / telemetry cadence ───────────────────────────

    fn render_if_due(&mut self, now_ms: u64, display: &mut impl DisplaySink) {
        let refresh = u64::from(self.ctx.config.display_refresh_interval_ms);
        let due = self
            .last_render_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= refresh);
        if self.ui.take_screen_changed() || due {
            display.render(&self.view());
            self.last_render_ms = Some(now_ms);
        }
    }

    fn telemetry_if_due(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        let interval = u64::from(self.ctx.config.telemetry_interval_secs) * 1_000;
        if now_ms.saturating_sub(self.last_telemetry_ms) >= interval {
            self.last_telemetry_ms = now_ms;
            sink.emit(&AppEvent::Telemetry(self.telemetry()));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_session_active(&self) -> bool {
        self.fsm.is_active()
    }

    pub fn mode(&self) -> TreatmentMode {
        self.ctx.mode
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.ctx.counters
    }

    pub fn duties(&self) -> ChannelDuties {
        self.ctx.duties
    }

    pub fn safety_status(&self) -> &SafetyStatus {
        &self.ctx.safety
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn emergency(&self) -> Option<SafetyError> {
        self.emergency
    }

    /// Seconds into the running session; 0 when idle.
    pub fn elapsed_secs(&self) -> u64 {
        if self.fsm.is_active() { self.ctx.elapsed_secs() } else { 0 }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            voltage: self.ctx.readings.voltage,
            temperature: self.ctx.readings.temperature,
            safety: self.ctx.safety,
            session_active: self.fsm.is_active(),
            mode: self.ctx.mode,
            duties: self.ctx.duties,
            elapsed_secs: self.elapsed_secs(),
            session_secs: self.ctx.config.session_secs(),
            brightness: self.ctx.brightness,
            lifetime_sessions: self.ctx.counters.lifetime_sessions,
            lifetime_minutes: self.ctx.counters.lifetime_minutes,
            daily_sessions: self.ctx.counters.daily_session_count,
        }
    }

    pub fn view(&self) -> View {
        views::build_view(&self.ui, &self.snapshot())
    }

    pub fn telemetry(&self) -> TelemetryData {
        TelemetryData {
            state: self.fsm.current_state(),
            mode: self.ctx.mode,
            voltage: self.ctx.readings.voltage,
            battery_percent: safety::battery_percent(self.ctx.readings.voltage),
            temperature: self.ctx.readings.temperature,
            duties: self.ctx.duties,
            brightness: self.ctx.brightness,
            elapsed_secs: self.elapsed_secs(),
            daily_sessions: self.ctx.counters.daily_session_count,
            lifetime_sessions: self.ctx.counters.lifetime_sessions,
            lifetime_minutes: self.ctx.counters.lifetime_minutes,
            tick_count: self.fsm.tick_count(),
        }
    }
}
