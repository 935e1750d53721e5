//! Integration tests for the button → controller → session → actuator chain.
//!
//! A [`Rig`] wires one [`Controller`] to recording mocks and drives it one
//! tick at a time with a synthetic clock, the way the firmware main loop does.

use crate::mock_hw::{MockBoard, MockDisplay, MockStore, RecordingSink};

use redlight::app::controller::Controller;
use redlight::app::events::AppEvent;
use redlight::app::ports::PersistedState;
use redlight::config::SystemConfig;
use redlight::error::SafetyError;
use redlight::feedback::Tone;
use redlight::mode::TreatmentMode;
use redlight::safety::{Temperature, MIN_GAP_SEC};
use redlight::session::context::{StopReason, DAY_MS};
use redlight::session::StateId;
use redlight::ui::views::{AlertView, View};
use redlight::ui::{ButtonEvent, Overlay, Screen};

const TICK_MS: u64 = 20;
const BOOT_MS: u64 = 1_000;

struct Rig {
    ctl: Controller,
    board: MockBoard,
    display: MockDisplay,
    store: MockStore,
    sink: RecordingSink,
    now: u64,
}

impl Rig {
    fn new() -> Self {
        Self::with(SystemConfig::default(), MockStore::default())
    }

    fn with(config: SystemConfig, store: MockStore) -> Self {
        let mut ctl = Controller::new(config);
        ctl.restore(&store);
        let mut board = MockBoard::new();
        let mut sink = RecordingSink::default();
        ctl.start(BOOT_MS, &mut board, &mut sink);
        Self { ctl, board, display: MockDisplay::default(), store, sink, now: BOOT_MS }
    }

    fn step(&mut self, button: ButtonEvent) {
        self.ctl.tick(
            self.now,
            button,
            &mut self.board,
            &mut self.display,
            &mut self.store,
            &mut self.sink,
        );
    }

    /// One 20 ms tick carrying `button`.
    fn press(&mut self, button: ButtonEvent) {
        self.now += TICK_MS;
        self.step(button);
    }

    fn idle(&mut self) {
        self.press(ButtonEvent::None);
    }

    /// Tick once per second for `ms`.
    fn wait(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end {
            self.now = (self.now + 1_000).min(end);
            self.step(ButtonEvent::None);
        }
    }

    /// Jump the clock by `ms` and tick once, as after a stalled loop.
    fn jump(&mut self, ms: u64) {
        self.now += ms;
        self.step(ButtonEvent::None);
    }

    fn events(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.sink.count(pred)
    }

    /// Start from the current screen, run for a minute, stop, then wait out
    /// the inter-session gap.
    fn short_session(&mut self) {
        self.press(ButtonEvent::Button1Short);
        assert_eq!(self.ctl.state(), StateId::Active);
        self.wait(60_000);
        self.press(ButtonEvent::Button1Short);
        assert_eq!(self.ctl.state(), StateId::Idle);
        self.jump(MIN_GAP_SEC * 1_000);
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boots_idle_and_dark() {
    let mut rig = Rig::new();

    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.ctl.mode(), TreatmentMode::Dual);
    assert_eq!(rig.board.channels(), (0, 0));
    assert_eq!(rig.board.tones(), vec![Tone::BOOT]);
    assert_eq!(rig.sink.events, vec![AppEvent::Started(TreatmentMode::Dual)]);

    rig.idle();
    assert!(matches!(rig.display.last(), Some(View::Home(h)) if h.ready));
}

#[test]
fn restore_adopts_stored_counters_and_mode() {
    let store = MockStore::with_record(PersistedState::new(7, 140, TreatmentMode::NirOnly));
    let rig = Rig::with(SystemConfig::default(), store);

    assert_eq!(rig.ctl.mode(), TreatmentMode::NirOnly);
    assert_eq!(rig.ctl.counters().lifetime_sessions, 7);
    assert_eq!(rig.ctl.counters().lifetime_minutes, 140);
    assert_eq!(rig.ctl.counters().daily_session_count, 0);
    assert_eq!(rig.ctl.ui().current_mode, TreatmentMode::NirOnly);
    assert_eq!(rig.sink.events, vec![AppEvent::Started(TreatmentMode::NirOnly)]);
}

#[test]
fn stored_off_mode_falls_back_to_default() {
    let record = PersistedState { lifetime_sessions: 2, lifetime_minutes: 40, mode: 0 };
    let rig = Rig::with(SystemConfig::default(), MockStore::with_record(record));

    assert_eq!(rig.ctl.mode(), TreatmentMode::Dual);
    assert_eq!(rig.ctl.counters().lifetime_sessions, 2);
    assert_eq!(rig.ctl.counters().lifetime_minutes, 40);
}

#[test]
fn corrupt_record_boots_with_defaults() {
    let store = MockStore { corrupt: true, ..MockStore::default() };
    let rig = Rig::with(SystemConfig::default(), store);

    assert_eq!(rig.ctl.mode(), TreatmentMode::Dual);
    assert_eq!(rig.ctl.counters().lifetime_sessions, 0);
    assert_eq!(rig.ctl.counters().lifetime_minutes, 0);
    assert_eq!(rig.ctl.state(), StateId::Idle);
}

// ── Start / stop ──────────────────────────────────────────────

#[test]
fn button_starts_and_stops_session() {
    let mut rig = Rig::new();

    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Active);
    assert_eq!(rig.board.channels(), (255, 255));
    assert_eq!(rig.board.count_tone(Tone::START), 1);
    assert_eq!(rig.ctl.ui().current_screen, Screen::Session);
    assert_eq!(
        rig.events(|e| *e == AppEvent::SessionStarted { mode: TreatmentMode::Dual, daily_count: 1 }),
        1
    );
    assert_eq!(rig.store.record.map(|r| r.lifetime_sessions), Some(1));

    rig.wait(90_000);
    assert_eq!(rig.ctl.elapsed_secs(), 90);

    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.board.channels(), (0, 0));
    assert_eq!(rig.board.count_tone(Tone::STOP), 1);
    assert_eq!(rig.ctl.counters().lifetime_minutes, 1);
    assert_eq!(
        rig.events(|e| matches!(
            e,
            AppEvent::SessionStopped { reason: StopReason::User, elapsed_secs: 90, minutes: 1 }
        )),
        1
    );
    assert_eq!(rig.store.record.map(|r| r.lifetime_minutes), Some(1));
}

#[test]
fn session_completes_at_configured_length() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);

    rig.jump(20 * 60 * 1_000);
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.board.channels(), (0, 0));
    assert_eq!(rig.board.count_tone(Tone::COMPLETE), 2);
    assert_eq!(rig.board.count_tone(Tone::STOP), 0);
    assert_eq!(rig.ctl.counters().lifetime_minutes, 20);
    assert_eq!(rig.store.record.map(|r| r.lifetime_minutes), Some(20));
    assert_eq!(
        rig.events(|e| matches!(
            e,
            AppEvent::SessionStopped { reason: StopReason::Completed, elapsed_secs: 1_200, minutes: 20 }
        )),
        1
    );
    assert_eq!(
        rig.display.last(),
        Some(&View::Alert(AlertView { title: "COMPLETE", message: "Session Complete" }))
    );

    // The alert drops by itself after its display time.
    rig.wait(2_100);
    assert_eq!(rig.ctl.ui().overlay, None);
    assert!(matches!(rig.display.last(), Some(View::Session(_))));
}

#[test]
fn thirty_minute_session_hits_the_ceiling() {
    let config = SystemConfig { session_minutes: 30, ..SystemConfig::default() };
    let mut rig = Rig::with(config, MockStore::default());
    rig.press(ButtonEvent::Button1Short);

    rig.jump(30 * 60 * 1_000);
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.board.count_tone(Tone::STOP), 1);
    assert_eq!(rig.board.count_tone(Tone::COMPLETE), 0);
    assert_eq!(
        rig.events(|e| matches!(e, AppEvent::SessionStopped { reason: StopReason::SafetyCeiling, .. })),
        1
    );
    assert!(matches!(rig.display.last(), Some(View::Alert(a)) if a.title == "SAFETY STOP"));
    // Not an emergency: no alarm, no latch.
    assert_eq!(rig.board.alarm_beeps(), 0);
    assert_eq!(rig.ctl.emergency(), None);
}

// ── Session rules ─────────────────────────────────────────────

#[test]
fn fourth_session_in_a_day_is_rejected() {
    let mut rig = Rig::new();
    for _ in 0..3 {
        rig.short_session();
    }
    assert_eq!(rig.ctl.counters().daily_session_count, 3);

    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.board.channels(), (0, 0));
    assert_eq!(rig.board.count_tone(Tone::START), 3);
    assert_eq!(rig.board.count_tone(Tone::REJECT), 1);
    assert_eq!(
        rig.events(|e| *e == AppEvent::StartRejected(SafetyError::DailyLimit)),
        1
    );

    // A new daily window clears the count.
    rig.jump(DAY_MS);
    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Active);
    assert_eq!(rig.ctl.counters().daily_session_count, 1);
    assert_eq!(rig.ctl.counters().lifetime_sessions, 4);
}

#[test]
fn gap_rule_blocks_early_restart() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);
    rig.wait(60_000);
    rig.press(ButtonEvent::Button1Short);

    rig.jump(10 * 60 * 1_000);
    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(
        rig.events(|e| *e == AppEvent::StartRejected(SafetyError::SessionGap)),
        1
    );

    rig.jump(MIN_GAP_SEC * 1_000);
    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Active);
}

// ── Emergencies ───────────────────────────────────────────────

#[test]
fn overvoltage_stops_running_session() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);
    rig.wait(5_000);

    rig.board.voltage = 8.9;
    rig.idle();
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.board.channels(), (0, 0));
    assert_eq!(rig.ctl.emergency(), Some(SafetyError::Overvoltage));
    assert_eq!(rig.board.alarm_beeps(), 5);
    assert_eq!(rig.board.count_tone(Tone::STOP), 0);
    assert_eq!(
        rig.events(|e| *e == AppEvent::EmergencyStop(SafetyError::Overvoltage)),
        1
    );
    assert_eq!(
        rig.events(|e| matches!(
            e,
            AppEvent::SessionStopped { reason: StopReason::Emergency(SafetyError::Overvoltage), .. }
        )),
        1
    );
    assert!(matches!(rig.display.last(), Some(View::Emergency(v)) if v.error == SafetyError::Overvoltage));
}

#[test]
fn persistent_fault_alarms_once_and_ignores_buttons() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);

    rig.board.voltage = 8.9;
    for _ in 0..10 {
        rig.idle();
    }
    rig.press(ButtonEvent::Button1Short);
    rig.press(ButtonEvent::Button2Short);

    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.board.alarm_beeps(), 5);
    assert_eq!(rig.board.count_tone(Tone::START), 1);
    assert_eq!(rig.events(|e| matches!(e, AppEvent::EmergencyStop(_))), 1);
    assert!(rig.ctl.ui().emergency_shown());
    assert_eq!(rig.board.channels(), (0, 0));
}

#[test]
fn cleared_fault_keeps_overlay_until_acknowledged() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);
    rig.board.voltage = 8.9;
    rig.idle();

    rig.board.voltage = 7.4;
    rig.idle();
    assert_eq!(rig.ctl.emergency(), None);
    assert_eq!(rig.events(|e| *e == AppEvent::EmergencyCleared), 1);
    assert!(rig.ctl.ui().emergency_shown());

    // The first press only dismisses the overlay.
    rig.press(ButtonEvent::Button2Short);
    assert_eq!(rig.ctl.ui().overlay, None);
    assert_eq!(rig.ctl.ui().current_screen, Screen::Session);

    // The aborted session counts for the gap rule.
    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(
        rig.events(|e| *e == AppEvent::StartRejected(SafetyError::SessionGap)),
        1
    );
}

#[test]
fn each_fault_episode_raises_its_own_alarm() {
    let mut rig = Rig::new();

    rig.board.voltage = 6.0;
    rig.idle();
    rig.idle();
    assert_eq!(rig.ctl.emergency(), Some(SafetyError::Undervoltage));
    assert_eq!(rig.board.alarm_beeps(), 5);
    // No session was running, so nothing stopped.
    assert_eq!(rig.events(|e| matches!(e, AppEvent::SessionStopped { .. })), 0);

    rig.board.voltage = 7.4;
    rig.idle();
    rig.board.voltage = 6.0;
    rig.idle();
    assert_eq!(rig.board.alarm_beeps(), 10);
    assert_eq!(rig.events(|e| matches!(e, AppEvent::EmergencyStop(_))), 2);
}

#[test]
fn over_temperature_is_an_emergency() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);

    rig.board.temperature = Temperature::Celsius(46.0);
    rig.idle();
    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.ctl.emergency(), Some(SafetyError::Thermal));
    assert_eq!(rig.board.channels(), (0, 0));
}

// ── Warnings ──────────────────────────────────────────────────

#[test]
fn warm_device_derates_output_and_warns_once() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);

    rig.board.temperature = Temperature::Celsius(42.5);
    rig.idle();
    rig.idle();
    assert_eq!(rig.ctl.state(), StateId::Active);
    assert_eq!(rig.board.channels(), (191, 191));
    assert_eq!(rig.events(|e| matches!(e, AppEvent::ThermalWarning { .. })), 1);
    assert_eq!(rig.board.count_tone(Tone::WARNING), 1);

    // Inside the hysteresis band the derated level holds.
    rig.board.temperature = Temperature::Celsius(38.0);
    rig.idle();
    assert_eq!(rig.board.channels(), (191, 191));

    rig.board.temperature = Temperature::Celsius(30.0);
    rig.idle();
    assert_eq!(rig.board.channels(), (255, 255));
}

#[test]
fn thermal_warning_ignores_dither_at_threshold() {
    let mut rig = Rig::new();
    let warnings = |rig: &Rig| rig.events(|e| matches!(e, AppEvent::ThermalWarning { .. }));

    for i in 0..10 {
        rig.board.temperature = Temperature::Celsius(if i % 2 == 0 { 40.0 } else { 39.9 });
        rig.idle();
    }
    assert_eq!(warnings(&rig), 1);
    assert_eq!(rig.board.count_tone(Tone::WARNING), 1);

    // Still inside the band: no re-arm.
    rig.board.temperature = Temperature::Celsius(35.0);
    rig.idle();
    rig.board.temperature = Temperature::Celsius(40.0);
    rig.idle();
    assert_eq!(warnings(&rig), 1);

    // Below the band the warning re-arms.
    rig.board.temperature = Temperature::Celsius(34.0);
    rig.idle();
    rig.board.temperature = Temperature::Celsius(40.0);
    rig.idle();
    assert_eq!(warnings(&rig), 2);
    assert_eq!(rig.board.count_tone(Tone::WARNING), 2);
}

#[test]
fn low_battery_warns_on_each_falling_edge() {
    let mut rig = Rig::new();

    rig.board.voltage = 6.6;
    for _ in 0..5 {
        rig.idle();
    }
    assert_eq!(rig.events(|e| matches!(e, AppEvent::LowBattery { .. })), 1);
    assert_eq!(rig.board.count_tone(Tone::WARNING), 1);
    assert_eq!(rig.ctl.emergency(), None);

    rig.board.voltage = 7.4;
    rig.idle();
    rig.board.voltage = 6.6;
    rig.idle();
    assert_eq!(rig.events(|e| matches!(e, AppEvent::LowBattery { .. })), 2);
}

// ── Modes and settings ────────────────────────────────────────

#[test]
fn settings_screen_confirms_new_mode() {
    let mut rig = Rig::new();
    for _ in 0..3 {
        rig.press(ButtonEvent::Button2Short);
    }
    assert_eq!(rig.ctl.ui().current_screen, Screen::Settings);
    assert_eq!(rig.board.count_tone(Tone::CLICK_2), 3);

    rig.press(ButtonEvent::Button2Short);
    assert_eq!(rig.ctl.ui().selected_mode, TreatmentMode::Alternating);
    assert_eq!(rig.ctl.mode(), TreatmentMode::Dual, "selection alone changes nothing");

    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.mode(), TreatmentMode::Alternating);
    assert_eq!(rig.board.count_tone(Tone::mode_change(4)), 1);
    assert_eq!(rig.board.blinks(), vec![4]);
    assert_eq!(
        rig.events(|e| *e == AppEvent::ModeChanged(TreatmentMode::Alternating)),
        1
    );
    assert_eq!(rig.store.record.map(|r| r.mode), Some(TreatmentMode::Alternating.as_u8()));

    // Confirming returns to Home; starting there opens on the red phase.
    assert_eq!(rig.ctl.ui().current_screen, Screen::Home);
    rig.idle();
    assert!(matches!(rig.display.last(), Some(View::Home(_))));
    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Active);
    assert_eq!(rig.board.channels(), (255, 0));
}

#[test]
fn long_press_on_home_cycles_mode() {
    let mut rig = Rig::new();

    rig.press(ButtonEvent::Button1Long);
    assert_eq!(rig.ctl.mode(), TreatmentMode::Alternating);
    rig.press(ButtonEvent::Button1Long);
    assert_eq!(rig.ctl.mode(), TreatmentMode::RedOnly);
    assert_eq!(rig.board.blinks(), vec![4, 1]);
    assert_eq!(rig.store.saves, 2);

    // Ignored while a session runs.
    rig.press(ButtonEvent::Button1Short);
    rig.press(ButtonEvent::Button1Long);
    assert_eq!(rig.ctl.mode(), TreatmentMode::RedOnly);
    assert_eq!(rig.board.channels(), (255, 0));
}

#[test]
fn alternating_session_flips_channels() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Long);
    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.board.channels(), (255, 0));

    rig.wait(30_000);
    assert_eq!(rig.board.channels(), (0, 255));
    rig.wait(30_000);
    assert_eq!(rig.board.channels(), (255, 0));
}

#[test]
fn switching_to_alternating_mid_session_starts_on_red() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);
    rig.wait(45_000);

    // Session → Stats → Settings, select Alternating, confirm.
    rig.press(ButtonEvent::Button2Short);
    rig.press(ButtonEvent::Button2Short);
    assert_eq!(rig.ctl.ui().current_screen, Screen::Settings);
    rig.press(ButtonEvent::Button2Short);
    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.mode(), TreatmentMode::Alternating);
    assert_eq!(rig.ctl.state(), StateId::Active);
    assert_eq!(rig.board.channels(), (255, 0));

    rig.wait(29_000);
    assert_eq!(rig.board.channels(), (255, 0));
    rig.wait(1_000);
    assert_eq!(rig.board.channels(), (0, 255));
}

#[test]
fn overlay_swallows_first_press() {
    let mut rig = Rig::new();
    rig.press(ButtonEvent::Button1Short);
    rig.jump(20 * 60 * 1_000);
    assert!(matches!(rig.ctl.ui().overlay, Some(Overlay::Alert { .. })));

    rig.press(ButtonEvent::Button2Short);
    assert_eq!(rig.ctl.ui().overlay, None);
    assert_eq!(rig.ctl.ui().current_screen, Screen::Session);

    rig.press(ButtonEvent::Button2Short);
    assert_eq!(rig.ctl.ui().current_screen, Screen::Stats);
}

// ── Persistence and telemetry ─────────────────────────────────

#[test]
fn failed_save_does_not_disturb_session() {
    let store = MockStore { fail_saves: true, ..MockStore::default() };
    let mut rig = Rig::with(SystemConfig::default(), store);

    rig.press(ButtonEvent::Button1Short);
    assert_eq!(rig.ctl.state(), StateId::Active);
    rig.wait(61_000);
    rig.press(ButtonEvent::Button1Short);

    assert_eq!(rig.ctl.state(), StateId::Idle);
    assert_eq!(rig.ctl.counters().lifetime_sessions, 1);
    assert_eq!(rig.ctl.counters().lifetime_minutes, 1);
    assert_eq!(rig.store.saves, 0);
    assert_eq!(rig.store.record, None);
}

#[test]
fn telemetry_follows_configured_interval() {
    let mut rig = Rig::new();
    rig.wait(29_000);
    assert_eq!(rig.events(|e| matches!(e, AppEvent::Telemetry(_))), 0);

    rig.wait(1_000);
    assert_eq!(rig.events(|e| matches!(e, AppEvent::Telemetry(_))), 1);
    let Some(AppEvent::Telemetry(t)) = rig.sink.events.last() else {
        panic!("telemetry expected last");
    };
    assert_eq!(t.state, StateId::Idle);
    assert_eq!(t.mode, TreatmentMode::Dual);
    assert_eq!(t.lifetime_sessions, 0);

    rig.wait(60_000);
    assert_eq!(rig.events(|e| matches!(e, AppEvent::Telemetry(_))), 3);
}
