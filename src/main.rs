//! RedLight firmware entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BoardAdapter          LogDisplay     NvsAdapter  LogEventSink │
//! │  (Reading+LED+Feedback) (DisplaySink) (Persist)   (EventSink)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  Safety · Session FSM · UI                             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ButtonPad ──▶ ButtonMailbox ──▶ one event per tick            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use redlight::adapters::display::LogDisplay;
use redlight::adapters::hardware::BoardAdapter;
use redlight::adapters::log_sink::LogEventSink;
use redlight::adapters::nvs::NvsAdapter;
use redlight::adapters::time::MonotonicClock;
use redlight::app::controller::Controller;
use redlight::config::SystemConfig;
use redlight::drivers::button::ButtonPad;
use redlight::drivers::hw_init;
use redlight::drivers::watchdog::Watchdog;
use redlight::error::Error;
use redlight::input::BUTTONS;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RedLight v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("║  660nm red + 850nm NIR               ║");
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware peripherals ───────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // LED channels may be in an undefined state: never enter the loop.
        error!("HAL init failed: {}, halting", Error::from(e));
        loop {
            FreeRtos::delay_ms(1_000);
        }
    }
    let watchdog = Watchdog::default();

    // ── 3. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate().map_err(Error::from)?;
    info!(
        "Config: {} min sessions, default mode {}, thermal sensor {}",
        config.session_minutes,
        config.default_mode.name(),
        if config.thermal_sensor_enabled { "on" } else { "off" }
    );

    // ── 4. Persistence ────────────────────────────────────────
    let mut nvs = NvsAdapter::new().unwrap_or_else(|e| {
        warn!("NVS init failed ({}), running without persistence", e);
        NvsAdapter::offline()
    });

    // ── 5. Adapters ───────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut board = BoardAdapter::new(&config);
    let mut display = LogDisplay::new();
    let mut sink = LogEventSink::new();
    let mut buttons = ButtonPad::new(&config);

    // ── 6. Controller ─────────────────────────────────────────
    let mut controller = Controller::new(config.clone());
    controller.restore(&nvs);
    let boot_ms = clock.now_ms();
    board.poll_sensors(boot_ms);
    controller.start(boot_ms, &mut board, &mut sink);

    info!("System ready. Entering control loop ({} ms).", config.control_loop_interval_ms);

    // ── 7. Control loop ───────────────────────────────────────
    let interval_ms = u64::from(config.control_loop_interval_ms);
    loop {
        let now_ms = clock.now_ms();

        buttons.poll_into(now_ms, &BUTTONS);
        board.poll_sensors(now_ms);
        controller.tick(now_ms, BUTTONS.take(), &mut board, &mut display, &mut nvs, &mut sink);
        board.service_feedback(now_ms);

        watchdog.feed();

        let spent = clock.now_ms().saturating_sub(now_ms);
        FreeRtos::delay_ms(interval_ms.saturating_sub(spent).max(1) as u32);
    }
}
