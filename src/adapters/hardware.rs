//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the treatment LED pair, the buzzer sequencer
//! and the backlight blinker, exposing them through [`ReadingSource`],
//! [`LedDriver`] and [`FeedbackSink`]. On non-espidf targets the
//! underlying drivers fall through to the `hw_init` simulation stubs.

use crate::app::ports::{FeedbackSink, LedDriver, ReadingSource};
use crate::config::SystemConfig;
use crate::drivers::blink::Blinker;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::hw_init::{self, PwmChannel, LEDC_CH_NIR, LEDC_CH_RED};
use crate::drivers::led_channels::LedChannels;
use crate::feedback::Tone;
use crate::pins;
use crate::safety::Temperature;
use crate::sensors::SensorHub;

pub type BoardLeds = LedChannels<PwmChannel, PwmChannel>;

/// Concrete adapter that combines all board hardware behind port traits.
pub struct BoardAdapter {
    sensors: SensorHub,
    leds: BoardLeds,
    buzzer: Buzzer,
    blinker: Blinker,
    last_service_ms: Option<u64>,
    sounding_hz: u16,
    backlight_on: bool,
}

impl BoardAdapter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sensors: SensorHub::new(config),
            leds: LedChannels::new(PwmChannel::new(LEDC_CH_RED), PwmChannel::new(LEDC_CH_NIR)),
            buzzer: Buzzer::new(config.buzzer_enabled),
            blinker: Blinker::new(),
            last_service_ms: None,
            sounding_hz: 0,
            backlight_on: true,
        }
    }

    /// Refresh cached readings whose sample interval has elapsed.
    pub fn poll_sensors(&mut self, now_ms: u64) {
        self.sensors.poll(now_ms);
    }

    /// Advance the buzzer and blink sequencers. Call once per control tick.
    pub fn service_feedback(&mut self, now_ms: u64) {
        let delta = self
            .last_service_ms
            .map_or(0, |last| now_ms.saturating_sub(last))
            .min(u64::from(u32::MAX)) as u32;
        self.last_service_ms = Some(now_ms);

        let hz = self.buzzer.tick(delta);
        if hz != self.sounding_hz {
            hw_init::buzzer_tone(hz);
            self.sounding_hz = hz;
        }

        let lit = self.blinker.tick(delta);
        if lit != self.backlight_on {
            hw_init::gpio_write(pins::TFT_BACKLIGHT_GPIO, lit);
            self.backlight_on = lit;
        }
    }
}

// ── ReadingSource ─────────────────────────────────────────────

impl ReadingSource for BoardAdapter {
    fn voltage(&mut self) -> f32 {
        self.sensors.readings().voltage
    }

    fn temperature(&mut self) -> Temperature {
        self.sensors.readings().temperature
    }
}

// ── LedDriver ─────────────────────────────────────────────────

impl LedDriver for BoardAdapter {
    fn set_channels(&mut self, red: u8, nir: u8) {
        self.leds.set_channels(red, nir);
    }
}

// ── FeedbackSink ──────────────────────────────────────────────

impl FeedbackSink for BoardAdapter {
    fn tone(&mut self, tone: Tone) {
        self.buzzer.enqueue(tone);
    }

    fn blink(&mut self, count: u8) {
        self.blinker.start(count);
    }
}
