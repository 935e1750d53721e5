//! Audible feedback vocabulary.
//!
//! The controller only ever names one of these tones; the buzzer driver
//! turns them into PWM on its own schedule.

pub const TONE_START_HZ: u16 = 1_000;
pub const TONE_STOP_HZ: u16 = 500;
pub const TONE_WARNING_HZ: u16 = 2_000;
pub const TONE_COMPLETE_HZ: u16 = 1_500;
pub const TONE_BUTTON2_HZ: u16 = 1_200;

/// Number of beeps in the emergency alarm.
pub const ALARM_BEEPS: usize = 5;

/// One buzzer request: play `frequency_hz` for `duration_ms`, then stay
/// silent for `pause_ms` before the next queued tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u16,
    pub duration_ms: u16,
    pub pause_ms: u16,
}

impl Tone {
    pub const fn new(frequency_hz: u16, duration_ms: u16) -> Self {
        Self { frequency_hz, duration_ms, pause_ms: 0 }
    }

    pub const fn with_pause(self, pause_ms: u16) -> Self {
        Self { pause_ms, ..self }
    }

    // ── Named tones ───────────────────────────────────────────

    pub const BOOT: Self = Self::new(TONE_START_HZ, 100);
    pub const START: Self = Self::new(TONE_START_HZ, 200);
    pub const STOP: Self = Self::new(TONE_STOP_HZ, 200);
    /// Played twice on normal completion.
    pub const COMPLETE: Self = Self::new(TONE_COMPLETE_HZ, 500).with_pause(200);
    pub const REJECT: Self = Self::new(TONE_WARNING_HZ, 200);
    pub const WARNING: Self = Self::new(TONE_WARNING_HZ, 100);
    pub const CLICK_1: Self = Self::new(TONE_START_HZ, 50);
    pub const CLICK_2: Self = Self::new(TONE_BUTTON2_HZ, 50);
    pub const ALARM_BEEP: Self = Self::new(TONE_WARNING_HZ, 200).with_pause(200);

    /// Pitch rises with the mode's position in the cycle.
    pub const fn mode_change(mode_index: u8) -> Self {
        Self::new(TONE_START_HZ + mode_index as u16 * 200, 100)
    }

    /// True for the emergency alarm beep, which preempts queued tones.
    pub fn is_alarm(&self) -> bool {
        *self == Self::ALARM_BEEP
    }
}

/// The emergency alarm pattern.
pub const fn alarm_pattern() -> [Tone; ALARM_BEEPS] {
    [Tone::ALARM_BEEP; ALARM_BEEPS]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_change_pitch_climbs() {
        assert_eq!(Tone::mode_change(1).frequency_hz, 1_200);
        assert_eq!(Tone::mode_change(4).frequency_hz, 1_800);
    }

    #[test]
    fn reject_differs_from_start() {
        assert_ne!(Tone::REJECT, Tone::START);
        assert!(!Tone::REJECT.is_alarm());
        assert!(alarm_pattern().iter().all(Tone::is_alarm));
    }
}
