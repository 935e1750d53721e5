//! Non-blocking tone sequencer for the passive buzzer.
//!
//! Tones are queued by the controller and played back by `tick()`, called
//! each control cycle with the elapsed milliseconds. The caller drives the
//! LEDC output with the returned frequency (0 = silent).
//!
//! ## Priority
//!
//! Alarm beeps preempt: enqueueing one cuts the tone currently sounding
//! and drops everything queued that is not itself an alarm beep.

use heapless::Deque;
use log::warn;

use crate::feedback::Tone;

/// Queue depth. Sized for the longest burst queued in a single tick
/// (alarm pattern plus completion chime).
pub const TONE_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Sounding { tone: Tone, remaining_ms: u32 },
    Pause { remaining_ms: u32 },
}

pub struct Buzzer {
    queue: Deque<Tone, TONE_QUEUE_DEPTH>,
    step: Option<Step>,
    enabled: bool,
}

impl Buzzer {
    pub fn new(enabled: bool) -> Self {
        Self { queue: Deque::new(), step: None, enabled }
    }

    /// Queue a tone. Returns `false` if it was dropped (muted or full).
    pub fn enqueue(&mut self, tone: Tone) -> bool {
        if !self.enabled {
            return false;
        }
        if tone.is_alarm() {
            self.preempt();
        }
        if self.queue.push_back(tone).is_err() {
            warn!("Buzzer: queue full, dropped {} Hz", tone.frequency_hz);
            return false;
        }
        true
    }

    /// Advance playback by `delta_ms` and return the frequency to output.
    pub fn tick(&mut self, delta_ms: u32) -> u16 {
        let mut budget = delta_ms;
        loop {
            match self.step {
                None => {
                    let Some(tone) = self.queue.pop_front() else {
                        return 0;
                    };
                    self.step = Some(Step::Sounding {
                        tone,
                        remaining_ms: u32::from(tone.duration_ms),
                    });
                }
                Some(Step::Sounding { tone, remaining_ms }) => {
                    if budget < remaining_ms {
                        self.step = Some(Step::Sounding { tone, remaining_ms: remaining_ms - budget });
                        return tone.frequency_hz;
                    }
                    budget -= remaining_ms;
                    self.step = (tone.pause_ms > 0)
                        .then(|| Step::Pause { remaining_ms: u32::from(tone.pause_ms) });
                }
                Some(Step::Pause { remaining_ms }) => {
                    if budget < remaining_ms {
                        self.step = Some(Step::Pause { remaining_ms: remaining_ms - budget });
                        return 0;
                    }
                    budget -= remaining_ms;
                    self.step = None;
                }
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.step.is_none() && self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn preempt(&mut self) {
        if let Some(Step::Sounding { tone, .. }) = self.step {
            if !tone.is_alarm() {
                self.step = None;
            }
        }
        let mut kept: Deque<Tone, TONE_QUEUE_DEPTH> = Deque::new();
        while let Some(t) = self.queue.pop_front() {
            if t.is_alarm() {
                let _ = kept.push_back(t);
            }
        }
        self.queue = kept;
    }
}
