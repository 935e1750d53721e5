//! Count-blink pattern generator.
//!
//! `start(n)` schedules `n` dark pulses; `tick()` returns whether the
//! indicator should currently be lit. On this board the indicator is the
//! TFT backlight, so the resting level is ON and each blink is a short
//! dark gap.

/// Length of each dark pulse and of the lit gap between pulses.
pub const BLINK_HALF_PERIOD_MS: u32 = 150;

#[derive(Debug, Default)]
pub struct Blinker {
    /// Remaining half-periods (dark, lit, dark, …).
    remaining: u16,
    phase_ms: u32,
}

impl Blinker {
    pub const fn new() -> Self {
        Self { remaining: 0, phase_ms: 0 }
    }

    /// Restart the pattern with `count` blinks. `0` cancels.
    pub fn start(&mut self, count: u8) {
        self.remaining = (u16::from(count) * 2).saturating_sub(1);
        self.phase_ms = 0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Advance by `delta_ms`; returns `true` while the indicator is lit.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.phase_ms += delta_ms;
        while self.phase_ms >= BLINK_HALF_PERIOD_MS && self.remaining > 0 {
            self.phase_ms -= BLINK_HALF_PERIOD_MS;
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            self.phase_ms = 0;
            return true;
        }
        // Odd remaining counts are dark half-periods.
        self.remaining % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_blinker_stays_lit() {
        let mut b = Blinker::new();
        assert!(b.tick(1_000));
        assert!(!b.is_active());
    }

    #[test]
    fn counts_dark_pulses() {
        let mut b = Blinker::new();
        b.start(2);
        let mut dark_edges = 0;
        let mut lit = true;
        for _ in 0..40 {
            let now = b.tick(20);
            if lit && !now {
                dark_edges += 1;
            }
            lit = now;
        }
        assert_eq!(dark_edges, 2);
        assert!(lit);
        assert!(!b.is_active());
    }

    #[test]
    fn zero_cancels() {
        let mut b = Blinker::new();
        b.start(3);
        b.start(0);
        assert!(!b.is_active());
        assert!(b.tick(10));
    }
}
