//! Treatment LED channel pair.
//!
//! Two PWM outputs (red 660 nm, NIR 850 nm) behind the [`LedDriver`] port.
//! Generic over `embedded_hal::pwm::SetDutyCycle`, so the same driver runs
//! on LEDC channels on target and on recording fakes in tests.
//!
//! Duties arrive on the 0–255 scale and are mapped onto each output's own
//! resolution. A failed write is logged and the channel is forced fully
//! off; a half-applied duty pair is never left running.

use embedded_hal::pwm::SetDutyCycle;
use log::error;

use crate::app::ports::LedDriver;
use crate::mode::ChannelDuties;

pub struct LedChannels<R, N> {
    red: R,
    nir: N,
    current: ChannelDuties,
}

impl<R: SetDutyCycle, N: SetDutyCycle> LedChannels<R, N> {
    pub fn new(red: R, nir: N) -> Self {
        let mut leds = Self { red, nir, current: ChannelDuties::OFF };
        leds.set_channels(0, 0);
        leds
    }

    /// Last duty pair successfully applied.
    pub fn current(&self) -> ChannelDuties {
        self.current
    }

    pub fn release(self) -> (R, N) {
        (self.red, self.nir)
    }
}

impl<R: SetDutyCycle, N: SetDutyCycle> LedDriver for LedChannels<R, N> {
    fn set_channels(&mut self, red: u8, nir: u8) {
        let red_ok = self.red.set_duty_cycle_fraction(u16::from(red), 255).is_ok();
        let nir_ok = self.nir.set_duty_cycle_fraction(u16::from(nir), 255).is_ok();
        if red_ok && nir_ok {
            self.current = ChannelDuties { red, nir };
            return;
        }

        error!("LED: duty write failed (red ok={}, nir ok={}), forcing off", red_ok, nir_ok);
        let _ = self.red.set_duty_cycle_fully_off();
        let _ = self.nir.set_duty_cycle_fully_off();
        self.current = ChannelDuties::OFF;
    }
}
