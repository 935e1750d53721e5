//! Battery voltage monitor (2S Li-ion pack through the board divider).
//!
//! ADC1 CH3, 12-bit, 3.3 V full scale. The divider scales the 8.4 V
//! pack down by 0.248; ten oneshot samples are averaged per reading.

use crate::drivers::hw_init;
use crate::pins;

const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;
pub const DIVIDER_RATIO: f32 = 0.248;
pub const SAMPLES: u16 = 10;

/// Convert an averaged ADC count to pack voltage.
pub fn raw_to_voltage(raw: u16) -> f32 {
    (f32::from(raw) / ADC_MAX) * V_REF / DIVIDER_RATIO
}

pub struct BatteryMonitor {
    channel: u32,
}

impl Default for BatteryMonitor {
    fn default() -> Self {
        Self::new(pins::VBAT_ADC_CHANNEL)
    }
}

impl BatteryMonitor {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    /// Averaged raw count.
    pub fn read_raw(&self) -> u16 {
        let sum: u32 = (0..SAMPLES)
            .map(|_| u32::from(hw_init::adc1_read(self.channel)))
            .sum();
        (sum / u32::from(SAMPLES)) as u16
    }

    pub fn read(&self) -> f32 {
        raw_to_voltage(self.read_raw())
    }
}
