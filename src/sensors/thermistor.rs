//! NTC thermistor temperature sensor (10 kOhm @ 25 C, B = 3950).
//!
//! Wired in a voltage-divider with a fixed 10 kOhm resistor, read via
//! ADC1 CH6. The simplified Beta (Steinhart-Hart) equation converts
//! resistance to temperature. A reading pinned to either rail means an
//! open or shorted probe and yields [`Temperature::Absent`].

use crate::drivers::hw_init;
use crate::pins;
use crate::safety::Temperature;

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;
const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;
/// Readings within this many volts of a rail count as disconnected.
const RAIL_MARGIN_V: f32 = 0.01;

pub fn adc_to_temperature(raw: u16) -> Temperature {
    let voltage = (f32::from(raw) / ADC_MAX) * V_REF;
    if voltage <= RAIL_MARGIN_V || voltage >= V_REF - RAIL_MARGIN_V {
        return Temperature::Absent;
    }
    let r_ntc = R_DIVIDER * voltage / (V_REF - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
    if inv_t <= 0.0 {
        return Temperature::Absent;
    }
    Temperature::from_raw((1.0 / inv_t) - 273.15)
}

pub struct Thermistor {
    channel: u32,
}

impl Default for Thermistor {
    fn default() -> Self {
        Self::new(pins::TEMP_ADC_CHANNEL)
    }
}

impl Thermistor {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub fn read(&self) -> Temperature {
        adc_to_temperature(hw_init::adc1_read(self.channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midscale_is_room_temperature() {
        // Equal divider → R_ntc = R25 → 25 °C
        let t = adc_to_temperature(2048).celsius().unwrap();
        assert!((t - 25.0).abs() < 0.5, "got {}", t);
    }

    #[test]
    fn lower_voltage_is_hotter() {
        // NTC on the low side: less voltage, less resistance.
        let warm = adc_to_temperature(1500).celsius().unwrap();
        let room = adc_to_temperature(2048).celsius().unwrap();
        assert!(warm > room);
    }

    #[test]
    fn rails_read_as_absent() {
        assert_eq!(adc_to_temperature(0), Temperature::Absent);
        assert_eq!(adc_to_temperature(4095), Temperature::Absent);
    }
}
