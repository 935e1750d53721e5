//! Thermal derating with hysteresis.
//!
//! Crossing `T_WARNING` latches derating. While latched the output follows
//! the derating curve at or above the warning threshold, and holds its last
//! factor inside the hysteresis band. Full output only returns once the
//! reading drops below `T_WARNING - hysteresis`.

use crate::safety::{self, Temperature, T_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalGovernor {
    hysteresis_c: f32,
    latched: bool,
    factor: f32,
}

impl ThermalGovernor {
    pub fn new(hysteresis_c: f32) -> Self {
        Self { hysteresis_c, latched: false, factor: 1.0 }
    }

    /// Feed one reading; returns the output scale factor to apply.
    pub fn update(&mut self, t: Temperature) -> f32 {
        match t.celsius() {
            None => {
                self.latched = false;
                self.factor = 1.0;
            }
            Some(c) if c >= T_WARNING => {
                self.latched = true;
                self.factor = safety::thermal_derating(t);
            }
            Some(c) if self.latched && c < T_WARNING - self.hysteresis_c => {
                self.latched = false;
                self.factor = 1.0;
            }
            Some(_) => {}
        }
        self.factor
    }

    pub fn is_derating(&self) -> bool {
        self.latched
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }
}
