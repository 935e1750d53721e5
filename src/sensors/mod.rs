//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub samples each source on its own cadence (battery every 5 s,
//! thermistor every 2 s by default) and caches the result. The control
//! loop always sees the last cached [`Readings`] and never waits on an
//! ADC conversion.

pub mod battery;
pub mod thermistor;

use log::debug;

use crate::config::SystemConfig;
use crate::safety::{Temperature, V_NOMINAL};
use crate::session::context::Readings;
use battery::BatteryMonitor;
use thermistor::Thermistor;

pub struct SensorHub {
    battery: BatteryMonitor,
    /// `None` when the board has no probe fitted.
    thermistor: Option<Thermistor>,
    battery_interval_ms: u64,
    thermal_interval_ms: u64,
    last_battery_ms: Option<u64>,
    last_thermal_ms: Option<u64>,
    cached: Readings,
}

impl SensorHub {
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_sensors(
            BatteryMonitor::default(),
            config.thermal_sensor_enabled.then(Thermistor::default),
            config,
        )
    }

    /// Construct a hub from pre-built drivers.
    pub fn with_sensors(
        battery: BatteryMonitor,
        thermistor: Option<Thermistor>,
        config: &SystemConfig,
    ) -> Self {
        Self {
            battery,
            thermistor,
            battery_interval_ms: u64::from(config.battery_sample_interval_ms),
            thermal_interval_ms: u64::from(config.thermal_sample_interval_ms),
            last_battery_ms: None,
            last_thermal_ms: None,
            cached: Readings { voltage: V_NOMINAL, temperature: Temperature::Absent },
        }
    }

    /// Sample whichever sources are due. The first call samples both.
    pub fn poll(&mut self, now_ms: u64) -> Readings {
        if due(self.last_battery_ms, now_ms, self.battery_interval_ms) {
            self.cached.voltage = self.battery.read();
            self.last_battery_ms = Some(now_ms);
            debug!("Sensors: battery {:.2}V", self.cached.voltage);
        }

        if let Some(probe) = &self.thermistor {
            if due(self.last_thermal_ms, now_ms, self.thermal_interval_ms) {
                self.cached.temperature = probe.read();
                self.last_thermal_ms = Some(now_ms);
                debug!("Sensors: temperature {:?}", self.cached.temperature);
            }
        }

        self.cached
    }

    /// Last cached readings.
    pub fn readings(&self) -> Readings {
        self.cached
    }

    pub fn has_thermistor(&self) -> bool {
        self.thermistor.is_some()
    }
}

fn due(last: Option<u64>, now_ms: u64, interval_ms: u64) -> bool {
    last.is_none_or(|t| now_ms.saturating_sub(t) >= interval_ms)
}
