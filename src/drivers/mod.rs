//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod blink;
pub mod button;
pub mod buzzer;
pub mod hw_init;
pub mod led_channels;
pub mod watchdog;
