//! RedLight firmware library.
//!
//! Safety-gated session controller for a dual-wavelength (660 nm red /
//! 850 nm NIR) light therapy device. Exposes the pure-logic modules for
//! integration testing; all ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod feedback;
pub mod input;
pub mod mode;
pub mod pins;
pub mod safety;
pub mod session;
pub mod ui;

// Hardware-facing modules; host builds use the simulation stubs inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;

#[cfg(target_os = "espidf")]
mod critical_section_impl;
