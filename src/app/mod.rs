//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the treatment rules together: safety verdicts, the
//! session FSM and the UI state machine, driven once per control tick by
//! the [`controller::Controller`]. All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod controller;
pub mod events;
pub mod ports;
