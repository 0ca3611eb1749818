//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the MedAlert controller:
//! dose-cycle orchestration, reminder scheduling, and the confirmation
//! fan-out.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod effects;
pub mod events;
pub mod ports;
pub mod service;
