//! MedAlert controller library.
//!
//! Exposes the dose-cycle core, the port adapters and the drivers for
//! integration testing and fuzzing. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; host builds run the
//! simulation backends.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod sensors;
pub mod uplink;
