//! Environment sensing: reading type, comfort classifier, and the DHT driver.
//!
//! The dose state machine asks for one reading at the confirmation instant
//! and never stores it; everything here is either pure or owned by the
//! adapter that implements [`EnvironmentPort`](crate::app::ports::EnvironmentPort).

pub mod dht;
pub mod environment;

pub use environment::{EnvironmentClass, EnvironmentReading, classify};
