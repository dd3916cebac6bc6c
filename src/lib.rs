// src/lib.rs

//! Async protocol layer for Sensirion I2C environmental sensors.
//!
//! Drivers for the SCD30, SPS30, SEN5x and SHT3x share one [`SharedBus`] and talk
//! to it through the [`I2cTransport`] trait. Every exchange is checksum-validated
//! word by word; a measurement either decodes completely into a [`Reading`] or
//! fails with the name of the offending field.

pub mod common;
pub mod sensor;
pub mod session;

// Re-export key types for convenience
pub use common::{I2cTransport, Reading, SensorError, SharedBus};
pub use sensor::{Scd30, Sen5x, SensorFamily, Sht3x, Sps30};
pub use session::{MeasurementSession, PollPolicy, SessionConfig, SessionState};
