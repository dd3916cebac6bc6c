// src/sensor/mod.rs

//! Per-family profiles and typed drivers.
//!
//! A profile bundles everything the generic [`MeasurementSession`](crate::session::MeasurementSession)
//! needs to talk to one family: default address, command table, measurement field
//! layout and measurement mode. The typed drivers wrap a session and expose only
//! the operations their family supports.

use core::fmt;

use crate::common::address::DeviceAddress;
use crate::common::command::CommandTable;
use crate::common::field::FieldDescriptor;

pub mod scd30;
pub mod sen5x;
pub mod sht3x;
pub mod sps30;

pub use scd30::Scd30;
pub use sen5x::Sen5x;
pub use sht3x::Sht3x;
pub use sps30::Sps30;

/// The supported sensor families.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SensorFamily {
    /// CO2, temperature and humidity (NDIR).
    Scd30,
    /// Particulate matter, mass and number concentrations.
    Sps30,
    /// Environmental node: particulate matter, RH/T, VOC and NOx indices.
    Sen5x,
    /// Temperature and humidity.
    Sht3x,
}

impl SensorFamily {
    pub const ALL: [SensorFamily; 4] = [
        SensorFamily::Scd30,
        SensorFamily::Sps30,
        SensorFamily::Sen5x,
        SensorFamily::Sht3x,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SensorFamily::Scd30 => "SCD30",
            SensorFamily::Sps30 => "SPS30",
            SensorFamily::Sen5x => "SEN5x",
            SensorFamily::Sht3x => "SHT3x",
        }
    }

    pub fn profile(self) -> &'static FamilyProfile {
        match self {
            SensorFamily::Scd30 => &scd30::PROFILE,
            SensorFamily::Sps30 => &sps30::PROFILE,
            SensorFamily::Sen5x => &sen5x::PROFILE,
            SensorFamily::Sht3x => &sht3x::PROFILE,
        }
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a family produces measurements.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeasurementMode {
    /// The sensor measures on its own once started; each cycle polls data-ready, then reads.
    Continuous,
    /// Each cycle triggers one measurement, waits its execution time and reads it.
    SingleShot,
}

/// Static description of one sensor family.
#[derive(Debug)]
pub struct FamilyProfile {
    pub family: SensorFamily,
    pub default_address: DeviceAddress,
    pub commands: CommandTable,
    /// Layout of the measurement frame, in frame order.
    pub fields: &'static [FieldDescriptor],
    pub mode: MeasurementMode,
    /// Temperature and humidity field names from which a dew point is derived, if any.
    pub dew_point: Option<(&'static str, &'static str)>,
}

/// Device status register of the particulate sensors (SPS30, SEN5x).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DeviceStatus(pub u32);

impl DeviceStatus {
    const FAN_SPEED_WARNING: u32 = 1 << 21;
    const FAN_CLEANING: u32 = 1 << 19;
    const GAS_SENSOR_ERROR: u32 = 1 << 7;
    const RHT_ERROR: u32 = 1 << 6;
    const LASER_FAILURE: u32 = 1 << 5;
    const FAN_FAILURE: u32 = 1 << 4;

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Fan speed is out of range (warning only, measurements continue).
    pub const fn fan_speed_warning(&self) -> bool {
        self.0 & Self::FAN_SPEED_WARNING != 0
    }

    /// Fan cleaning is running (SEN5x).
    pub const fn fan_cleaning(&self) -> bool {
        self.0 & Self::FAN_CLEANING != 0
    }

    /// VOC/NOx sensor error (SEN5x).
    pub const fn gas_sensor_error(&self) -> bool {
        self.0 & Self::GAS_SENSOR_ERROR != 0
    }

    /// Communication error with the RH/T sensor (SEN5x).
    pub const fn rht_error(&self) -> bool {
        self.0 & Self::RHT_ERROR != 0
    }

    pub const fn laser_failure(&self) -> bool {
        self.0 & Self::LASER_FAILURE != 0
    }

    /// Fan is switched on but not turning.
    pub const fn fan_failure(&self) -> bool {
        self.0 & Self::FAN_FAILURE != 0
    }

    /// `true` if any error bit (as opposed to warning or info bit) is set.
    pub const fn has_error(&self) -> bool {
        self.gas_sensor_error() || self.rht_error() || self.laser_failure() || self.fan_failure()
    }
}
