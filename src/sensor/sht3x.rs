// src/sensor/sht3x.rs

//! SHT3x humidity and temperature sensor, driven in single-shot mode.

use super::{FamilyProfile, MeasurementMode, SensorFamily};
use crate::common::address::DeviceAddress;
use crate::common::bus::SharedBus;
use crate::common::command::{Command, CommandTable, Operation};
use crate::common::error::SensorError;
use crate::common::field::FieldDescriptor;
use crate::common::hal_traits::I2cTransport;
use crate::common::numeric::Decode;
use crate::common::timing::{SHT3X_COMMAND_MS, SHT3X_SINGLE_SHOT_MS, SHT3X_SOFT_RESET_MS};
use crate::common::types::Reading;
use crate::common::util::{SystemUtilities, Utilities};
use crate::session::{MeasurementSession, SessionConfig, SessionState};

const COMMANDS: &[(Operation, Command)] = &[
    // High repeatability, clock stretching enabled
    (
        Operation::SingleShotMeasurement,
        Command::new("measure_single_shot", 0x2C06).reads(6).executes_in(SHT3X_SINGLE_SHOT_MS),
    ),
    (
        Operation::ReadDeviceStatus,
        Command::new("read_status", 0xF32D).reads(3).executes_in(SHT3X_COMMAND_MS),
    ),
    (
        Operation::ClearDeviceStatus,
        Command::new("clear_status", 0x3041).executes_in(SHT3X_COMMAND_MS),
    ),
    (
        Operation::SoftReset,
        Command::new("soft_reset", 0x30A2).executes_in(SHT3X_SOFT_RESET_MS),
    ),
];

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Tc", 0, Decode::FixedPointScale { scale: 175.0, offset: -45.0 }, "°C"),
    FieldDescriptor::new("RH", 3, Decode::FixedPointScale { scale: 100.0, offset: 0.0 }, "%"),
];

pub static PROFILE: FamilyProfile = FamilyProfile {
    family: SensorFamily::Sht3x,
    default_address: DeviceAddress::SHT3X,
    commands: CommandTable::new(SensorFamily::Sht3x, COMMANDS),
    fields: FIELDS,
    mode: MeasurementMode::SingleShot,
    dew_point: Some(("Tc", "RH")),
};

/// SHT3x status register.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Sht3xStatus(pub u16);

impl Sht3xStatus {
    #[inline]
    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn alert_pending(&self) -> bool {
        self.0 & (1 << 15) != 0
    }

    pub const fn heater_on(&self) -> bool {
        self.0 & (1 << 13) != 0
    }

    /// A reset (power-on, soft or brown-out) occurred since the last clear.
    pub const fn reset_detected(&self) -> bool {
        self.0 & (1 << 4) != 0
    }

    /// The last command was not processed.
    pub const fn command_failed(&self) -> bool {
        self.0 & (1 << 1) != 0
    }

    /// Checksum of the last write transfer failed.
    pub const fn write_checksum_failed(&self) -> bool {
        self.0 & 1 != 0
    }
}

/// SHT3x driver.
#[derive(Debug)]
pub struct Sht3x<'bus, T: I2cTransport, U: Utilities = SystemUtilities> {
    session: MeasurementSession<'bus, T, U>,
}

impl<'bus, T: I2cTransport> Sht3x<'bus, T> {
    pub fn new(bus: &'bus SharedBus<T>) -> Self {
        Sht3x {
            session: MeasurementSession::new(bus, SensorFamily::Sht3x),
        }
    }
}

impl<'bus, T: I2cTransport, U: Utilities> Sht3x<'bus, T, U> {
    pub fn with_config(bus: &'bus SharedBus<T>, config: SessionConfig, utilities: U) -> Self {
        Sht3x {
            session: MeasurementSession::with_config(bus, SensorFamily::Sht3x, config, utilities),
        }
    }

    pub fn session(&self) -> &MeasurementSession<'bus, T, U> {
        &self.session
    }

    pub fn display_name(&self) -> String {
        self.session.display_name()
    }

    pub async fn state(&self) -> SessionState {
        self.session.state().await
    }

    /// Triggers a single-shot measurement and reads temperature, humidity and dew point.
    pub async fn measure(&self) -> Result<Reading, SensorError<T::Error>> {
        self.session.measure().await
    }

    pub async fn read_status(&self) -> Result<Sht3xStatus, SensorError<T::Error>> {
        let bits = self.session.read_word(Operation::ReadDeviceStatus, "status").await?;
        Ok(Sht3xStatus(bits))
    }

    pub async fn clear_status(&self) -> Result<(), SensorError<T::Error>> {
        self.session.execute(Operation::ClearDeviceStatus).await
    }

    pub async fn soft_reset(&self) -> Result<(), SensorError<T::Error>> {
        self.session.execute(Operation::SoftReset).await
    }
}
