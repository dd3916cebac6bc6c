// src/sensor/sps30.rs

//! SPS30 particulate matter sensor, read in big-endian float output format.

use super::{DeviceStatus, FamilyProfile, MeasurementMode, SensorFamily};
use crate::common::address::DeviceAddress;
use crate::common::bus::SharedBus;
use crate::common::command::{Command, CommandTable, Operation};
use crate::common::error::SensorError;
use crate::common::field::FieldDescriptor;
use crate::common::hal_traits::I2cTransport;
use crate::common::numeric::Decode;
use crate::common::timing::{SPS30_COMMAND_MS, SPS30_START_STOP_MS};
use crate::common::types::Reading;
use crate::common::util::{SystemUtilities, Utilities};
use crate::session::{MeasurementSession, SessionConfig, SessionState};

const MASS: &str = "µg/m³";
const NUMBER: &str = "#/cm³";

const COMMANDS: &[(Operation, Command)] = &[
    // Output format 0x0300: big-endian IEEE-754 floats
    (
        Operation::StartMeasurement,
        Command::new("start_measurement", 0x0010)
            .with_payload([0x03, 0x00], 0xAC)
            .executes_in(SPS30_START_STOP_MS),
    ),
    (
        Operation::StopMeasurement,
        Command::new("stop_measurement", 0x0104).executes_in(SPS30_START_STOP_MS),
    ),
    (
        Operation::DataReady,
        Command::new("read_data_ready_flag", 0x0202).reads(3).executes_in(SPS30_COMMAND_MS),
    ),
    (
        Operation::ReadMeasurement,
        Command::new("read_measured_values", 0x0300).reads(60).executes_in(SPS30_COMMAND_MS),
    ),
    (
        Operation::ReadFirmwareVersion,
        Command::new("read_version", 0xD100).reads(3).executes_in(SPS30_COMMAND_MS),
    ),
    (
        Operation::FanCleaning,
        Command::new("start_fan_cleaning", 0x5607).executes_in(SPS30_COMMAND_MS),
    ),
    (
        Operation::ReadDeviceStatus,
        Command::new("read_device_status_register", 0xD206).reads(6).executes_in(SPS30_COMMAND_MS),
    ),
    (
        Operation::ClearDeviceStatus,
        Command::new("clear_device_status_register", 0xD210).executes_in(SPS30_COMMAND_MS),
    ),
];

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("MassPM1.0", 0, Decode::FloatFromTwoWords, MASS),
    FieldDescriptor::new("MassPM2.5", 6, Decode::FloatFromTwoWords, MASS),
    FieldDescriptor::new("MassPM4.0", 12, Decode::FloatFromTwoWords, MASS),
    FieldDescriptor::new("MassPM10", 18, Decode::FloatFromTwoWords, MASS),
    FieldDescriptor::new("NumberPM0.5", 24, Decode::FloatFromTwoWords, NUMBER),
    FieldDescriptor::new("NumberPM1.0", 30, Decode::FloatFromTwoWords, NUMBER),
    FieldDescriptor::new("NumberPM2.5", 36, Decode::FloatFromTwoWords, NUMBER),
    FieldDescriptor::new("NumberPM4.0", 42, Decode::FloatFromTwoWords, NUMBER),
    FieldDescriptor::new("NumberPM10", 48, Decode::FloatFromTwoWords, NUMBER),
    FieldDescriptor::new("TypicalParticleSize", 54, Decode::FloatFromTwoWords, "µm"),
];

pub static PROFILE: FamilyProfile = FamilyProfile {
    family: SensorFamily::Sps30,
    default_address: DeviceAddress::PARTICULATE,
    commands: CommandTable::new(SensorFamily::Sps30, COMMANDS),
    fields: FIELDS,
    mode: MeasurementMode::Continuous,
    dew_point: None,
};

/// SPS30 driver.
#[derive(Debug)]
pub struct Sps30<'bus, T: I2cTransport, U: Utilities = SystemUtilities> {
    session: MeasurementSession<'bus, T, U>,
}

impl<'bus, T: I2cTransport> Sps30<'bus, T> {
    pub fn new(bus: &'bus SharedBus<T>) -> Self {
        Sps30 {
            session: MeasurementSession::new(bus, SensorFamily::Sps30),
        }
    }
}

impl<'bus, T: I2cTransport, U: Utilities> Sps30<'bus, T, U> {
    pub fn with_config(bus: &'bus SharedBus<T>, config: SessionConfig, utilities: U) -> Self {
        Sps30 {
            session: MeasurementSession::with_config(bus, SensorFamily::Sps30, config, utilities),
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

    /// Starts measurement with float output. The first sample is ready about 1 s later.
    pub async fn start_continuous_measurement(&self) -> Result<(), SensorError<T::Error>> {
        self.session.start().await
    }

    pub async fn stop_continuous_measurement(&self) -> Result<(), SensorError<T::Error>> {
        self.session.stop().await
    }

    /// Reads mass and number concentrations and the typical particle size.
    pub async fn measure(&self) -> Result<Reading, SensorError<T::Error>> {
        self.session.measure().await
    }

    pub async fn measure_until_ready(&self) -> Result<Reading, SensorError<T::Error>> {
        self.session.measure_until_ready().await
    }

    pub async fn read_firmware_version(&self) -> Result<String, SensorError<T::Error>> {
        self.session.read_firmware_version().await
    }

    /// Runs the fan at full speed for 10 s. Only accepted while measuring.
    pub async fn trigger_fan_cleaning(&self) -> Result<(), SensorError<T::Error>> {
        self.session.trigger_fan_cleaning().await
    }

    pub async fn read_device_status(&self) -> Result<DeviceStatus, SensorError<T::Error>> {
        let bits = self.session.read_u32(Operation::ReadDeviceStatus, "device_status").await?;
        Ok(DeviceStatus(bits))
    }

    pub async fn clear_device_status(&self) -> Result<(), SensorError<T::Error>> {
        self.session.execute(Operation::ClearDeviceStatus).await
    }
}
