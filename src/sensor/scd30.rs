// src/sensor/scd30.rs

//! SCD30 NDIR CO2 sensor with temperature and humidity.
//!
//! The sensor measures continuously once started, at a configurable interval
//! (2 s by default). Its measurement frame holds three big-endian floats.

use super::{FamilyProfile, MeasurementMode, SensorFamily};
use crate::common::address::DeviceAddress;
use crate::common::bus::SharedBus;
use crate::common::command::{Command, CommandTable, Operation};
use crate::common::error::SensorError;
use crate::common::field::FieldDescriptor;
use crate::common::hal_traits::I2cTransport;
use crate::common::numeric::Decode;
use crate::common::timing::{SCD30_COMMAND_MS, SCD30_SOFT_RESET_MS};
use crate::common::types::Reading;
use crate::common::util::{SystemUtilities, Utilities};
use crate::session::{MeasurementSession, SessionConfig, SessionState};

const COMMANDS: &[(Operation, Command)] = &[
    // Ambient pressure argument 0 disables pressure compensation
    (
        Operation::StartMeasurement,
        Command::new("start_continuous_measurement", 0x0010)
            .with_payload([0x00, 0x00], 0x81)
            .executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::StopMeasurement,
        Command::new("stop_continuous_measurement", 0x0104).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::DataReady,
        Command::new("get_data_ready", 0x0202).reads(3).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::ReadMeasurement,
        Command::new("read_measurement", 0x0300).reads(18).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::ReadFirmwareVersion,
        Command::new("read_firmware_version", 0xD100).reads(3).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::SetAltitude,
        Command::new("set_altitude", 0x5102).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::GetAltitude,
        Command::new("get_altitude", 0x5102).reads(3).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::SetTemperatureOffset,
        Command::new("set_temperature_offset", 0x5403).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::GetTemperatureOffset,
        Command::new("get_temperature_offset", 0x5403).reads(3).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::SetMeasurementInterval,
        Command::new("set_measurement_interval", 0x4600).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::GetMeasurementInterval,
        Command::new("get_measurement_interval", 0x4600).reads(3).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::SetForcedRecalibration,
        Command::new("set_forced_recalibration", 0x5204).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::GetForcedRecalibration,
        Command::new("get_forced_recalibration", 0x5204).reads(3).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::SetSelfCalibration,
        Command::new("set_self_calibration", 0x5306).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::GetSelfCalibration,
        Command::new("get_self_calibration", 0x5306).reads(3).executes_in(SCD30_COMMAND_MS),
    ),
    (
        Operation::SoftReset,
        Command::new("soft_reset", 0xD304).executes_in(SCD30_SOFT_RESET_MS),
    ),
];

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("CO2", 0, Decode::FloatFromTwoWords, "ppm"),
    FieldDescriptor::new("Tc", 6, Decode::FloatFromTwoWords, "°C"),
    FieldDescriptor::new("RH", 12, Decode::FloatFromTwoWords, "%"),
];

pub static PROFILE: FamilyProfile = FamilyProfile {
    family: SensorFamily::Scd30,
    default_address: DeviceAddress::SCD30,
    commands: CommandTable::new(SensorFamily::Scd30, COMMANDS),
    fields: FIELDS,
    mode: MeasurementMode::Continuous,
    dew_point: Some(("Tc", "RH")),
};

/// SCD30 driver.
#[derive(Debug)]
pub struct Scd30<'bus, T: I2cTransport, U: Utilities = SystemUtilities> {
    session: MeasurementSession<'bus, T, U>,
}

impl<'bus, T: I2cTransport> Scd30<'bus, T> {
    pub fn new(bus: &'bus SharedBus<T>) -> Self {
        Scd30 {
            session: MeasurementSession::new(bus, SensorFamily::Scd30),
        }
    }
}

impl<'bus, T: I2cTransport, U: Utilities> Scd30<'bus, T, U> {
    pub fn with_config(bus: &'bus SharedBus<T>, config: SessionConfig, utilities: U) -> Self {
        Scd30 {
            session: MeasurementSession::with_config(bus, SensorFamily::Scd30, config, utilities),
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

    /// Starts continuous measurement without ambient pressure compensation.
    pub async fn start_continuous_measurement(&self) -> Result<(), SensorError<T::Error>> {
        self.session.start().await
    }

    pub async fn stop_continuous_measurement(&self) -> Result<(), SensorError<T::Error>> {
        self.session.stop().await
    }

    /// Reads CO2 (ppm), temperature (°C), relative humidity (%) and the derived dew point.
    pub async fn measure(&self) -> Result<Reading, SensorError<T::Error>> {
        self.session.measure().await
    }

    pub async fn measure_until_ready(&self) -> Result<Reading, SensorError<T::Error>> {
        self.session.measure_until_ready().await
    }

    pub async fn read_firmware_version(&self) -> Result<String, SensorError<T::Error>> {
        self.session.read_firmware_version().await
    }

    /// Altitude compensation in meters above sea level.
    pub async fn set_altitude(&self, meters: u16) -> Result<(), SensorError<T::Error>> {
        self.session.set_altitude(meters).await
    }

    pub async fn get_altitude(&self) -> Result<u16, SensorError<T::Error>> {
        self.session.get_altitude().await
    }

    /// Temperature offset in units of 0.01 °C.
    pub async fn set_temperature_offset(&self, offset: u16) -> Result<(), SensorError<T::Error>> {
        self.session.set_temperature_offset(offset).await
    }

    pub async fn get_temperature_offset(&self) -> Result<u16, SensorError<T::Error>> {
        self.session.get_temperature_offset().await
    }

    /// Measurement interval in seconds. The sensor accepts 2..=1800.
    pub async fn set_measurement_interval(&self, seconds: u16) -> Result<(), SensorError<T::Error>> {
        self.session.write_argument(Operation::SetMeasurementInterval, seconds).await
    }

    pub async fn get_measurement_interval(&self) -> Result<u16, SensorError<T::Error>> {
        self.session.read_word(Operation::GetMeasurementInterval, "measurement_interval").await
    }

    /// Forced recalibration against a reference CO2 concentration (400..=2000 ppm).
    pub async fn set_forced_recalibration(&self, ppm: u16) -> Result<(), SensorError<T::Error>> {
        self.session.write_argument(Operation::SetForcedRecalibration, ppm).await
    }

    pub async fn get_forced_recalibration(&self) -> Result<u16, SensorError<T::Error>> {
        self.session.read_word(Operation::GetForcedRecalibration, "forced_recalibration").await
    }

    /// Enables or disables automatic self-calibration.
    pub async fn set_self_calibration(&self, enabled: bool) -> Result<(), SensorError<T::Error>> {
        self.session.write_argument(Operation::SetSelfCalibration, u16::from(enabled)).await
    }

    pub async fn get_self_calibration(&self) -> Result<bool, SensorError<T::Error>> {
        let value = self.session.read_word(Operation::GetSelfCalibration, "self_calibration").await?;
        Ok(value == 1)
    }

    pub async fn soft_reset(&self) -> Result<(), SensorError<T::Error>> {
        self.session.execute(Operation::SoftReset).await
    }
}
