// src/sensor/sen5x.rs

//! SEN5x environmental sensor node (SEN50, SEN54, SEN55).
//!
//! Shares the particulate sensors' bus address with the SPS30 but uses its own
//! command set and a scaled-integer measurement frame.

use super::{DeviceStatus, FamilyProfile, MeasurementMode, SensorFamily};
use crate::common::address::DeviceAddress;
use crate::common::bus::SharedBus;
use crate::common::command::{Command, CommandTable, Operation};
use crate::common::error::SensorError;
use crate::common::field::FieldDescriptor;
use crate::common::hal_traits::I2cTransport;
use crate::common::numeric::Decode;
use crate::common::timing::{SEN5X_READ_MS, SEN5X_SOFT_RESET_MS, SEN5X_START_MS, SEN5X_STOP_MS};
use crate::common::types::Reading;
use crate::common::util::{SystemUtilities, Utilities};
use crate::session::{MeasurementSession, SessionConfig, SessionState};

const MASS: &str = "µg/m³";

const COMMANDS: &[(Operation, Command)] = &[
    (
        Operation::StartMeasurement,
        Command::new("start_measurement", 0x0021).executes_in(SEN5X_START_MS),
    ),
    (
        Operation::StartRhtGasMeasurement,
        Command::new("start_measurement_rht_gas_only", 0x0037).executes_in(SEN5X_START_MS),
    ),
    (
        Operation::StopMeasurement,
        Command::new("stop_measurement", 0x0104).executes_in(SEN5X_STOP_MS),
    ),
    (
        Operation::DataReady,
        Command::new("read_data_ready_flag", 0x0202).reads(3).executes_in(SEN5X_READ_MS),
    ),
    (
        Operation::ReadMeasurement,
        Command::new("read_measured_values", 0x03C4).reads(24).executes_in(SEN5X_READ_MS),
    ),
    (
        Operation::ReadFirmwareVersion,
        Command::new("read_firmware_version", 0xD100).reads(3).executes_in(SEN5X_READ_MS),
    ),
    (
        Operation::FanCleaning,
        Command::new("start_fan_cleaning", 0x5607).executes_in(SEN5X_READ_MS),
    ),
    (
        Operation::ReadDeviceStatus,
        Command::new("read_device_status", 0xD206).reads(6).executes_in(SEN5X_READ_MS),
    ),
    (
        Operation::ClearDeviceStatus,
        Command::new("read_and_clear_device_status", 0xD210).executes_in(SEN5X_READ_MS),
    ),
    (
        Operation::SoftReset,
        Command::new("device_reset", 0xD304).executes_in(SEN5X_SOFT_RESET_MS),
    ),
];

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("MassPM1.0", 0, Decode::IntegerScale { divisor: 10.0, signed: false }, MASS),
    FieldDescriptor::new("MassPM2.5", 3, Decode::IntegerScale { divisor: 10.0, signed: false }, MASS),
    FieldDescriptor::new("MassPM4.0", 6, Decode::IntegerScale { divisor: 10.0, signed: false }, MASS),
    FieldDescriptor::new("MassPM10", 9, Decode::IntegerScale { divisor: 10.0, signed: false }, MASS),
    FieldDescriptor::new(
        "Compensated Humidity",
        12,
        Decode::IntegerScale { divisor: 100.0, signed: true },
        "%",
    ),
    FieldDescriptor::new(
        "Compensated Temperature",
        15,
        Decode::IntegerScale { divisor: 200.0, signed: true },
        "°C",
    ),
    FieldDescriptor::new("VOC Index", 18, Decode::IntegerScale { divisor: 10.0, signed: true }, ""),
    FieldDescriptor::new("NOx Index", 21, Decode::IntegerScale { divisor: 10.0, signed: true }, ""),
];

pub static PROFILE: FamilyProfile = FamilyProfile {
    family: SensorFamily::Sen5x,
    default_address: DeviceAddress::PARTICULATE,
    commands: CommandTable::new(SensorFamily::Sen5x, COMMANDS),
    fields: FIELDS,
    mode: MeasurementMode::Continuous,
    dew_point: None,
};

/// SEN5x driver.
#[derive(Debug)]
pub struct Sen5x<'bus, T: I2cTransport, U: Utilities = SystemUtilities> {
    session: MeasurementSession<'bus, T, U>,
}

impl<'bus, T: I2cTransport> Sen5x<'bus, T> {
    pub fn new(bus: &'bus SharedBus<T>) -> Self {
        Sen5x {
            session: MeasurementSession::new(bus, SensorFamily::Sen5x),
        }
    }
}

impl<'bus, T: I2cTransport, U: Utilities> Sen5x<'bus, T, U> {
    pub fn with_config(bus: &'bus SharedBus<T>, config: SessionConfig, utilities: U) -> Self {
        Sen5x {
            session: MeasurementSession::with_config(bus, SensorFamily::Sen5x, config, utilities),
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

    pub async fn start_continuous_measurement(&self) -> Result<(), SensorError<T::Error>> {
        self.session.start().await
    }

    /// Starts measurement with the particulate sensor (and its fan) switched off.
    /// The sensor then reports 0xFFFF in the mass concentration words.
    pub async fn start_rht_gas_measurement(&self) -> Result<(), SensorError<T::Error>> {
        self.session.start_with(Operation::StartRhtGasMeasurement).await
    }

    pub async fn stop_continuous_measurement(&self) -> Result<(), SensorError<T::Error>> {
        self.session.stop().await
    }

    pub async fn measure(&self) -> Result<Reading, SensorError<T::Error>> {
        self.session.measure().await
    }

    pub async fn measure_until_ready(&self) -> Result<Reading, SensorError<T::Error>> {
        self.session.measure_until_ready().await
    }

    pub async fn read_firmware_version(&self) -> Result<String, SensorError<T::Error>> {
        self.session.read_firmware_version().await
    }

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

    pub async fn soft_reset(&self) -> Result<(), SensorError<T::Error>> {
        self.session.execute(Operation::SoftReset).await
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{FixedUtilities, MockBus};

    fn driver(bus: &SharedBus<MockBus>) -> Sen5x<'_, MockBus, FixedUtilities> {
        Sen5x::with_config(bus, SessionConfig::default(), FixedUtilities)
    }

    #[tokio::test]
    async fn test_measure_scales_integer_fields() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0001]);
            mock.stage_words(&[
                52,
                85,
                101,
                110,
                4550,
                (-1000i16) as u16,
                1000,
                10,
            ]);
        }
        let sen5x = driver(&bus);

        let reading = sen5x.measure().await.unwrap();
        assert_eq!(reading.get("MassPM1.0"), Some(5.2));
        assert_eq!(reading.get("MassPM2.5"), Some(8.5));
        assert_eq!(reading.get("MassPM4.0"), Some(10.1));
        assert_eq!(reading.get("MassPM10"), Some(11.0));
        assert_eq!(reading.get("Compensated Humidity"), Some(45.5));
        assert_eq!(reading.get("Compensated Temperature"), Some(-5.0));
        assert_eq!(reading.get("VOC Index"), Some(100.0));
        assert_eq!(reading.get("NOx Index"), Some(1.0));
        assert_eq!(reading.sensor, "SEN5x @ 0x69");

        let mock = bus.acquire().await;
        assert_eq!(mock.opcodes(), vec![0x0202, 0x03C4]);
        assert_eq!(mock.reads, vec![(0x69, 3), (0x69, 24)]);
    }

    #[tokio::test]
    async fn test_not_ready_skips_read() {
        let bus = SharedBus::new(MockBus::new());
        bus.acquire().await.stage_words(&[0x0000]);
        let sen5x = driver(&bus);

        assert!(sen5x.measure().await.unwrap_err().is_not_ready());
        assert_eq!(bus.acquire().await.opcodes(), vec![0x0202]);
    }

    #[tokio::test]
    async fn test_start_modes_and_timing() {
        let bus = SharedBus::new(MockBus::new());
        let sen5x = driver(&bus);

        sen5x.start_continuous_measurement().await.unwrap();
        sen5x.stop_continuous_measurement().await.unwrap();
        sen5x.start_rht_gas_measurement().await.unwrap();
        assert_eq!(sen5x.state().await, SessionState::Measuring);

        let mock = bus.acquire().await;
        assert_eq!(mock.opcodes(), vec![0x0021, 0x0104, 0x0037]);
        assert_eq!(mock.delays, vec![SEN5X_START_MS, SEN5X_STOP_MS, SEN5X_START_MS]);
    }

    #[tokio::test]
    async fn test_device_status_checksum_error() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            let mut frame = crate::common::word::encode_words(&[0x0000, 0x0080]);
            frame[5] ^= 0x01;
            mock.stage_read(&frame);
        }
        let sen5x = driver(&bus);

        let err = sen5x.read_device_status().await.unwrap_err();
        assert!(matches!(err, SensorError::Checksum { field: "device_status" }));
    }
}
