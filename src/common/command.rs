// src/common/command.rs

//! Sensirion I2C command definitions.
//!
//! Every command is a 16-bit opcode sent most significant byte first. Some commands carry
//! a fixed payload word (with its checksum byte), setters carry a caller-supplied 16-bit
//! argument followed by its checksum. Each sensor family registers the commands it
//! understands in a static [`CommandTable`].

use core::fmt;
use core::str::FromStr;

use arrayvec::ArrayVec;

use super::crc::checksum8;
use super::error::SensorError;
use crate::sensor::SensorFamily;

/// Longest command on the wire: opcode (2) + argument word (2) + checksum (1).
pub const MAX_COMMAND_LEN: usize = 5;

/// Encoded command bytes, ready to be written to the bus.
pub type CommandFrame = ArrayVec<u8, MAX_COMMAND_LEN>;

/// Named operations a sensor family may support.
///
/// This is the closed set the command tables are keyed by; a family that does not
/// register an operation answers lookups for it with [`SensorError::UnknownOperation`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Start continuous measurement (SCD30, SPS30, SEN5x).
    StartMeasurement,
    /// Start measurement in RH/T/gas-only mode (SEN5x).
    StartRhtGasMeasurement,
    /// Stop continuous measurement.
    StopMeasurement,
    /// Query whether a new measurement can be read.
    DataReady,
    /// Read the measurement buffer.
    ReadMeasurement,
    /// Trigger one measurement and read it after the execution time (SHT3x).
    SingleShotMeasurement,
    ReadFirmwareVersion,
    SetAltitude,
    GetAltitude,
    SetTemperatureOffset,
    GetTemperatureOffset,
    SetMeasurementInterval,
    GetMeasurementInterval,
    SetForcedRecalibration,
    GetForcedRecalibration,
    SetSelfCalibration,
    GetSelfCalibration,
    /// Run the fan at full speed for a few seconds to blow out dust (particulate sensors).
    FanCleaning,
    ReadDeviceStatus,
    ClearDeviceStatus,
    SoftReset,
}

impl Operation {
    pub const ALL: [Operation; 21] = [
        Operation::StartMeasurement,
        Operation::StartRhtGasMeasurement,
        Operation::StopMeasurement,
        Operation::DataReady,
        Operation::ReadMeasurement,
        Operation::SingleShotMeasurement,
        Operation::ReadFirmwareVersion,
        Operation::SetAltitude,
        Operation::GetAltitude,
        Operation::SetTemperatureOffset,
        Operation::GetTemperatureOffset,
        Operation::SetMeasurementInterval,
        Operation::GetMeasurementInterval,
        Operation::SetForcedRecalibration,
        Operation::GetForcedRecalibration,
        Operation::SetSelfCalibration,
        Operation::GetSelfCalibration,
        Operation::FanCleaning,
        Operation::ReadDeviceStatus,
        Operation::ClearDeviceStatus,
        Operation::SoftReset,
    ];

    /// The operation's name as a host would send it (e.g. `"getAltitude"`).
    pub const fn name(self) -> &'static str {
        match self {
            Operation::StartMeasurement => "startMeasurement",
            Operation::StartRhtGasMeasurement => "startRhtGasMeasurement",
            Operation::StopMeasurement => "stopMeasurement",
            Operation::DataReady => "getDataReady",
            Operation::ReadMeasurement => "readMeasurement",
            Operation::SingleShotMeasurement => "measureSingleShot",
            Operation::ReadFirmwareVersion => "readFirmware",
            Operation::SetAltitude => "setAltitude",
            Operation::GetAltitude => "getAltitude",
            Operation::SetTemperatureOffset => "setTemperatureOffset",
            Operation::GetTemperatureOffset => "getTemperatureOffset",
            Operation::SetMeasurementInterval => "setMeasurementInterval",
            Operation::GetMeasurementInterval => "getMeasurementInterval",
            Operation::SetForcedRecalibration => "setForcedRecalibration",
            Operation::GetForcedRecalibration => "getForcedRecalibration",
            Operation::SetSelfCalibration => "setSelfCalibration",
            Operation::GetSelfCalibration => "getSelfCalibration",
            Operation::FanCleaning => "fanCleaning",
            Operation::ReadDeviceStatus => "readDeviceStatus",
            Operation::ClearDeviceStatus => "clearDeviceStatus",
            Operation::SoftReset => "softReset",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name any [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operation name '{0}'")]
pub struct ParseOperationError(pub String);

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ParseOperationError(s.into()))
    }
}

/// A single wire-level command. Immutable, defined at compile time per family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Command {
    /// Human-readable name, used in logs.
    pub name: &'static str,
    /// 16-bit command word, transmitted MSB first.
    pub opcode: u16,
    /// Fixed payload word sent after the opcode (e.g. the SPS30 output format).
    pub payload: Option<[u8; 2]>,
    /// Checksum byte for `payload`, as published by the vendor.
    pub checksum: Option<u8>,
    /// Number of bytes the sensor returns for this command (0 for write-only commands).
    pub response_len: usize,
    /// Time the sensor needs before the response can be read or the next command sent.
    pub execution_ms: u32,
}

impl Command {
    pub const fn new(name: &'static str, opcode: u16) -> Self {
        Command {
            name,
            opcode,
            payload: None,
            checksum: None,
            response_len: 0,
            execution_ms: 0,
        }
    }

    /// Attaches a fixed payload word and its checksum.
    pub const fn with_payload(mut self, payload: [u8; 2], checksum: u8) -> Self {
        self.payload = Some(payload);
        self.checksum = Some(checksum);
        self
    }

    /// Declares the length of the response frame.
    pub const fn reads(mut self, response_len: usize) -> Self {
        self.response_len = response_len;
        self
    }

    /// Declares the execution time in milliseconds.
    pub const fn executes_in(mut self, execution_ms: u32) -> Self {
        self.execution_ms = execution_ms;
        self
    }

    #[inline]
    pub const fn opcode_bytes(&self) -> [u8; 2] {
        self.opcode.to_be_bytes()
    }

    /// Encodes the command as written to the bus: opcode, then payload and checksum if any.
    pub fn frame(&self) -> CommandFrame {
        let mut frame = CommandFrame::new();
        frame.extend(self.opcode_bytes());
        if let (Some(payload), Some(checksum)) = (self.payload, self.checksum) {
            frame.extend(payload);
            frame.push(checksum);
        }
        frame
    }

    /// Encodes the command followed by a 16-bit argument and the argument's checksum.
    pub fn frame_with_argument(&self, argument: u16) -> CommandFrame {
        let word = argument.to_be_bytes();
        let mut frame = CommandFrame::new();
        frame.extend(self.opcode_bytes());
        frame.extend(word);
        frame.push(checksum8(word));
        frame
    }

    /// Encodes only the opcode, for reading back a value set with [`Command::frame_with_argument`].
    pub fn frame_opcode_only(&self) -> CommandFrame {
        let mut frame = CommandFrame::new();
        frame.extend(self.opcode_bytes());
        frame
    }
}

/// The static set of commands one sensor family understands.
#[derive(Debug)]
pub struct CommandTable {
    family: SensorFamily,
    entries: &'static [(Operation, Command)],
}

impl CommandTable {
    pub const fn new(family: SensorFamily, entries: &'static [(Operation, Command)]) -> Self {
        CommandTable { family, entries }
    }

    pub const fn family(&self) -> SensorFamily {
        self.family
    }

    /// Resolves `operation` to its wire command.
    ///
    /// # Returns
    ///
    /// * `Ok(&Command)` if the family registers the operation.
    /// * `Err(SensorError::UnknownOperation)` otherwise.
    pub fn lookup<E>(&self, operation: Operation) -> Result<&'static Command, SensorError<E>>
    where
        E: core::fmt::Debug,
    {
        let entries: &'static [(Operation, Command)] = self.entries;
        entries
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, command)| command)
            .ok_or_else(|| SensorError::UnknownOperation {
                family: self.family,
                operation: operation.name().into(),
            })
    }

    /// Resolves an operation given by name (e.g. `"fanCleaning"`).
    pub fn lookup_named<E>(&self, name: &str) -> Result<&'static Command, SensorError<E>>
    where
        E: core::fmt::Debug,
    {
        let operation = name.parse::<Operation>().map_err(|e| SensorError::UnknownOperation {
            family: self.family,
            operation: e.0,
        })?;
        self.lookup(operation)
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.entries.iter().any(|(op, _)| *op == operation)
    }

    pub fn commands(&self) -> impl Iterator<Item = &'static Command> {
        let entries: &'static [(Operation, Command)] = self.entries;
        entries.iter().map(|(_, command)| command)
    }
}

/// Resolves `operation` in `family`'s command table.
pub fn lookup<E>(family: SensorFamily, operation: Operation) -> Result<&'static Command, SensorError<E>>
where
    E: core::fmt::Debug,
{
    family.profile().commands.lookup(operation)
}

/// Resolves an operation by name in `family`'s command table.
pub fn lookup_named<E>(family: SensorFamily, name: &str) -> Result<&'static Command, SensorError<E>>
where
    E: core::fmt::Debug,
{
    family.profile().commands.lookup_named(name)
}
