// src/session/mod.rs

//! Measurement session: command dispatch, data-ready polling, response read and decode
//! for one sensor on a [`SharedBus`].

mod transaction;

#[cfg(test)]
pub(crate) mod mock;

use core::fmt;
use core::time::Duration;

use tokio::sync::{Mutex, OnceCell};

use crate::common::address::DeviceAddress;
use crate::common::bus::SharedBus;
use crate::common::command::{Command, Operation};
use crate::common::error::SensorError;
use crate::common::field::decode_fields;
use crate::common::hal_traits::I2cTransport;
use crate::common::numeric::Decode;
use crate::common::timing::{DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::common::types::{FieldValue, Reading};
use crate::common::util::{SystemUtilities, Utilities};
use crate::common::word::{decode_words, RawFrame};
use crate::sensor::{FamilyProfile, MeasurementMode, SensorFamily};

/// Reading key of the derived dew point.
pub const DEW_POINT_FIELD: &str = "DPc";

/// Lifecycle of a session.
///
/// `Error` only marks the outcome of the last cycle; the next [`MeasurementSession::measure`]
/// resets it to `Idle` before doing anything else.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Measuring,
    AwaitingData,
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Measuring => "measuring",
            SessionState::AwaitingData => "awaiting data",
            SessionState::Error => "error",
        };
        f.write_str(name)
    }
}

/// How [`MeasurementSession::measure_until_ready`] retries a not-ready sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total number of `measure` attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Sleep between attempts. The bus is not held while sleeping.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Per-session configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Overrides the family's default bus address.
    pub address: Option<DeviceAddress>,
    pub poll: PollPolicy,
}

impl SessionConfig {
    pub fn with_address(mut self, address: DeviceAddress) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

/// Session state plus whether the sensor has been told to measure.
#[derive(Debug, Default)]
struct Lifecycle {
    state: SessionState,
    /// Set by a successful start, cleared by a successful stop.
    started: bool,
}

/// A data-ready word signals a new measurement with `1` in its low byte.
#[inline]
fn is_data_ready(status: u16) -> bool {
    status & 0x00FF == 0x0001
}

/// Drives one sensor of a given family over a shared bus.
///
/// Methods take `&self`; calls on one session are serialized by an internal
/// state lock, which is always taken before the bus lock.
pub struct MeasurementSession<'bus, T, U = SystemUtilities>
where
    T: I2cTransport,
    U: Utilities,
{
    bus: &'bus SharedBus<T>,
    profile: &'static FamilyProfile,
    address: DeviceAddress,
    config: SessionConfig,
    utilities: U,
    lifecycle: Mutex<Lifecycle>,
    firmware: OnceCell<String>,
}

impl<'bus, T: I2cTransport> MeasurementSession<'bus, T, SystemUtilities> {
    /// Creates a session at the family's default address with default settings.
    pub fn new(bus: &'bus SharedBus<T>, family: SensorFamily) -> Self {
        Self::with_config(bus, family, SessionConfig::default(), SystemUtilities)
    }
}

impl<'bus, T, U> MeasurementSession<'bus, T, U>
where
    T: I2cTransport,
    U: Utilities,
{
    pub fn with_config(bus: &'bus SharedBus<T>, family: SensorFamily, config: SessionConfig, utilities: U) -> Self {
        let profile = family.profile();
        MeasurementSession {
            bus,
            profile,
            address: config.address.unwrap_or(profile.default_address),
            config,
            utilities,
            lifecycle: Mutex::new(Lifecycle::default()),
            firmware: OnceCell::new(),
        }
    }

    pub fn family(&self) -> SensorFamily {
        self.profile.family
    }

    pub fn profile(&self) -> &'static FamilyProfile {
        self.profile
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn state(&self) -> SessionState {
        self.lifecycle.lock().await.state
    }

    /// Firmware version, if it has been read already.
    pub fn cached_firmware_version(&self) -> Option<&str> {
        self.firmware.get().map(String::as_str)
    }

    /// `"<FAMILY> @ 0x<addr>"`, plus `", FW <version>"` once the firmware version is known.
    pub fn display_name(&self) -> String {
        match self.firmware.get() {
            Some(version) => format!("{} @ {}, FW {}", self.profile.family, self.address, version),
            None => format!("{} @ {}", self.profile.family, self.address),
        }
    }

    fn command(&self, operation: Operation) -> Result<&'static Command, SensorError<T::Error>> {
        self.profile.commands.lookup(operation)
    }

    fn transition(&self, state: &mut SessionState, next: SessionState) {
        if *state != next {
            tracing::debug!(sensor = %self.profile.family, from = %*state, to = %next, "State transition");
            *state = next;
        }
    }

    // --- Lifecycle ---

    /// Starts continuous measurement.
    ///
    /// On failure the session state is left unchanged and the error is returned.
    pub async fn start(&self) -> Result<(), SensorError<T::Error>> {
        self.start_with(Operation::StartMeasurement).await
    }

    /// Starts measurement with a family-specific start command (e.g. SEN5x RH/T/gas-only mode).
    pub async fn start_with(&self, operation: Operation) -> Result<(), SensorError<T::Error>> {
        let command = self.command(operation)?;
        let mut lifecycle = self.lifecycle.lock().await;
        {
            let mut bus = self.bus.acquire().await;
            transaction::send_command(&mut *bus, self.address.as_u8(), command, &command.frame()).await?;
        }
        lifecycle.started = true;
        self.transition(&mut lifecycle.state, SessionState::Measuring);
        Ok(())
    }

    /// Stops continuous measurement and returns to `Idle`.
    pub async fn stop(&self) -> Result<(), SensorError<T::Error>> {
        let command = self.command(Operation::StopMeasurement)?;
        let mut lifecycle = self.lifecycle.lock().await;
        {
            let mut bus = self.bus.acquire().await;
            transaction::send_command(&mut *bus, self.address.as_u8(), command, &command.frame()).await?;
        }
        lifecycle.started = false;
        self.transition(&mut lifecycle.state, SessionState::Idle);
        Ok(())
    }

    /// Runs one measurement cycle.
    ///
    /// Continuous families poll data-ready first and return [`SensorError::DataNotReady`]
    /// without reading when no new sample is available. Single-shot families trigger a
    /// measurement, wait for it and read it. The whole bus exchange runs under one lock.
    ///
    /// Continuous families only produce data after [`start`](Self::start). A session that
    /// was never started (or has been stopped) still polls, but ends the cycle in `Idle`.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` with every field of the family, plus the dew point where applicable.
    /// * `Err(SensorError::Checksum)` naming the first field whose word failed validation.
    pub async fn measure(&self) -> Result<Reading, SensorError<T::Error>> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state == SessionState::Error {
            tracing::debug!(sensor = %self.profile.family, "Clearing error from previous cycle");
            self.transition(&mut lifecycle.state, SessionState::Idle);
        }
        if self.profile.mode == MeasurementMode::Continuous && !lifecycle.started {
            tracing::debug!(sensor = %self.profile.family, "Measuring without a prior start");
        }

        let outcome = self.run_cycle(&mut lifecycle.state).await;
        let next = match &outcome {
            Err(e) if !e.is_not_ready() => SessionState::Error,
            _ if lifecycle.started => SessionState::Measuring,
            _ => SessionState::Idle,
        };
        self.transition(&mut lifecycle.state, next);
        drop(lifecycle);

        let values = outcome?;
        Ok(self.assemble(values))
    }

    async fn run_cycle(&self, state: &mut SessionState) -> Result<Vec<FieldValue>, SensorError<T::Error>> {
        let address = self.address.as_u8();
        let raw = {
            let mut bus = self.bus.acquire().await;
            match self.profile.mode {
                MeasurementMode::SingleShot => {
                    let trigger = self.command(Operation::SingleShotMeasurement)?;
                    self.transition(state, SessionState::Measuring);
                    transaction::send_command(&mut *bus, address, trigger, &trigger.frame()).await?;
                    transaction::read_frame(&mut *bus, address, trigger.response_len).await?
                }
                MeasurementMode::Continuous => {
                    let poll = self.command(Operation::DataReady)?;
                    let read = self.command(Operation::ReadMeasurement)?;
                    self.transition(state, SessionState::AwaitingData);
                    let words = transaction::query(&mut *bus, address, poll, &poll.frame()).await?;
                    let status = transaction::first_word(&words, "data_ready")?;
                    if !is_data_ready(status) {
                        tracing::trace!(sensor = %self.profile.family, status, "No new measurement");
                        return Err(SensorError::DataNotReady);
                    }
                    transaction::send_command(&mut *bus, address, read, &read.frame()).await?;
                    transaction::read_frame(&mut *bus, address, read.response_len).await?
                }
            }
        };

        let words = decode_words(RawFrame(&raw))?;
        decode_fields(self.profile.fields, &words)
    }

    fn assemble(&self, mut values: Vec<FieldValue>) -> Reading {
        for (value, field) in values.iter_mut().zip(self.profile.fields) {
            if matches!(field.decode, Decode::FixedPointScale { .. }) {
                value.value = self.utilities.round(value.value);
            }
        }
        let mut reading = Reading::new(self.display_name(), self.utilities.timestamp(), values);
        if let Some((temperature, humidity)) = self.profile.dew_point {
            if let (Some(t), Some(rh)) = (reading.get(temperature), reading.get(humidity)) {
                let value = self.utilities.round(self.utilities.dew_point(t, rh));
                reading.push(FieldValue {
                    name: DEW_POINT_FIELD,
                    value,
                    unit: "°C",
                });
            }
        }
        reading
    }

    /// Calls [`measure`](Self::measure) until it yields a reading or the poll policy is exhausted.
    ///
    /// Sleeps [`PollPolicy::interval`] between attempts without holding the bus.
    /// Errors other than `DataNotReady` are returned immediately.
    pub async fn measure_until_ready(&self) -> Result<Reading, SensorError<T::Error>> {
        let policy = self.config.poll;
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.measure().await {
                Err(e) if e.is_not_ready() && attempt < attempts => {
                    tracing::trace!(sensor = %self.profile.family, attempt, "Retrying after not-ready poll");
                    tokio::time::sleep(policy.interval).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    // --- Auxiliary exchanges ---

    /// Reads the firmware version as `"<major>.<minor>"`.
    ///
    /// The first successful read is cached for the lifetime of the session;
    /// later calls do not touch the bus.
    pub async fn read_firmware_version(&self) -> Result<String, SensorError<T::Error>> {
        let version = self
            .firmware
            .get_or_try_init(|| async {
                let raw = self.read_word(Operation::ReadFirmwareVersion, "firmware").await?;
                let [major, minor] = raw.to_be_bytes();
                let version = format!("{major}.{minor}");
                tracing::debug!(sensor = %self.profile.family, version = %version, "Firmware version");
                Ok::<_, SensorError<T::Error>>(version)
            })
            .await?;
        Ok(version.clone())
    }

    /// Sends a write-only command and waits its execution time.
    pub async fn execute(&self, operation: Operation) -> Result<(), SensorError<T::Error>> {
        let command = self.command(operation)?;
        let mut bus = self.bus.acquire().await;
        transaction::send_command(&mut *bus, self.address.as_u8(), command, &command.frame()).await
    }

    /// Sends a setter command carrying a 16-bit argument.
    pub async fn write_argument(&self, operation: Operation, argument: u16) -> Result<(), SensorError<T::Error>> {
        let command = self.command(operation)?;
        let frame = command.frame_with_argument(argument);
        let mut bus = self.bus.acquire().await;
        transaction::send_command(&mut *bus, self.address.as_u8(), command, &frame).await
    }

    /// Reads a single-word value, validating its checksum under the name `field`.
    pub async fn read_word(&self, operation: Operation, field: &'static str) -> Result<u16, SensorError<T::Error>> {
        let command = self.command(operation)?;
        let words = {
            let mut bus = self.bus.acquire().await;
            transaction::query(&mut *bus, self.address.as_u8(), command, &command.frame_opcode_only()).await?
        };
        transaction::first_word(&words, field)
    }

    /// Reads a two-word (32-bit) value such as a device status register.
    pub async fn read_u32(&self, operation: Operation, field: &'static str) -> Result<u32, SensorError<T::Error>> {
        let command = self.command(operation)?;
        let words = {
            let mut bus = self.bus.acquire().await;
            transaction::query(&mut *bus, self.address.as_u8(), command, &command.frame_opcode_only()).await?
        };
        transaction::first_u32(&words, field)
    }

    /// Sets the altitude compensation in meters above sea level.
    pub async fn set_altitude(&self, meters: u16) -> Result<(), SensorError<T::Error>> {
        self.write_argument(Operation::SetAltitude, meters).await
    }

    pub async fn get_altitude(&self) -> Result<u16, SensorError<T::Error>> {
        self.read_word(Operation::GetAltitude, "altitude").await
    }

    /// Sets the temperature offset in hundredths of a degree.
    pub async fn set_temperature_offset(&self, offset: u16) -> Result<(), SensorError<T::Error>> {
        self.write_argument(Operation::SetTemperatureOffset, offset).await
    }

    pub async fn get_temperature_offset(&self) -> Result<u16, SensorError<T::Error>> {
        self.read_word(Operation::GetTemperatureOffset, "temperature_offset").await
    }

    pub async fn trigger_fan_cleaning(&self) -> Result<(), SensorError<T::Error>> {
        self.execute(Operation::FanCleaning).await
    }
}

impl<T, U> fmt::Debug for MeasurementSession<'_, T, U>
where
    T: I2cTransport,
    U: Utilities,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasurementSession")
            .field("family", &self.profile.family)
            .field("address", &self.address)
            .field("config", &self.config)
            .field("firmware", &self.firmware.get())
            .finish_non_exhaustive()
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::mock::{float_words, FixedUtilities, MockBus, MockBusError};
    use super::*;
    use crate::common::word::encode_words;

    fn scd30(bus: &SharedBus<MockBus>) -> MeasurementSession<'_, MockBus, FixedUtilities> {
        MeasurementSession::with_config(bus, SensorFamily::Scd30, SessionConfig::default(), FixedUtilities)
    }

    fn scd30_frame(co2: f32, t: f32, rh: f32) -> Vec<u16> {
        [float_words(co2), float_words(t), float_words(rh)].concat()
    }

    #[tokio::test]
    async fn test_start_transitions_to_measuring() {
        let bus = SharedBus::new(MockBus::new());
        let session = scd30(&bus);
        assert_eq!(session.state().await, SessionState::Idle);

        session.start().await.unwrap();
        assert_eq!(session.state().await, SessionState::Measuring);

        let mock = bus.acquire().await;
        assert_eq!(mock.writes, vec![(0x61, vec![0x00, 0x10, 0x00, 0x00, 0x81])]);
        assert_eq!(mock.delays, vec![3]);
    }

    #[tokio::test]
    async fn test_start_transport_failure_stays_idle() {
        let bus = SharedBus::new(MockBus::new());
        bus.acquire().await.fail_next_writes(1);
        let session = scd30(&bus);

        let err = session.start().await.unwrap_err();
        assert!(matches!(err, SensorError::Transport(MockBusError)));
        assert_eq!(session.state().await, SessionState::Idle);
        assert_eq!(bus.acquire().await.call_count("delay"), 0);
    }

    #[tokio::test]
    async fn test_stop_returns_to_idle() {
        let bus = SharedBus::new(MockBus::new());
        let session = scd30(&bus);
        session.start().await.unwrap();
        session.stop().await.unwrap();
        assert_eq!(session.state().await, SessionState::Idle);
        assert_eq!(bus.acquire().await.opcodes(), vec![0x0010, 0x0104]);
    }

    #[tokio::test]
    async fn test_not_ready_never_issues_read_measurement() {
        let bus = SharedBus::new(MockBus::new());
        bus.acquire().await.stage_words(&[0x0000]);
        let session = scd30(&bus);

        let err = session.measure().await.unwrap_err();
        assert!(err.is_not_ready());
        assert_eq!(session.state().await, SessionState::Idle);

        let mock = bus.acquire().await;
        assert_eq!(mock.opcodes(), vec![0x0202]);
        assert_eq!(mock.reads, vec![(0x61, 3)]);
    }

    #[tokio::test]
    async fn test_unstarted_continuous_session_stays_idle() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0000]);
            mock.stage_words(&[0x0000]);
            mock.stage_words(&[0x0000]);
        }
        let session = MeasurementSession::with_config(&bus, SensorFamily::Sps30, SessionConfig::default(), FixedUtilities);

        assert!(session.measure().await.unwrap_err().is_not_ready());
        assert_eq!(session.state().await, SessionState::Idle);

        session.start().await.unwrap();
        assert!(session.measure().await.unwrap_err().is_not_ready());
        assert_eq!(session.state().await, SessionState::Measuring);

        session.stop().await.unwrap();
        assert!(session.measure().await.unwrap_err().is_not_ready());
        assert_eq!(session.state().await, SessionState::Idle);

        assert_eq!(bus.acquire().await.opcodes(), vec![0x0202, 0x0010, 0x0202, 0x0104, 0x0202]);
    }

    #[tokio::test]
    async fn test_concurrent_calls_on_one_session_run_in_order() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0001]);
            mock.stage_words(&scd30_frame(400.0, 25.0, 50.0));
        }
        let session = scd30(&bus);

        let (started, reading, stopped) = tokio::join!(session.start(), session.measure(), session.stop());
        started.unwrap();
        assert_eq!(reading.unwrap().get("CO2"), Some(400.0));
        stopped.unwrap();
        assert_eq!(session.state().await, SessionState::Idle);

        let mock = bus.acquire().await;
        assert_eq!(mock.opcodes(), vec![0x0010, 0x0202, 0x0300, 0x0104]);
        assert_eq!(mock.reads, vec![(0x61, 3), (0x61, 18)]);
    }

    #[tokio::test]
    async fn test_ready_measurement_decodes_reading() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0001]);
            mock.stage_words(&scd30_frame(400.0, 25.0, 50.0));
        }
        let session = scd30(&bus);
        session.start().await.unwrap();

        let reading = session.measure().await.unwrap();
        assert_eq!(reading.sensor, "SCD30 @ 0x61");
        assert_eq!(reading.timestamp, "2024-05-01T12:00:00Z");
        assert_eq!(reading.get("CO2"), Some(400.0));
        assert_eq!(reading.get("Tc"), Some(25.0));
        assert_eq!(reading.get("RH"), Some(50.0));
        assert_eq!(reading.get(DEW_POINT_FIELD), Some(13.85));
        assert_eq!(session.state().await, SessionState::Measuring);

        let mock = bus.acquire().await;
        assert_eq!(mock.opcodes(), vec![0x0010, 0x0202, 0x0300]);
        assert_eq!(mock.reads, vec![(0x61, 3), (0x61, 18)]);
    }

    #[tokio::test]
    async fn test_corrupt_word_fails_whole_reading_then_recovers() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0001]);
            let mut frame = encode_words(&scd30_frame(400.0, 25.0, 50.0));
            // Second word of RH (bytes 15..18)
            frame[17] ^= 0xFF;
            mock.stage_read(&frame);
            mock.stage_words(&[0x0000]);
        }
        let session = scd30(&bus);
        session.start().await.unwrap();

        let err = session.measure().await.unwrap_err();
        assert!(matches!(err, SensorError::Checksum { field: "RH" }));
        assert_eq!(session.state().await, SessionState::Error);

        // The next cycle is not blocked by the error
        let err = session.measure().await.unwrap_err();
        assert!(err.is_not_ready());
        assert_eq!(session.state().await, SessionState::Measuring);
    }

    #[tokio::test]
    async fn test_read_failure_enters_error_state() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0001]);
            mock.stage_read_error();
        }
        let session = scd30(&bus);

        let err = session.measure().await.unwrap_err();
        assert!(matches!(err, SensorError::Transport(MockBusError)));
        assert_eq!(session.state().await, SessionState::Error);
    }

    #[tokio::test]
    async fn test_corrupt_data_ready_word() {
        let bus = SharedBus::new(MockBus::new());
        bus.acquire().await.stage_read(&[0x00, 0x01, 0x00]);
        let session = scd30(&bus);

        let err = session.measure().await.unwrap_err();
        assert!(matches!(err, SensorError::Checksum { field: "data_ready" }));
        assert_eq!(bus.acquire().await.opcodes(), vec![0x0202]);
    }

    #[tokio::test]
    async fn test_firmware_version_is_cached() {
        let bus = SharedBus::new(MockBus::new());
        bus.acquire().await.stage_words(&[0x0302]);
        let session = scd30(&bus);
        assert_eq!(session.cached_firmware_version(), None);

        assert_eq!(session.read_firmware_version().await.unwrap(), "3.2");
        assert_eq!(session.read_firmware_version().await.unwrap(), "3.2");
        assert_eq!(session.display_name(), "SCD30 @ 0x61, FW 3.2");

        let mock = bus.acquire().await;
        assert_eq!(mock.call_count("write"), 1);
        assert_eq!(mock.call_count("read"), 1);
        assert_eq!(mock.writes[0].1, vec![0xD1, 0x00]);
    }

    #[tokio::test]
    async fn test_failed_firmware_read_is_not_cached() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_read(&[0x03, 0x02, 0x00]);
            mock.stage_words(&[0x0302]);
        }
        let session = scd30(&bus);

        let err = session.read_firmware_version().await.unwrap_err();
        assert!(matches!(err, SensorError::Checksum { field: "firmware" }));
        assert_eq!(session.cached_firmware_version(), None);
        assert_eq!(session.read_firmware_version().await.unwrap(), "3.2");
    }

    #[tokio::test]
    async fn test_auxiliary_exchanges_leave_state_alone() {
        let bus = SharedBus::new(MockBus::new());
        bus.acquire().await.stage_words(&[290]);
        let session = scd30(&bus);

        session.set_altitude(290).await.unwrap();
        assert_eq!(session.get_altitude().await.unwrap(), 290);
        assert_eq!(session.state().await, SessionState::Idle);

        let mock = bus.acquire().await;
        assert_eq!(mock.writes[0].1, vec![0x51, 0x02, 0x01, 0x22, crate::common::crc::checksum8([0x01, 0x22])]);
        assert_eq!(mock.writes[1].1, vec![0x51, 0x02]);
    }

    #[tokio::test]
    async fn test_unsupported_operation_touches_no_bus() {
        let bus = SharedBus::new(MockBus::new());
        let session = MeasurementSession::new(&bus, SensorFamily::Sht3x);

        let err = session.trigger_fan_cleaning().await.unwrap_err();
        assert!(matches!(
            err,
            SensorError::UnknownOperation { family: SensorFamily::Sht3x, ref operation } if operation == "fanCleaning"
        ));
        assert!(session.start().await.is_err());
        assert_eq!(session.state().await, SessionState::Idle);
        assert_eq!(bus.acquire().await.call_count("write"), 0);
    }

    #[tokio::test]
    async fn test_address_override() {
        let bus = SharedBus::new(MockBus::new());
        let config = SessionConfig::default().with_address(DeviceAddress::new(0x45).unwrap());
        let session = MeasurementSession::with_config(&bus, SensorFamily::Sht3x, config, FixedUtilities);
        assert_eq!(session.display_name(), "SHT3x @ 0x45");

        session.execute(Operation::SoftReset).await.unwrap();
        assert_eq!(bus.acquire().await.writes[0].0, 0x45);
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_until_ready_retries_then_reads() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0000]);
            mock.stage_words(&[0x0000]);
            mock.stage_words(&[0x0001]);
            mock.stage_words(&scd30_frame(415.5, 21.0, 40.0));
        }
        let poll = PollPolicy::default().with_max_attempts(5).with_interval(Duration::from_secs(1));
        let session = MeasurementSession::with_config(
            &bus,
            SensorFamily::Scd30,
            SessionConfig::default().with_poll(poll),
            FixedUtilities,
        );

        let started = tokio::time::Instant::now();
        let reading = session.measure_until_ready().await.unwrap();
        assert_eq!(reading.get("CO2"), Some(415.5));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3), "{elapsed:?}");
        assert_eq!(bus.acquire().await.opcodes(), vec![0x0202, 0x0202, 0x0202, 0x0300]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_until_ready_gives_up() {
        let bus = SharedBus::new(MockBus::new());
        {
            let mut mock = bus.acquire().await;
            mock.stage_words(&[0x0000]);
            mock.stage_words(&[0x0000]);
        }
        let poll = PollPolicy::default().with_max_attempts(2);
        let session = MeasurementSession::with_config(
            &bus,
            SensorFamily::Scd30,
            SessionConfig::default().with_poll(poll),
            FixedUtilities,
        );

        let err = session.measure_until_ready().await.unwrap_err();
        assert!(err.is_not_ready());
        let mock = bus.acquire().await;
        assert_eq!(mock.call_count("write"), 2);
        assert_eq!(mock.pending_reads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_until_ready_does_not_retry_faults() {
        let bus = SharedBus::new(MockBus::new());
        bus.acquire().await.fail_next_writes(1);
        let session = scd30(&bus);

        let err = session.measure_until_ready().await.unwrap_err();
        assert!(matches!(err, SensorError::Transport(MockBusError)));
        assert_eq!(bus.acquire().await.call_count("write"), 1);
    }
}
