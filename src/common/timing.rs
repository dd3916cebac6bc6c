// src/common/timing.rs

use core::time::Duration;

// Execution times are the minimum wait between writing a command and reading its
// response (or sending the next command), taken from the vendor datasheets.

// === SCD30 (datasheet: 3 ms between write and read when clock stretching is unavailable) ===

pub const SCD30_COMMAND_MS: u32 = 3;
/// Soft reset: the sensor needs up to 2 s to boot.
pub const SCD30_SOFT_RESET_MS: u32 = 2000;

// === SPS30 ===

pub const SPS30_COMMAND_MS: u32 = 20;
/// Stop needs 20 ms before the next command; start needs 20 ms as well.
pub const SPS30_START_STOP_MS: u32 = 20;

// === SEN5x ===

pub const SEN5X_READ_MS: u32 = 20;
pub const SEN5X_START_MS: u32 = 50;
pub const SEN5X_STOP_MS: u32 = 200;
pub const SEN5X_SOFT_RESET_MS: u32 = 100;

// === SHT3x ===

/// Single shot, high repeatability (max 15 ms).
pub const SHT3X_SINGLE_SHOT_MS: u32 = 15;
pub const SHT3X_COMMAND_MS: u32 = 1;
/// Soft reset (max 1.5 ms).
pub const SHT3X_SOFT_RESET_MS: u32 = 2;

// === Caller-level polling ===

/// Attempts made by `measure_until_ready` before giving up with `DataNotReady`.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 5;
/// Pause between attempts; continuous sensors publish a new sample about once a second.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
