// src/common/address.rs

use core::convert::TryFrom;
use core::fmt;

/// A 7-bit I2C device address outside the reserved ranges.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct DeviceAddress(u8);

/// Returned when a byte is not usable as a 7-bit device address.
#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("Invalid 7-bit I2C address: {0:#04x}")]
pub struct InvalidAddress(pub u8);

impl DeviceAddress {
    /// SCD30 CO2 / RH / T sensor.
    pub const SCD30: DeviceAddress = DeviceAddress(0x61);
    /// SPS30 and SEN5x particulate matter sensors share this address.
    pub const PARTICULATE: DeviceAddress = DeviceAddress(0x69);
    /// SHT3x RH / T sensor (ADDR pin low).
    pub const SHT3X: DeviceAddress = DeviceAddress(0x44);

    /// Creates a new `DeviceAddress` if `address` is a valid, non-reserved 7-bit address.
    pub fn new(address: u8) -> Result<Self, InvalidAddress> {
        if Self::is_valid(address) {
            Ok(DeviceAddress(address))
        } else {
            Err(InvalidAddress(address))
        }
    }

    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// 0x00-0x07 and 0x78-0x7F are reserved by the I2C specification.
    #[inline]
    pub const fn is_valid(address: u8) -> bool {
        matches!(address, 0x08..=0x77)
    }
}

impl TryFrom<u8> for DeviceAddress {
    type Error = InvalidAddress;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceAddress> for u8 {
    fn from(value: DeviceAddress) -> Self {
        value.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
