// src/common/hal_traits.rs

use core::fmt::Debug;

/// Abstraction for the byte-level I2C exchanges the protocol layer needs.
///
/// One call is one bus transaction to a 7-bit address. Implementations do not
/// retry; errors are reported as-is in [`SensorError::Transport`](super::error::SensorError::Transport).
#[allow(async_fn_in_trait)]
pub trait I2cTransport {
    /// Associated error type for bus failures (NACK, arbitration loss, absent device).
    type Error: Debug;

    /// Writes `bytes` to the device at `address`.
    async fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Reads exactly `buffer.len()` bytes from the device at `address`.
    async fn read_bytes(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Waits at least `ms` milliseconds (command execution time).
    async fn delay_ms(&mut self, ms: u32);
}

/// Adapts any `embedded-hal-async` I2C bus and delay to [`I2cTransport`].
#[cfg(feature = "impl-native")]
#[derive(Debug)]
pub struct HalBus<I2C, D> {
    i2c: I2C,
    delay: D,
}

#[cfg(feature = "impl-native")]
impl<I2C, D> HalBus<I2C, D>
where
    I2C: embedded_hal_async::i2c::I2c,
    D: embedded_hal_async::delay::DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        HalBus { i2c, delay }
    }

    /// Releases the bus and delay peripherals.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

#[cfg(feature = "impl-native")]
impl<I2C, D> I2cTransport for HalBus<I2C, D>
where
    I2C: embedded_hal_async::i2c::I2c,
    D: embedded_hal_async::delay::DelayNs,
{
    type Error = I2C::Error;

    async fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        embedded_hal_async::i2c::I2c::write(&mut self.i2c, address, bytes).await
    }

    async fn read_bytes(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        embedded_hal_async::i2c::I2c::read(&mut self.i2c, address, buffer).await
    }

    async fn delay_ms(&mut self, ms: u32) {
        embedded_hal_async::delay::DelayNs::delay_ms(&mut self.delay, ms).await
    }
}

/// Adapts a blocking `embedded-hal` I2C bus and delay to [`I2cTransport`].
///
/// Each call blocks the executing thread for the duration of the transfer or delay.
#[cfg(feature = "impl-blocking")]
#[derive(Debug)]
pub struct BlockingBus<I2C, D> {
    i2c: I2C,
    delay: D,
}

#[cfg(feature = "impl-blocking")]
impl<I2C, D> BlockingBus<I2C, D>
where
    I2C: embedded_hal::i2c::I2c,
    D: embedded_hal::delay::DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        BlockingBus { i2c, delay }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

#[cfg(feature = "impl-blocking")]
impl<I2C, D> I2cTransport for BlockingBus<I2C, D>
where
    I2C: embedded_hal::i2c::I2c,
    D: embedded_hal::delay::DelayNs,
{
    type Error = I2C::Error;

    async fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::write(&mut self.i2c, address, bytes)
    }

    async fn read_bytes(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::read(&mut self.i2c, address, buffer)
    }

    async fn delay_ms(&mut self, ms: u32) {
        embedded_hal::delay::DelayNs::delay_ms(&mut self.delay, ms)
    }
}
