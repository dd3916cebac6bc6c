// src/common/bus.rs

use tokio::sync::{Mutex, MutexGuard};

use super::hal_traits::I2cTransport;

/// An I2C transport shared by every driver on the bus.
///
/// Drivers borrow the bus and lock it for the length of one exchange. The lock
/// is granted in request order.
#[derive(Debug)]
pub struct SharedBus<T> {
    transport: Mutex<T>,
}

impl<T: I2cTransport> SharedBus<T> {
    pub fn new(transport: T) -> Self {
        SharedBus {
            transport: Mutex::new(transport),
        }
    }

    /// Waits for exclusive use of the bus.
    pub async fn acquire(&self) -> MutexGuard<'_, T> {
        self.transport.lock().await
    }

    /// Closes the bus and hands back the transport. Requires that no driver still borrows it.
    pub fn into_inner(self) -> T {
        self.transport.into_inner()
    }
}
