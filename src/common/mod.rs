// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod address;
pub mod bus;
pub mod command;
pub mod crc;
pub mod error;
pub mod field;
pub mod hal_traits;
pub mod numeric;
pub mod timing;
pub mod types;
pub mod util;
pub mod word;

// --- Re-export key types/traits/functions for easier access ---

pub use address::{DeviceAddress, InvalidAddress};
pub use bus::SharedBus;
pub use command::{lookup, lookup_named, Command, CommandFrame, CommandTable, Operation, ParseOperationError};
pub use crc::{calculate_crc8, checksum8, verify_checksum8};
pub use error::SensorError;
pub use field::{decode_fields, FieldDescriptor};
pub use hal_traits::I2cTransport;
pub use numeric::Decode;
pub use types::{FieldValue, Reading};
pub use util::{SystemUtilities, Utilities};
pub use word::{decode_words, RawFrame, Word};

// --- Feature-gated re-exports ---

#[cfg(feature = "impl-native")]
pub use hal_traits::HalBus;
#[cfg(feature = "impl-blocking")]
pub use hal_traits::BlockingBus;
