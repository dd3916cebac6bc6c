// src/common/error.rs

use crate::sensor::SensorFamily;

/// Errors surfaced by the protocol layer.
///
/// `E` is the transport's own error type, carried verbatim in [`SensorError::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum SensorError<E = ()>
where
    E: core::fmt::Debug,
{
    /// The underlying bus write or read failed (device absent, NACK, contention).
    #[error("I2C transport error: {0:?}")]
    Transport(E),

    /// A response frame whose length is not a whole number of 3-byte words,
    /// or longer than any frame the sensors produce.
    #[error("Malformed frame: {len} bytes is not a valid word sequence")]
    FrameLength { len: usize },

    /// A word's checksum byte did not match; names the field the word belongs to.
    #[error("Checksum mismatch in field '{field}'")]
    Checksum { field: &'static str },

    /// The sensor has no new measurement yet. Not a fault: poll again later.
    #[error("No new measurement available")]
    DataNotReady,

    /// The operation is not defined in the family's command table.
    #[error("Operation '{operation}' is not supported by {family}")]
    UnknownOperation {
        family: SensorFamily,
        operation: String,
    },
}

impl<E: core::fmt::Debug> SensorError<E> {
    /// `true` for the "try again later" result of a data-ready poll.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, SensorError::DataNotReady)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct MockIoError;

    #[test]
    fn test_display_names_field() {
        let err: SensorError<MockIoError> = SensorError::Checksum { field: "CO2" };
        assert_eq!(err.to_string(), "Checksum mismatch in field 'CO2'");
    }

    #[test]
    fn test_display_unknown_operation() {
        let err: SensorError = SensorError::UnknownOperation {
            family: SensorFamily::Sht3x,
            operation: "fanCleaning".into(),
        };
        assert_eq!(err.to_string(), "Operation 'fanCleaning' is not supported by SHT3x");
    }

    #[test]
    fn test_transport_is_debug_formatted() {
        let err = SensorError::Transport(MockIoError);
        assert_eq!(err.to_string(), "I2C transport error: MockIoError");
        assert!(!err.is_not_ready());
        assert!(SensorError::<MockIoError>::DataNotReady.is_not_ready());
    }
}
