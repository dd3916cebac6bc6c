// src/session/transaction.rs

use arrayvec::ArrayVec;

use crate::common::command::Command;
use crate::common::error::SensorError;
use crate::common::hal_traits::I2cTransport;
use crate::common::word::{decode_words, RawFrame, Words, MAX_FRAME_LEN};

/// Writes an encoded command, then waits out the command's execution time.
///
/// The caller must hold the bus lock for the whole exchange.
pub(super) async fn send_command<T: I2cTransport>(
    bus: &mut T,
    address: u8,
    command: &Command,
    frame: &[u8],
) -> Result<(), SensorError<T::Error>> {
    tracing::trace!(address, command = command.name, bytes = ?frame, "I2C write");
    bus.write_bytes(address, frame).await.map_err(|e| {
        tracing::warn!(address, command = command.name, error = ?e, "I2C write failed");
        SensorError::Transport(e)
    })?;
    if command.execution_ms > 0 {
        bus.delay_ms(command.execution_ms).await;
    }
    Ok(())
}

/// Reads the `len`-byte response of the command just sent.
pub(super) async fn read_frame<T: I2cTransport>(
    bus: &mut T,
    address: u8,
    len: usize,
) -> Result<ArrayVec<u8, MAX_FRAME_LEN>, SensorError<T::Error>> {
    if len > MAX_FRAME_LEN {
        return Err(SensorError::FrameLength { len });
    }
    let mut buffer = [0u8; MAX_FRAME_LEN];
    bus.read_bytes(address, &mut buffer[..len]).await.map_err(|e| {
        tracing::warn!(address, len, error = ?e, "I2C read failed");
        SensorError::Transport(e)
    })?;
    tracing::trace!(address, bytes = ?&buffer[..len], "I2C read");

    let mut frame = ArrayVec::new();
    frame
        .try_extend_from_slice(&buffer[..len])
        .map_err(|_| SensorError::FrameLength { len })?;
    Ok(frame)
}

/// Full request/response exchange: write, wait, read `command.response_len` bytes, split into words.
pub(super) async fn query<T: I2cTransport>(
    bus: &mut T,
    address: u8,
    command: &Command,
    frame: &[u8],
) -> Result<Words, SensorError<T::Error>> {
    send_command(bus, address, command, frame).await?;
    let raw = read_frame(bus, address, command.response_len).await?;
    decode_words(RawFrame(&raw))
}

/// Value of the first word of a response, checksum-validated.
pub(super) fn first_word<E: core::fmt::Debug>(words: &Words, field: &'static str) -> Result<u16, SensorError<E>> {
    words
        .first()
        .ok_or(SensorError::FrameLength { len: 0 })
        .and_then(|word| word.checked(field))
}

/// Combines the first two words of a response into a 32-bit value, most significant word first.
pub(super) fn first_u32<E: core::fmt::Debug>(words: &Words, field: &'static str) -> Result<u32, SensorError<E>> {
    match words.as_slice() {
        [hi, lo, ..] => {
            let hi = hi.checked(field)?;
            let lo = lo.checked(field)?;
            Ok((u32::from(hi) << 16) | u32::from(lo))
        }
        _ => Err(SensorError::FrameLength {
            len: words.len() * crate::common::word::WORD_LEN,
        }),
    }
}
