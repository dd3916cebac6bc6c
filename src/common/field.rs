// src/common/field.rs

use core::fmt::Debug;

use super::error::SensorError;
use super::numeric::Decode;
use super::types::FieldValue;
use super::word::{Word, WORD_LEN};

/// Where one measured quantity sits in a measurement frame and how to reconstruct it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Reading key, e.g. `"CO2"` or `"MassPM2.5"`.
    pub name: &'static str,
    /// Offset of the field's first byte in the frame. Always a multiple of 3.
    pub byte_offset: usize,
    pub decode: Decode,
    pub unit: &'static str,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, byte_offset: usize, decode: Decode, unit: &'static str) -> Self {
        FieldDescriptor {
            name,
            byte_offset,
            decode,
            unit,
        }
    }

    #[inline]
    pub const fn word_count(&self) -> usize {
        self.decode.word_count()
    }

    /// Number of frame bytes the field occupies, checksums included.
    #[inline]
    pub const fn byte_len(&self) -> usize {
        self.word_count() * WORD_LEN
    }

    #[inline]
    pub const fn first_word(&self) -> usize {
        self.byte_offset / WORD_LEN
    }
}

/// Checks that `fields` tile a frame of `frame_len` bytes: contiguous, in order,
/// word-aligned, with no gaps or overlaps.
pub fn layout_covers(fields: &[FieldDescriptor], frame_len: usize) -> bool {
    let mut next = 0;
    for field in fields {
        if field.byte_offset != next || field.byte_offset % WORD_LEN != 0 {
            return false;
        }
        next += field.byte_len();
    }
    next == frame_len
}

fn failure_summary<E: Debug>(error: &SensorError<E>) -> &'static str {
    match error {
        SensorError::Checksum { .. } => "Word checksum mismatch",
        _ => "Field decode failed",
    }
}

/// Decodes every field of a measurement frame from its words.
///
/// Stops at the first field with an invalid word and returns
/// [`SensorError::Checksum`] naming it; no partial result is produced.
///
/// # Arguments
///
/// * `fields` - The family's field table.
/// * `words` - Output of [`decode_words`](super::word::decode_words) for the frame.
pub fn decode_fields<E: Debug>(
    fields: &[FieldDescriptor],
    words: &[Word],
) -> Result<Vec<FieldValue>, SensorError<E>> {
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        let start = field.first_word();
        let end = start + field.word_count();
        let slice = words.get(start..end).ok_or(SensorError::FrameLength {
            len: words.len() * WORD_LEN,
        })?;

        let value = match field.decode.apply(field.name, slice) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(field = field.name, error = %e, "{}, discarding reading", failure_summary(&e));
                return Err(e);
            }
        };
        tracing::debug!(field = field.name, value, unit = field.unit, "Decoded field");
        values.push(FieldValue {
            name: field.name,
            value,
            unit: field.unit,
        });
    }
    Ok(values)
}
