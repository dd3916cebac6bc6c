// src/common/numeric.rs

//! Reconstruction of physical values from validated words.

use core::fmt::Debug;

use super::error::SensorError;
use super::word::Word;

/// Full scale of an unsigned 16-bit sensor tick.
pub const FULL_SCALE: f64 = 65535.0;

/// How a field's words turn into a scalar.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Decode {
    /// Two consecutive words reinterpreted as a big-endian IEEE-754 `f32`.
    FloatFromTwoWords,
    /// One word as `value / 65535 * scale + offset` (SHT3x style ticks).
    FixedPointScale { scale: f64, offset: f64 },
    /// One word divided by a fixed factor. `signed` reads the word as two's complement.
    IntegerScale { divisor: f64, signed: bool },
}

impl Decode {
    /// Number of words the strategy consumes.
    pub const fn word_count(&self) -> usize {
        match self {
            Decode::FloatFromTwoWords => 2,
            Decode::FixedPointScale { .. } | Decode::IntegerScale { .. } => 1,
        }
    }

    /// Applies the strategy to the words of one field.
    ///
    /// Every source word must be valid; otherwise the result is a checksum error naming
    /// `field`. `words` must hold exactly [`Decode::word_count`] entries.
    pub fn apply<E: Debug>(&self, field: &'static str, words: &[Word]) -> Result<f64, SensorError<E>> {
        if words.len() != self.word_count() {
            return Err(SensorError::FrameLength { len: words.len() * super::word::WORD_LEN });
        }
        let mut raw = [0u16; 2];
        for (slot, word) in raw.iter_mut().zip(words) {
            *slot = word.checked(field)?;
        }

        let value = match *self {
            Decode::FloatFromTwoWords => f64::from(float_from_words(raw[0], raw[1])),
            Decode::FixedPointScale { scale, offset } => fixed_point(raw[0], scale, offset),
            Decode::IntegerScale { divisor, signed } => integer_scale(raw[0], divisor, signed),
        };
        Ok(value)
    }
}

/// Assembles `hi`'s two bytes followed by `lo`'s two bytes into a big-endian `f32`.
#[inline]
pub fn float_from_words(hi: u16, lo: u16) -> f32 {
    let [b0, b1] = hi.to_be_bytes();
    let [b2, b3] = lo.to_be_bytes();
    f32::from_be_bytes([b0, b1, b2, b3])
}

/// `raw / 65535 * scale + offset`, multiplying before dividing so that the
/// end points (0 and 65535) land exactly on `offset` and `scale + offset`.
#[inline]
pub fn fixed_point(raw: u16, scale: f64, offset: f64) -> f64 {
    f64::from(raw) * scale / FULL_SCALE + offset
}

/// `raw / divisor`, optionally reading `raw` as a signed 16-bit value.
#[inline]
pub fn integer_scale(raw: u16, divisor: f64, signed: bool) -> f64 {
    let value = if signed {
        f64::from(raw as i16)
    } else {
        f64::from(raw)
    };
    value / divisor
}
