// src/common/word.rs

use core::fmt::Debug;

use super::crc::checksum8;
use super::error::SensorError;

/// Bytes per word on the wire: two data bytes and a checksum byte.
pub const WORD_LEN: usize = 3;

/// Longest response any supported sensor produces (SPS30 float measurement).
pub const MAX_FRAME_LEN: usize = 60;

/// Upper bound on the number of words in one frame.
pub const MAX_WORDS: usize = MAX_FRAME_LEN / WORD_LEN;

/// Decoded words of one frame.
pub type Words = heapless::Vec<Word, MAX_WORDS>;

/// A borrowed response frame, exactly as read from the bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawFrame<'a>(pub &'a [u8]);

impl<'a> RawFrame<'a> {
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One 16-bit data word with the outcome of its checksum check.
///
/// `value` carries no meaning when `valid` is false.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Word {
    pub value: u16,
    pub valid: bool,
}

impl Word {
    /// Builds a word from a 3-byte group: MSB, LSB, checksum.
    pub fn from_group(group: [u8; 3]) -> Self {
        let data = [group[0], group[1]];
        Word {
            value: u16::from_be_bytes(data),
            valid: checksum8(data) == group[2],
        }
    }

    /// Returns the value if the checksum matched, otherwise a checksum error naming `field`.
    pub fn checked<E: Debug>(&self, field: &'static str) -> Result<u16, SensorError<E>> {
        if self.valid {
            Ok(self.value)
        } else {
            Err(SensorError::Checksum { field })
        }
    }
}

/// Splits a frame into checksum-validated words, 3 bytes at a time.
///
/// An invalid checksum does not fail decoding: it is recorded in [`Word::valid`]
/// so the caller can name the field it belongs to.
///
/// # Returns
///
/// * `Ok(Words)` with one entry per 3-byte group.
/// * `Err(SensorError::FrameLength)` if the length is not a multiple of 3 or exceeds
///   [`MAX_FRAME_LEN`].
pub fn decode_words<E: Debug>(frame: RawFrame<'_>) -> Result<Words, SensorError<E>> {
    let len = frame.len();
    if len % WORD_LEN != 0 || len > MAX_FRAME_LEN {
        return Err(SensorError::FrameLength { len });
    }

    let mut words = Words::new();
    for group in frame.as_bytes().chunks_exact(WORD_LEN) {
        let word = Word::from_group([group[0], group[1], group[2]]);
        words.push(word).map_err(|_| SensorError::FrameLength { len })?;
    }
    Ok(words)
}

/// Encodes values as a response frame with correct checksums (what a sensor would send).
pub fn encode_words(values: &[u16]) -> arrayvec::ArrayVec<u8, MAX_FRAME_LEN> {
    let mut frame = arrayvec::ArrayVec::new();
    for value in values.iter().take(MAX_WORDS) {
        let data = value.to_be_bytes();
        frame.extend(data);
        frame.push(checksum8(data));
    }
    frame
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_valid_word() {
        for data in [[0x00u8, 0x00], [0xBE, 0xEF], [0x43, 0x48], [0xFF, 0xFF], [0x01, 0x22]] {
            let frame = [data[0], data[1], checksum8(data)];
            let words = decode_words::<()>(RawFrame(&frame)).unwrap();
            assert_eq!(words.len(), 1);
            assert_eq!(words[0], Word { value: u16::from_be_bytes(data), valid: true });
        }
    }

    #[test]
    fn test_invalid_word_is_data_not_error() {
        let frame = [0xBE, 0xEF, 0x92, 0x12, 0x34, 0x00];
        let words = decode_words::<()>(RawFrame(&frame)).unwrap();
        assert_eq!(words.len(), 2);
        assert!(words[0].valid);
        assert_eq!(words[0].value, 0xBEEF);
        assert!(!words[1].valid);
    }

    #[test]
    fn test_frame_length_not_multiple_of_three() {
        for len in [1usize, 2, 4, 5, 17] {
            let frame = [0u8; 17];
            let result = decode_words::<()>(RawFrame(&frame[..len]));
            assert!(matches!(result, Err(SensorError::FrameLength { len: l }) if l == len));
        }
    }

    #[test]
    fn test_frame_too_long() {
        let frame = [0u8; MAX_FRAME_LEN + 3];
        let result = decode_words::<()>(RawFrame(&frame));
        assert!(matches!(result, Err(SensorError::FrameLength { len: 63 })));
    }

    #[test]
    fn test_empty_frame_has_no_words() {
        let words = decode_words::<()>(RawFrame(&[])).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn test_encode_words_matches_decoder() {
        let frame = encode_words(&[0x4348, 0x0000, 0xBEEF]);
        assert_eq!(frame.len(), 9);
        assert_eq!(&frame[..3], &[0x43, 0x48, checksum8([0x43, 0x48])]);
        let words = decode_words::<()>(RawFrame(&frame)).unwrap();
        assert!(words.iter().all(|w| w.valid));
        assert_eq!(words[2].value, 0xBEEF);
    }

    #[test]
    fn test_checked_names_field() {
        let bad = Word { value: 7, valid: false };
        assert!(matches!(bad.checked::<()>("altitude"), Err(SensorError::Checksum { field: "altitude" })));
        let good = Word { value: 7, valid: true };
        assert_eq!(good.checked::<()>("altitude").unwrap(), 7);
    }
}
