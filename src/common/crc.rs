// src/common/crc.rs

use crc::{Algorithm, Crc};

/// CRC-8 algorithm used by every Sensirion I2C sensor to protect each data word.
/// Polynomial: 0x31 (x^8 + x^5 + x^4 + 1)
/// Initial Value: 0xFF
/// Input Reflected: false
/// Output Reflected: false
/// Final XOR: 0x00
/// Check Value: 0xF7 (for "123456789") - catalogued as CRC-8/NRSC-5
/// Residue: 0x00
pub const SENSIRION_CRC: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xFF,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xF7,
    residue: 0x00,
};

const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&SENSIRION_CRC);

/// Calculates the Sensirion CRC-8 over an arbitrary byte slice.
///
/// The sensors only ever checksum two bytes at a time, see [`checksum8`].
#[inline]
pub fn calculate_crc8(data: &[u8]) -> u8 {
    CRC_COMPUTER.checksum(data)
}

/// Calculates the checksum byte that follows a 2-byte data word on the wire.
///
/// # Arguments
///
/// * `bytes`: The data word, most significant byte first.
///
/// # Returns
///
/// The checksum byte the sensor transmits (or expects) after `bytes`.
#[inline]
pub fn checksum8(bytes: [u8; 2]) -> u8 {
    calculate_crc8(&bytes)
}

/// Returns `true` if `checksum` is the correct checksum for `bytes`.
#[inline]
pub fn verify_checksum8(bytes: [u8; 2], checksum: u8) -> bool {
    checksum8(bytes) == checksum
}
