// src/common/crc.rs

use super::error::FrameError;
use crc::{Algorithm, Crc};

/// CRC algorithm used by the 2JCIE-BU01 serial protocol (CRC-16/MODBUS).
/// Polynomial: 0x8005 (normal representation of the reflected mask 0xA001)
/// Initial Value: 0xFFFF
/// Input Reflected: true
/// Output Reflected: true
/// Final XOR: 0x0000
/// Check Value: 0x4B37 (for "123456789")
/// Residue: 0x0000
pub const FRAME_CRC: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x8005,
    init: 0xFFFF,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0x4B37,
    residue: 0x0000,
};

const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&FRAME_CRC);

/// Calculates the frame CRC-16 over `data`.
///
/// The device computes the checksum over every byte of the frame that
/// precedes the two CRC bytes, header included.
#[inline]
pub fn calculate_crc16(data: &[u8]) -> u16 {
    CRC_COMPUTER.checksum(data)
}

/// Encodes a CRC value in wire order (low byte first).
pub fn encode_crc(crc_value: u16) -> [u8; 2] {
    crc_value.to_le_bytes()
}

/// Decodes a CRC value from wire order (low byte first).
pub fn decode_crc(crc_bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(crc_bytes)
}

/// Verifies a complete frame whose last two bytes are its CRC.
///
/// * `Err(FrameError::TooShort)` if there is no room for a CRC.
/// * `Err(FrameError::CrcMismatch)` if the trailing CRC does not match.
pub fn verify_frame_crc(frame: &[u8]) -> Result<(), FrameError> {
    let Some(data_len) = frame.len().checked_sub(2) else {
        return Err(FrameError::TooShort {
            needed: 2,
            got: frame.len(),
        });
    };
    let (data_part, crc_part) = frame.split_at(data_len);

    let calculated = calculate_crc16(data_part);
    let received = decode_crc([crc_part[0], crc_part[1]]);

    if calculated == received {
        Ok(())
    } else {
        Err(FrameError::CrcMismatch {
            expected: received,
            calculated,
        })
    }
}
