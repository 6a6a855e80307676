//! Request frames for the 2JCIE-BU01 binary serial protocol.
//!
//! Frame layout: Header(2) + Length(2, LE) + Mode(1) + Address(2, LE) + CRC(2, LE).
//! `Length` counts mode, address and CRC.

use super::crc::{calculate_crc16, encode_crc};

/// Magic header opening every frame in both directions ("RB").
pub const FRAME_HEADER: [u8; 2] = [0x52, 0x42];

/// Mode selector for a read request.
pub const MODE_READ: u8 = 0x01;

/// Register block holding the most recent measurement ("Latest Data Long").
pub const ADDRESS_LATEST_DATA_LONG: u16 = 0x5021;

/// Total size of a read request on the wire.
pub const COMMAND_LEN: usize = 9;

/// A fully formed read request, checksum included.
pub type CommandFrame = [u8; COMMAND_LEN];

/// Builds the read request for `address`.
pub fn build_read_command(address: u16) -> CommandFrame {
    // mode + address + crc
    let length: u16 = 5;
    let length = length.to_le_bytes();
    let address = address.to_le_bytes();

    let mut frame = [0u8; COMMAND_LEN];
    frame[..7].copy_from_slice(&[
        FRAME_HEADER[0],
        FRAME_HEADER[1],
        length[0],
        length[1],
        MODE_READ,
        address[0],
        address[1],
    ]);
    let crc = encode_crc(calculate_crc16(&frame[..7]));
    frame[7..].copy_from_slice(&crc);
    frame
}

/// Builds the request for the latest measurement. Always the same nine bytes.
#[inline]
pub fn build_command() -> CommandFrame {
    build_read_command(ADDRESS_LATEST_DATA_LONG)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::crc::verify_frame_crc;

    #[test]
    fn test_latest_data_long_frame_is_golden() {
        assert_eq!(
            build_command(),
            [0x52, 0x42, 0x05, 0x00, 0x01, 0x21, 0x50, 0xE2, 0x4B]
        );
    }

    #[test]
    fn test_build_command_is_deterministic() {
        assert_eq!(build_command(), build_command());
    }

    #[test]
    fn test_other_address_gets_own_crc() {
        let frame = build_read_command(0x5012);
        assert_eq!(&frame[..7], &[0x52, 0x42, 0x05, 0x00, 0x01, 0x12, 0x50]);
        assert!(verify_frame_crc(&frame).is_ok());
        assert_ne!(&frame[7..], &build_command()[7..]);
    }
}
