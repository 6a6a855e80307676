//! Response frames for the 2JCIE-BU01 binary serial protocol.
//!
//! "Latest Data Long" response layout (58 bytes):
//!
//! | offset | size | field                                |
//! |--------|------|--------------------------------------|
//! | 0      | 2    | header `52 42`                       |
//! | 2      | 2    | length (LE)                          |
//! | 4      | 1    | response type                        |
//! | 5      | 2    | address (LE)                         |
//! | 7      | 1    | sequence number                      |
//! | 8      | 2    | temperature, i16, 0.01 °C            |
//! | 10     | 2    | humidity, u16, 0.01 %RH              |
//! | 12     | 2    | ambient light, u16, lx               |
//! | 14     | 4    | barometric pressure, u32, 0.001 hPa  |
//! | 18     | 2    | sound noise, u16, 0.01 dB            |
//! | 20     | 2    | eTVOC, u16, ppb                      |
//! | 22     | 2    | eCO2, u16, ppm                       |
//! | 24     | 2    | discomfort index, u16, 0.01          |
//! | 26     | 2    | heat stroke, i16, 0.01 °C            |
//! | 28     | 28   | not interpreted                      |
//! | 56     | 2    | CRC (LE)                             |
//!
//! Decoding checks the header and length only; the trailing CRC is not
//! verified.

use super::command::{ADDRESS_LATEST_DATA_LONG, FRAME_HEADER, MODE_READ};
use super::crc::{calculate_crc16, encode_crc};
use super::error::FrameError;
use super::reading::{RawReading, Reading};

/// Fewest bytes `decode_response` accepts.
pub const MIN_RESPONSE_LEN: usize = 30;

/// Size of a complete "Latest Data Long" response.
pub const LATEST_DATA_LONG_LEN: usize = 58;

const DATA_OFFSET: usize = 8;

/// Little-endian cursor over the field area of a response.
struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        FieldReader { bytes, pos }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], FrameError> {
        let end = self.pos + N;
        let chunk = self.bytes.get(self.pos..end).ok_or(FrameError::TooShort {
            needed: end,
            got: self.bytes.len(),
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn i16(&mut self) -> Result<i16, FrameError> {
        self.take::<2>().map(i16::from_le_bytes)
    }

    fn u16(&mut self) -> Result<u16, FrameError> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, FrameError> {
        self.take::<4>().map(u32::from_le_bytes)
    }
}

/// Extracts the raw fixed-point fields from a response.
pub fn parse_raw_response(buffer: &[u8]) -> Result<RawReading, FrameError> {
    if buffer.len() < MIN_RESPONSE_LEN {
        return Err(FrameError::TooShort {
            needed: MIN_RESPONSE_LEN,
            got: buffer.len(),
        });
    }
    if buffer[..2] != FRAME_HEADER {
        return Err(FrameError::BadHeader {
            found: [buffer[0], buffer[1]],
        });
    }

    let mut fields = FieldReader::new(buffer, DATA_OFFSET);
    Ok(RawReading {
        temperature: fields.i16()?,
        humidity: fields.u16()?,
        illuminance: fields.u16()?,
        pressure: fields.u32()?,
        noise: fields.u16()?,
        etvoc: fields.u16()?,
        eco2: fields.u16()?,
        discomfort: fields.u16()?,
        heat_stroke: fields.i16()?,
    })
}

/// Decodes a response into a `Reading`.
pub fn decode_response(buffer: &[u8]) -> Result<Reading, FrameError> {
    parse_raw_response(buffer).map(Reading::from)
}

/// Encodes a complete "Latest Data Long" response, as the sensor would send it.
pub fn encode_response(raw: &RawReading, sequence: u8) -> [u8; LATEST_DATA_LONG_LEN] {
    let mut frame = [0u8; LATEST_DATA_LONG_LEN];
    let length = (LATEST_DATA_LONG_LEN - 4) as u16;

    frame[..2].copy_from_slice(&FRAME_HEADER);
    frame[2..4].copy_from_slice(&length.to_le_bytes());
    frame[4] = MODE_READ;
    frame[5..7].copy_from_slice(&ADDRESS_LATEST_DATA_LONG.to_le_bytes());
    frame[7] = sequence;

    let mut pos = DATA_OFFSET;
    let mut put = |bytes: &[u8]| {
        frame[pos..pos + bytes.len()].copy_from_slice(bytes);
        pos += bytes.len();
    };
    put(&raw.temperature.to_le_bytes());
    put(&raw.humidity.to_le_bytes());
    put(&raw.illuminance.to_le_bytes());
    put(&raw.pressure.to_le_bytes());
    put(&raw.noise.to_le_bytes());
    put(&raw.etvoc.to_le_bytes());
    put(&raw.eco2.to_le_bytes());
    put(&raw.discomfort.to_le_bytes());
    put(&raw.heat_stroke.to_le_bytes());

    let crc_at = LATEST_DATA_LONG_LEN - 2;
    let crc = encode_crc(calculate_crc16(&frame[..crc_at]));
    frame[crc_at..].copy_from_slice(&crc);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::crc::verify_frame_crc;

    fn sample_raw() -> RawReading {
        RawReading {
            temperature: 2345,
            humidity: 5012,
            illuminance: 288,
            pressure: 1_008_765,
            noise: 3921,
            etvoc: 14,
            eco2: 512,
            discomfort: 7088,
            heat_stroke: -312,
        }
    }

    #[test]
    fn test_decode_fields_at_documented_offsets() {
        // Hand-placed bytes, independent of encode_response
        let mut buf = [0u8; 30];
        buf[0] = 0x52;
        buf[1] = 0x42;
        buf[7] = 0xAA; // sequence, ignored
        buf[8..10].copy_from_slice(&(-1050i16).to_le_bytes());
        buf[10..12].copy_from_slice(&6543u16.to_le_bytes());
        buf[12..14].copy_from_slice(&1200u16.to_le_bytes());
        buf[14..18].copy_from_slice(&1_013_250u32.to_le_bytes());
        buf[18..20].copy_from_slice(&4500u16.to_le_bytes());
        buf[20..22].copy_from_slice(&123u16.to_le_bytes());
        buf[22..24].copy_from_slice(&800u16.to_le_bytes());
        buf[24..26].copy_from_slice(&6512u16.to_le_bytes());
        buf[26..28].copy_from_slice(&(-5i16).to_le_bytes());
        buf[28] = 0xFF;
        buf[29] = 0xFF;

        let reading = decode_response(&buf).unwrap();
        assert_eq!(reading.temperature_celsius, -10.5);
        assert_eq!(reading.humidity_percent, 65.43);
        assert_eq!(reading.illuminance_lux, 1200);
        assert_eq!(reading.pressure_hpa, 1013.25);
        assert_eq!(reading.noise_db, 45.0);
        assert_eq!(reading.etvoc_ppb, 123);
        assert_eq!(reading.eco2_ppm, 800);
        assert_eq!(reading.discomfort_index, 65.12);
        assert_eq!(reading.heat_stroke_celsius, -0.05);
    }

    #[test]
    fn test_encoded_response_decodes_to_same_raw() {
        let frame = encode_response(&sample_raw(), 7);
        assert_eq!(parse_raw_response(&frame).unwrap(), sample_raw());
        assert_eq!(frame[7], 7);
        assert_eq!(&frame[2..4], &[54, 0]);
        assert!(verify_frame_crc(&frame).is_ok());
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut frame = encode_response(&sample_raw(), 0);
        frame[40] ^= 0xFF;
        frame[57] ^= 0xFF;
        assert_eq!(parse_raw_response(&frame).unwrap(), sample_raw());
    }

    #[test]
    fn test_short_buffers_rejected() {
        let frame = encode_response(&sample_raw(), 0);
        for len in 0..MIN_RESPONSE_LEN {
            assert_eq!(
                decode_response(&frame[..len]),
                Err(FrameError::TooShort {
                    needed: MIN_RESPONSE_LEN,
                    got: len,
                })
            );
        }
        assert!(decode_response(&frame[..MIN_RESPONSE_LEN]).is_ok());
    }

    #[test]
    fn test_bad_header_rejected() {
        let mut frame = encode_response(&sample_raw(), 0);
        frame[1] = 0x43;
        assert_eq!(
            decode_response(&frame),
            Err(FrameError::BadHeader {
                found: [0x52, 0x43],
            })
        );
    }
}
