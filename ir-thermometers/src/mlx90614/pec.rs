// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! SMBus framing and Packet Error Codes for the MLX90614.
//!
//! Every SMBus transaction the MLX90614 supports carries an 8-bit Packet Error Code (PEC), a
//! CRC-8 (polynomial x<sup>8</sup> + x<sup>2</sup> + x + 1, initial value 0) over every byte of
//! the transaction, *including* the address bytes. The address bytes are never passed to the
//! I²C implementation as data, so the PEC has to be computed over a "virtual" byte sequence that
//! includes them:
//!
//! * Write word: `SA_W, command, data low, data high` followed by the PEC.
//! * Read word: `SA_W, command, SA_R, data low, data high`, with the PEC sent by the device.
//! * Commands without data (sleep): `SA_W, command` followed by the PEC.
//!
//! `SA_W` is the 7-bit slave address shifted left by one, `SA_R` is the same with the read bit
//! set.
use arrayvec::ArrayVec;

use crate::error::LibraryError;

/// CRC-8 polynomial, with the x<sup>8</sup> term implied.
const POLYNOMIAL: u8 = 0x07;

/// The longest virtual byte sequence covered by a PEC (a read word transaction).
const MAX_FRAME_LENGTH: usize = 5;

/// Advance the CRC-8 by one byte.
///
/// ```
/// # use ir_thermometers::mlx90614::pec::crc8;
/// assert_eq!(crc8(0, 0xB4), 0x05);
/// ```
pub fn crc8(seed: u8, byte: u8) -> u8 {
    let mut crc = seed ^ byte;
    for _ in 0..8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ POLYNOMIAL
        } else {
            crc << 1
        };
    }
    crc
}

/// Compute the PEC over a sequence of bytes.
pub fn pec(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |crc, byte| crc8(crc, *byte))
}

/// The address byte for writing to the given 7-bit address.
const fn write_address(address: u8) -> u8 {
    address << 1
}

/// The address byte for reading from the given 7-bit address.
const fn read_address(address: u8) -> u8 {
    (address << 1) | 1
}

/// The bytes covered by a PEC, including the address bytes that never appear in the data sent to
/// the I²C implementation.
#[derive(Clone, Debug, Default, PartialEq)]
struct VirtualFrame(ArrayVec<u8, MAX_FRAME_LENGTH>);

impl VirtualFrame {
    fn write(address: u8, command: u8) -> Self {
        let mut frame = Self::default();
        frame.0.push(write_address(address));
        frame.0.push(command);
        frame
    }

    fn read(address: u8, command: u8) -> Self {
        let mut frame = Self::write(address, command);
        frame.0.push(read_address(address));
        frame
    }

    /// SMBus words are sent least significant byte first.
    fn with_word(mut self, data: u16) -> Self {
        self.0.extend(data.to_le_bytes());
        self
    }

    fn pec(&self) -> u8 {
        pec(&self.0)
    }
}

/// Build the bytes for an SMBus write word transaction: `command, low, high, PEC`.
pub fn write_frame(address: u8, command: u8, data: u16) -> [u8; 4] {
    let [low, high] = data.to_le_bytes();
    let pec = VirtualFrame::write(address, command).with_word(data).pec();
    [command, low, high, pec]
}

/// Validate a write word frame (as built by [`write_frame`]), returning the command and data.
pub fn decode_write_frame(address: u8, frame: &[u8; 4]) -> Result<(u8, u16), LibraryError> {
    let [command, low, high, actual] = *frame;
    let data = u16::from_le_bytes([low, high]);
    let expected = VirtualFrame::write(address, command).with_word(data).pec();
    if expected == actual {
        Ok((command, data))
    } else {
        Err(LibraryError::Checksum {
            command,
            expected,
            actual,
        })
    }
}

/// The PEC the device is expected to send when responding to a read word with `data`.
pub fn read_pec(address: u8, command: u8, data: u16) -> u8 {
    VirtualFrame::read(address, command).with_word(data).pec()
}

/// Validate the response to a read word transaction (`low, high, PEC`), returning the word.
pub fn decode_read_response(
    address: u8,
    command: u8,
    response: &[u8; 3],
) -> Result<u16, LibraryError> {
    let [low, high, actual] = *response;
    let data = u16::from_le_bytes([low, high]);
    let expected = read_pec(address, command, data);
    if expected == actual {
        Ok(data)
    } else {
        Err(LibraryError::Checksum {
            command,
            expected,
            actual,
        })
    }
}

/// Build the bytes for a command without any data: `command, PEC`.
pub fn command_frame(address: u8, command: u8) -> [u8; 2] {
    [command, VirtualFrame::write(address, command).pec()]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn crc8_known_vector() {
        assert_eq!(crc8(0, 0xB4), 0x05);
        // Deterministic
        assert_eq!(crc8(0x5A, 0x22), crc8(0x5A, 0x22));
        assert_eq!(crc8(0, 0), 0);
    }

    #[test]
    fn pec_folds_crc8() {
        let bytes = [0xB4, 0x22, 0x07, 0xC8];
        let manual = crc8(crc8(crc8(crc8(0, 0xB4), 0x22), 0x07), 0xC8);
        assert_eq!(pec(&bytes), manual);
    }

    #[test]
    fn datasheet_write_example() {
        // Writing 0xC807 to 0x22 on a device at 0x5A.
        assert_eq!(write_frame(0x5A, 0x22, 0xC807), [0x22, 0x07, 0xC8, 0x48]);
    }

    #[test]
    fn datasheet_read_example() {
        // Reading 0x3AD2 from 0x07 on a device at 0x5A.
        assert_eq!(read_pec(0x5A, 0x07, 0x3AD2), 0x30);
        assert_eq!(
            decode_read_response(0x5A, 0x07, &[0xD2, 0x3A, 0x30]),
            Ok(0x3AD2)
        );
    }

    #[test]
    fn read_response_checksum_mismatch() {
        let result = decode_read_response(0x5A, 0x07, &[0xD2, 0x3A, 0x31]);
        assert_eq!(
            result,
            Err(LibraryError::Checksum {
                command: 0x07,
                expected: 0x30,
                actual: 0x31,
            })
        );
    }

    #[test]
    fn read_address_response() {
        let pec = read_pec(0x5A, 0x2E, 0x005A);
        assert_eq!(decode_read_response(0x5A, 0x2E, &[0x5A, 0x00, pec]), Ok(0x005A));
    }

    #[test]
    fn write_frame_round_trip() {
        for address in [0x08, 0x33, 0x5A, 0x77] {
            for command in [0x20, 0x25, 0x2E] {
                for data in [0x0000, 0x00FF, 0x9FB4, 0xFFFF] {
                    let frame = write_frame(address, command, data);
                    assert_eq!(decode_write_frame(address, &frame), Ok((command, data)));
                }
            }
        }
    }

    #[test]
    fn write_frame_detects_corruption() {
        let mut frame = write_frame(0x5A, 0x25, 0x9FB4);
        frame[1] ^= 0x01;
        assert!(matches!(
            decode_write_frame(0x5A, &frame),
            Err(LibraryError::Checksum { command: 0x25, .. })
        ));
        // The address is covered by the PEC as well.
        let frame = write_frame(0x5A, 0x25, 0x9FB4);
        assert!(decode_write_frame(0x5B, &frame).is_err());
    }

    #[test]
    fn sleep_command() {
        assert_eq!(command_frame(0x5A, 0xFF), [0xFF, 0xE8]);
    }
}
