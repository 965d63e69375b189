// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
#[cfg(feature = "std")]
extern crate std;

use core::fmt;

use embedded_hal::blocking::i2c;

/// Errors that don't involve I²C.
#[derive(Clone, Debug, PartialEq)]
pub enum LibraryError {
    /// The Packet Error Code sent by the device did not match the one computed for the response.
    ///
    /// These are never retried, as a corrupted response is not a transport failure.
    Checksum {
        command: u8,
        expected: u8,
        actual: u8,
    },

    /// The slave address stored on the device is not the address used to access it.
    AddressMismatch { expected: u8, actual: u8 },

    /// The device ID register did not contain the expected value.
    DeviceNotDetected { expected: u16, actual: u16 },

    /// Writing to this register would destroy factory calibration data.
    ProtectedRegister(u8),

    /// A value given to the library is out of the allowed range.
    OutOfRange(&'static str),

    /// When a value from the device is flagged as invalid or is malformed in some way.
    InvalidData(&'static str),

    /// A bounded wait ran out of attempts.
    Timeout,
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Checksum {
                command,
                expected,
                actual,
            } => write!(
                f,
                "PEC mismatch for command {:#04X}: expected {:#04X}, received {:#04X}",
                command, expected, actual
            ),
            LibraryError::AddressMismatch { expected, actual } => write!(
                f,
                "slave address mismatch, expected {:#04X} but the device reported {:#04X}",
                expected, actual
            ),
            LibraryError::DeviceNotDetected { expected, actual } => write!(
                f,
                "device not detected, expected ID {:#06X} but read {:#06X}",
                expected, actual
            ),
            LibraryError::ProtectedRegister(register) => {
                write!(f, "refusing to write to protected register {:#04X}", register)
            }
            LibraryError::OutOfRange(msg) => write!(f, "{}", msg),
            LibraryError::InvalidData(msg) => write!(f, "{}", msg),
            LibraryError::Timeout => write!(f, "timed out waiting on the device"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LibraryError {}

/// The two halves of an EEPROM update.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EepromPhase {
    /// Writing 0x0000 to clear the cell.
    Erase,

    /// Writing the new value into the cleared cell.
    Write,
}

/// The CaliPile EEPROM fields, used to identify which part of a calibration read failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CalibrationField {
    Protocol,
    Checksum,
    SlaveAddress,
    Lookup,
    Ptat25,
    M,
    U0,
    UOut1,
    TObj1,
}

pub enum Error<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    /// Errors from writing to the device.
    I2cWriteError(<I2C as i2c::Write>::Error),

    /// Errors from a plain read of the device.
    I2cReadError(<I2C as i2c::Read>::Error),

    /// Errors from a combined write-read transaction.
    I2cWriteReadError(<I2C as i2c::WriteRead>::Error),

    /// One phase of an EEPROM erase-then-write sequence failed.
    EepromWriteError(EepromPhase, <I2C as i2c::Write>::Error),

    /// Reading one of the calibration fields failed.
    CalibrationReadError(CalibrationField, <I2C as i2c::WriteRead>::Error),

    /// Errors originating from within this library.
    LibraryError(LibraryError),
}

// Custom Debug implementation so that I2C doesn't need to implement Debug (like the one from
// linux-embedded-hal).
impl<I2C> fmt::Debug for Error<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
    <I2C as i2c::Write>::Error: fmt::Debug,
    <I2C as i2c::Read>::Error: fmt::Debug,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteError(err) => f.debug_tuple("Error::I2cWriteError").field(err).finish(),
            Error::I2cReadError(err) => f.debug_tuple("Error::I2cReadError").field(err).finish(),
            Error::I2cWriteReadError(err) => f
                .debug_tuple("Error::I2cWriteReadError")
                .field(err)
                .finish(),
            Error::EepromWriteError(phase, err) => f
                .debug_tuple("Error::EepromWriteError")
                .field(phase)
                .field(err)
                .finish(),
            Error::CalibrationReadError(field, err) => f
                .debug_tuple("Error::CalibrationReadError")
                .field(field)
                .field(err)
                .finish(),
            Error::LibraryError(err) => f.debug_tuple("Error::LibraryError").field(err).finish(),
        }
    }
}

impl<I2C> fmt::Display for Error<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
    <I2C as i2c::Write>::Error: fmt::Debug,
    <I2C as i2c::Read>::Error: fmt::Debug,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteError(err) => write!(f, "I2C write error: {:?}", err),
            Error::I2cReadError(err) => write!(f, "I2C read error: {:?}", err),
            Error::I2cWriteReadError(err) => write!(f, "I2C write-read error: {:?}", err),
            Error::EepromWriteError(EepromPhase::Erase, err) => {
                write!(f, "failed to erase EEPROM cell: {:?}", err)
            }
            Error::EepromWriteError(EepromPhase::Write, err) => {
                write!(f, "failed to write new EEPROM cell content: {:?}", err)
            }
            Error::CalibrationReadError(field, err) => {
                write!(f, "failed to read calibration field {:?}: {:?}", field, err)
            }
            Error::LibraryError(err) => write!(f, "Library Error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<I2C> std::error::Error for Error<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
    <I2C as i2c::Write>::Error: std::error::Error + 'static,
    <I2C as i2c::Read>::Error: std::error::Error + 'static,
    <I2C as i2c::WriteRead>::Error: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::I2cWriteError(err) => Some(err),
            Error::I2cReadError(err) => Some(err),
            Error::I2cWriteReadError(err) => Some(err),
            Error::EepromWriteError(_, err) => Some(err),
            Error::CalibrationReadError(_, err) => Some(err),
            Error::LibraryError(lib_err) => Some(lib_err),
        }
    }
}

impl<I2C> From<LibraryError> for Error<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    fn from(lib_err: LibraryError) -> Self {
        Self::LibraryError(lib_err)
    }
}

impl<I2C> Error<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    /// Access the library error, if this error didn't come from the bus.
    pub fn library_error(&self) -> Option<&LibraryError> {
        match self {
            Error::LibraryError(err) => Some(err),
            _ => None,
        }
    }
}

/// A successful value along with a secondary error that did not stop the operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Warned<T, E> {
    /// The result of the operation.
    pub value: T,

    /// The non-fatal error, if one occurred.
    pub warning: Option<E>,
}

impl<T, E> Warned<T, E> {
    /// Discard the warning, keeping only the value.
    pub fn into_value(self) -> T {
        self.value
    }
}
