// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! Melexis MLX90614 infrared thermometer.
//!
//! The MLX90614 speaks SMBus, and only supports the read word and write word commands, with a
//! Packet Error Code on every transaction (see [`pec`]). Temperatures are reported in units of
//! 0.02 K. The EEPROM holds both user settings and factory calibration in the same cells, so
//! writes need some care:
//!
//! * Every EEPROM cell must be erased (by writing 0x0000) before a new value is written, with a
//!   5 ms wait after each step.
//! * Some cells (and some bits of the configuration register) hold factory calibration that
//!   cannot be recovered if overwritten. Writes to those cells are refused by this driver, and
//!   [`ConfigRegister`] only modifies the filter bits.
use embedded_hal::blocking::{delay::DelayMs, i2c};
use log::{debug, trace, warn};
use paste::paste;

use crate::config::Config;
use crate::error::{EepromPhase, Error, LibraryError};
use crate::util::{is_bit_set, retry};
use crate::KELVINS_TO_CELSIUS;

pub mod pec;
mod register;

pub use register::{is_protected, Access, ConfigRegister, FilterSettings, Flags, Register};

/// The factory default slave address.
pub const DEFAULT_ADDRESS: u8 = 0x5A;

/// How many times a read is attempted before a transport error is returned.
pub const READ_ATTEMPTS: usize = 10;

/// t<sub>erase</sub>, the time for an EEPROM cell to be erased.
pub const ERASE_DELAY_MS: u8 = 5;

/// t<sub>write</sub>, the time for an EEPROM cell to be written.
pub const WRITE_DELAY_MS: u8 = 5;

/// Resolution of the temperature registers.
const KELVINS_PER_LSB: f64 = 0.02;

/// Set on the object temperature registers when the measurement failed.
const ERROR_FLAG_BIT: usize = 15;

/// The lowest and highest usable 7-bit addresses, the rest are reserved by the I²C specification.
const VALID_ADDRESSES: core::ops::RangeInclusive<u8> = 0x08..=0x77;

const ID_REGISTERS: [Register; 4] = [Register::Id0, Register::Id1, Register::Id2, Register::Id3];

/// Convert a raw temperature register value to kelvins.
pub fn raw_to_kelvin(raw: u16) -> f64 {
    f64::from(raw) * KELVINS_PER_LSB
}

/// Convert a raw temperature register value to degrees Celsius.
pub fn raw_to_celsius(raw: u16) -> f64 {
    raw_to_kelvin(raw) - KELVINS_TO_CELSIUS
}

/// Convert a raw temperature register value to degrees Fahrenheit.
pub fn raw_to_fahrenheit(raw: u16) -> f64 {
    raw_to_celsius(raw) * 9.0 / 5.0 + 32.0
}

/// Decode the sign-magnitude format used by the raw IR data registers.
pub fn sign_magnitude(raw: u16) -> i16 {
    let magnitude = (raw & 0x7FFF) as i16;
    if is_bit_set(raw, 15) {
        -magnitude
    } else {
        magnitude
    }
}

/// The outcome of updating the filter settings.
///
/// The settling time is always available, even if writing the new settings failed, so callers
/// can compare the intended and actual behaviour.
#[must_use]
pub struct FilterUpdate<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    /// The settling time of the new settings, in milliseconds.
    pub settling_time_ms: f64,

    /// Whether the new settings were written to EEPROM.
    pub written: Result<(), Error<I2C>>,
}

impl<I2C> FilterUpdate<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    /// Convert into a `Result`, dropping the settling time if the write failed.
    pub fn into_result(self) -> Result<f64, Error<I2C>> {
        self.written.map(|_| self.settling_time_ms)
    }
}

/// Generate a method reading the raw value of a register.
macro_rules! read_raw_register {
    { $name:ident, $register:ident, $doc:literal } => {
    paste! {
        #[doc = $doc]
        pub fn [< read_ $name _raw >](&mut self) -> Result<u16, Error<I2C>> {
            self.read_register(Register::$register)
        }
    }};
}

/// Driver for the MLX90614.
#[derive(Clone, Debug)]
pub struct Mlx90614<I2C, D> {
    /// The I²C bus this thermometer is accessible on.
    bus: I2C,

    /// Used for the waits in the EEPROM write sequence.
    delay: D,

    /// The 7-bit address this thermometer is accessible at.
    address: u8,
}

impl<I2C, D> Mlx90614<I2C, D>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
    D: DelayMs<u8>,
{
    /// Start communicating with an MLX90614.
    ///
    /// The slave address stored in the thermometer's EEPROM is read back and compared to the
    /// address being used, to catch both the wrong device being on the bus and garbled reads.
    pub fn new(bus: I2C, delay: D, config: Config) -> Result<Self, Error<I2C>> {
        let address = config.address_or(DEFAULT_ADDRESS);
        let mut driver = Self {
            bus,
            delay,
            address,
        };
        let stored = driver.read_address()?;
        if stored != address {
            return Err(LibraryError::AddressMismatch {
                expected: address,
                actual: stored,
            }
            .into());
        }
        debug!("MLX90614 responding at {:#04X}", address);
        Ok(driver)
    }

    /// Stop using the thermometer. There is nothing to shut down, so this always succeeds.
    pub fn halt(&mut self) -> Result<(), Error<I2C>> {
        Ok(())
    }

    /// Give back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.bus, self.delay)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Read a word, retrying transport failures and validating the PEC.
    fn read_word(&mut self, command: u8) -> Result<u16, Error<I2C>> {
        let address = self.address;
        let bus = &mut self.bus;
        let mut response = [0u8; 3];
        let mut attempt = 0;
        retry(
            READ_ATTEMPTS,
            |_| {
                attempt += 1;
                warn!(
                    "MLX90614 read of {:#04X} failed (attempt {} of {})",
                    command, attempt, READ_ATTEMPTS
                );
                true
            },
            || bus.write_read(address, &[command], &mut response),
        )
        .map_err(Error::I2cWriteReadError)?;
        let word = pec::decode_read_response(address, command, &response)?;
        trace!("MLX90614 read {:#06X} from {:#04X}", word, command);
        Ok(word)
    }

    /// Write a word to the bus, without any checks.
    fn send_word(&mut self, command: u8, data: u16) -> Result<(), <I2C as i2c::Write>::Error> {
        debug!(
            "MLX90614 writing {:#06X} ({:#018b}) to {:#04X}",
            data, data, command
        );
        let frame = pec::write_frame(self.address, command, data);
        self.bus.write(self.address, &frame)
    }

    /// Erase an EEPROM cell, then write the new value into it.
    ///
    /// Protected cells are refused before anything is sent. A failed erase stops the sequence, as
    /// writing into a cell that has not been cleared corrupts it.
    fn write_eeprom_cell(&mut self, command: u8, data: u16) -> Result<(), Error<I2C>> {
        if is_protected(command) {
            return Err(LibraryError::ProtectedRegister(command).into());
        }
        self.send_word(command, 0x0000)
            .map_err(|err| Error::EepromWriteError(EepromPhase::Erase, err))?;
        self.delay.delay_ms(ERASE_DELAY_MS);
        self.send_word(command, data)
            .map_err(|err| Error::EepromWriteError(EepromPhase::Write, err))?;
        self.delay.delay_ms(WRITE_DELAY_MS);
        Ok(())
    }

    /// Read the raw value of a register.
    pub fn read_register(&mut self, register: Register) -> Result<u16, Error<I2C>> {
        self.read_word(register.command())
    }

    /// Write a new value to a writeable EEPROM register.
    pub fn write_eeprom(&mut self, register: Register, data: u16) -> Result<(), Error<I2C>> {
        match register.access() {
            Access::ReadWrite => self.write_eeprom_cell(register.command(), data),
            Access::ReadOnly | Access::Protected => {
                Err(LibraryError::ProtectedRegister(register.command()).into())
            }
        }
    }

    /// Read the 7-bit SMBus slave address from EEPROM.
    pub fn read_address(&mut self) -> Result<u8, Error<I2C>> {
        let raw = self.read_register(Register::SlaveAddress)?;
        Ok(raw.to_le_bytes()[0])
    }

    /// Store a new slave address in EEPROM.
    ///
    /// The new address is only used after the thermometer has been power cycled. The upper byte
    /// of the cell is preserved.
    pub fn write_address(&mut self, new_address: u8) -> Result<(), Error<I2C>> {
        if !VALID_ADDRESSES.contains(&new_address) {
            return Err(LibraryError::OutOfRange("invalid or reserved SMBus address").into());
        }
        let current = self.read_register(Register::SlaveAddress)?;
        let updated = (current & 0xFF00) | u16::from(new_address);
        self.write_eeprom(Register::SlaveAddress, updated)
    }

    /// Read the 64-bit device ID.
    pub fn read_id(&mut self) -> Result<u64, Error<I2C>> {
        let mut id = 0u64;
        for (index, register) in ID_REGISTERS.iter().enumerate() {
            let word = self.read_register(*register)?;
            trace!("MLX90614 ID{}: {:#06X}", index, word);
            id |= u64::from(word) << (index * 16);
        }
        Ok(id)
    }

    /// Read the emissivity, normalized between 0.1 and 1.0.
    pub fn read_emissivity(&mut self) -> Result<f64, Error<I2C>> {
        let ke = self.read_register(Register::Emissivity)?;
        Ok(f64::from(ke) / 65535.0)
    }

    /// Read the raw IR data for the first channel.
    pub fn read_ir_channel_1(&mut self) -> Result<i16, Error<I2C>> {
        let raw = self.read_register(Register::RawIr1)?;
        Ok(sign_magnitude(raw))
    }

    read_raw_register! {
        ambient,
        AmbientTemperature,
        "Read the raw ambient temperature (T<sub>a</sub>)."
    }

    read_raw_register! {
        object_min,
        ObjectMin,
        "Read the raw minimum object temperature (T<sub>o</sub> min) from EEPROM."
    }

    read_raw_register! {
        object_max,
        ObjectMax,
        "Read the raw maximum object temperature (T<sub>o</sub> max) from EEPROM."
    }

    fn read_object_raw(&mut self, register: Register) -> Result<u16, Error<I2C>> {
        let raw = self.read_register(register)?;
        if is_bit_set(raw, ERROR_FLAG_BIT) {
            Err(LibraryError::InvalidData("object temperature error flag set").into())
        } else {
            Ok(raw)
        }
    }

    /// Read the raw temperature of the first object (T<sub>obj1</sub>).
    pub fn read_object_1_raw(&mut self) -> Result<u16, Error<I2C>> {
        self.read_object_raw(Register::ObjectTemperature1)
    }

    /// Read the raw temperature of the second object (T<sub>obj2</sub>).
    ///
    /// Only dual sensor models measure a second object.
    pub fn read_object_2_raw(&mut self) -> Result<u16, Error<I2C>> {
        self.read_object_raw(Register::ObjectTemperature2)
    }

    /// The ambient temperature, in degrees Celsius.
    pub fn ambient_temperature(&mut self) -> Result<f64, Error<I2C>> {
        Ok(raw_to_celsius(self.read_ambient_raw()?))
    }

    /// The temperature of the first object, in degrees Celsius.
    pub fn object_temperature(&mut self) -> Result<f64, Error<I2C>> {
        Ok(raw_to_celsius(self.read_object_1_raw()?))
    }

    /// Read config register 1 from EEPROM.
    pub fn read_config(&mut self) -> Result<ConfigRegister, Error<I2C>> {
        Ok(self.read_register(Register::Config)?.into())
    }

    /// Store new FIR and IIR filter settings in EEPROM.
    ///
    /// Invalid settings are rejected before anything is sent to the thermometer. All of the
    /// other bits in the configuration register are preserved.
    pub fn write_filter_config(&mut self, fir: u8, iir: u8) -> Result<FilterUpdate<I2C>, Error<I2C>> {
        let filter = FilterSettings::new(fir, iir)?;
        let config = self.read_config()?;
        let settling_time_ms = filter.settling_time_ms(config.dual_sensor());
        let updated = config.with_filter(filter);
        let written = self.write_eeprom_cell(Register::Config.command(), updated.into());
        if written.is_ok() {
            debug!(
                "MLX90614 filter set to FIR {}, IIR {}, settling time {} ms",
                fir, iir, settling_time_ms
            );
        }
        Ok(FilterUpdate {
            settling_time_ms,
            written,
        })
    }

    /// Read the diagnostic flags.
    pub fn read_flags(&mut self) -> Result<Flags, Error<I2C>> {
        Ok(self.read_register(Register::Flags)?.into())
    }

    /// Put the thermometer into sleep mode.
    ///
    /// Waking the thermometer requires manipulating the bus lines directly, which is outside of
    /// what this driver can do.
    pub fn sleep(&mut self) -> Result<(), Error<I2C>> {
        let frame = pec::command_frame(self.address, Register::Sleep.command());
        self.bus
            .write(self.address, &frame)
            .map_err(Error::I2cWriteError)
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn temperature_conversions() {
        // 0x3AD2 is the datasheet's example object temperature
        assert_approx_eq!(f64, raw_to_kelvin(0x3AD2), 301.16, epsilon = 1e-9);
        assert_approx_eq!(f64, raw_to_celsius(0x3AD2), 28.01, epsilon = 1e-9);
        assert_approx_eq!(f64, raw_to_fahrenheit(0x3AD2), 82.418, epsilon = 1e-9);
        assert_approx_eq!(f64, raw_to_celsius(0x0000), -273.15, epsilon = 1e-9);
    }

    #[test]
    fn sign_magnitude_decoding() {
        assert_eq!(sign_magnitude(0x0010), 16);
        assert_eq!(sign_magnitude(0x8010), -16);
        assert_eq!(sign_magnitude(0x7FFF), i16::MAX);
        assert_eq!(sign_magnitude(0x8000), 0);
    }

    #[test]
    fn address_range() {
        assert!(!VALID_ADDRESSES.contains(&0x07));
        assert!(VALID_ADDRESSES.contains(&0x08));
        assert!(VALID_ADDRESSES.contains(&0x77));
        assert!(!VALID_ADDRESSES.contains(&0x78));
    }
}
