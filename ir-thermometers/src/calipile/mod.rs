// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! Excelitas CaliPile TPiS 1S 1385 thermopile sensor.
//!
//! The CaliPile stores its calibration constants in an EEPROM that must be unlocked before it can
//! be read. The constants are read once when the driver is created, and the derived
//! [`Calibration`] is then used to convert every reading.
use embedded_hal::blocking::i2c;
use log::{debug, trace, warn};

use crate::config::Config;
use crate::error::{CalibrationField, Error, LibraryError, Warned};
use crate::KELVINS_TO_CELSIUS;

pub mod eeprom;
mod register;

pub use eeprom::{Calibration, EepromData};
pub use register::{
    assemble_ambient, assemble_object, Register, EEPROM_DISABLE, EEPROM_ENABLE,
    GENERAL_CALL_ADDRESS, GENERAL_CALL_RELOAD,
};

/// The factory default slave address.
pub const DEFAULT_ADDRESS: u8 = 0x0C;

fn read_byte<I2C>(
    bus: &mut I2C,
    address: u8,
    register: Register,
) -> Result<u8, <I2C as i2c::WriteRead>::Error>
where
    I2C: i2c::WriteRead,
{
    let mut value = [0u8];
    bus.write_read(address, &[register.address()], &mut value)?;
    Ok(value[0])
}

fn read_field<I2C>(
    bus: &mut I2C,
    address: u8,
    field: CalibrationField,
    register: Register,
) -> Result<u8, Error<I2C>>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    read_byte(bus, address, register).map_err(|err| Error::CalibrationReadError(field, err))
}

/// Read a big-endian pair of EEPROM cells.
fn read_field_word<I2C>(
    bus: &mut I2C,
    address: u8,
    field: CalibrationField,
    high: Register,
    low: Register,
) -> Result<u16, Error<I2C>>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    let high = read_field(bus, address, field, high)?;
    let low = read_field(bus, address, field, low)?;
    Ok(u16::from_be_bytes([high, low]))
}

fn write_eeprom_control<I2C>(
    bus: &mut I2C,
    address: u8,
    value: u8,
) -> Result<(), <I2C as i2c::Write>::Error>
where
    I2C: i2c::Write,
{
    bus.write(address, &[Register::EepromControl.address(), value])
}

/// Unlock the EEPROM, read every calibration cell, then lock it again.
///
/// A failure to lock the EEPROM afterwards does not invalidate the values that were read, so it
/// is returned as a warning.
fn read_eeprom<I2C>(bus: &mut I2C, address: u8) -> Result<Warned<EepromData, Error<I2C>>, Error<I2C>>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    write_eeprom_control(bus, address, EEPROM_ENABLE).map_err(Error::I2cWriteError)?;
    let protocol = read_field(bus, address, CalibrationField::Protocol, Register::EepromProtocol)?;
    let checksum = read_field_word(
        bus,
        address,
        CalibrationField::Checksum,
        Register::EepromChecksum1,
        Register::EepromChecksum2,
    )?;
    let slave_address = read_field(
        bus,
        address,
        CalibrationField::SlaveAddress,
        Register::EepromSlaveAddress,
    )?;
    let lookup = read_field(bus, address, CalibrationField::Lookup, Register::EepromLookup)?;
    let ptat25 = read_field_word(
        bus,
        address,
        CalibrationField::Ptat25,
        Register::EepromPtat25High,
        Register::EepromPtat25Low,
    )?;
    let m = read_field_word(
        bus,
        address,
        CalibrationField::M,
        Register::EepromMHigh,
        Register::EepromMLow,
    )?;
    let u0 = read_field_word(
        bus,
        address,
        CalibrationField::U0,
        Register::EepromU0High,
        Register::EepromU0Low,
    )?;
    let uout1 = read_field_word(
        bus,
        address,
        CalibrationField::UOut1,
        Register::EepromUOut1High,
        Register::EepromUOut1Low,
    )?;
    let tobj1 = read_field(bus, address, CalibrationField::TObj1, Register::EepromTObj1)?;
    let data = EepromData {
        protocol,
        checksum,
        slave_address,
        lookup,
        ptat25,
        m,
        u0,
        uout1,
        tobj1,
    };
    trace!("CaliPile EEPROM: {:?}", data);
    let warning = match write_eeprom_control(bus, address, EEPROM_DISABLE) {
        Ok(_) => None,
        Err(err) => {
            warn!("Unable to lock the CaliPile EEPROM after reading it");
            Some(Error::I2cWriteError(err))
        }
    };
    Ok(Warned {
        value: data,
        warning,
    })
}

/// Driver for the CaliPile.
pub struct Calipile<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    bus: I2C,

    address: u8,

    calibration: Calibration,

    /// A non-fatal error from the last time the EEPROM was read.
    warning: Option<Error<I2C>>,
}

impl<I2C> Calipile<I2C>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
{
    /// Start communicating with a CaliPile.
    ///
    /// A general call reload is sent first (to address 0x00), then the EEPROM is read and the
    /// stored slave address is checked against the address in use. The bus must support general
    /// calls.
    pub fn new(mut bus: I2C, config: Config) -> Result<Self, Error<I2C>> {
        let address = config.address_or(DEFAULT_ADDRESS);
        bus.write(GENERAL_CALL_ADDRESS, &GENERAL_CALL_RELOAD)
            .map_err(Error::I2cWriteError)?;
        let Warned {
            value: data,
            warning,
        } = read_eeprom(&mut bus, address)?;
        let calibration = Calibration::new(&data);
        if calibration.slave_address() != address {
            return Err(LibraryError::AddressMismatch {
                expected: address,
                actual: calibration.slave_address(),
            }
            .into());
        }
        debug!(
            "CaliPile responding at {:#04X} (k = {:e})",
            address,
            calibration.k()
        );
        Ok(Self {
            bus,
            address,
            calibration,
            warning,
        })
    }

    /// Stop using the sensor. There is nothing to shut down, so this always succeeds.
    pub fn halt(&mut self) -> Result<(), Error<I2C>> {
        Ok(())
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.bus
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Take the non-fatal error from the last EEPROM read, if there was one.
    pub fn take_warning(&mut self) -> Option<Error<I2C>> {
        self.warning.take()
    }

    /// Read the EEPROM again, replacing the current calibration.
    pub fn read_calibration(&mut self) -> Result<Warned<Calibration, Error<I2C>>, Error<I2C>> {
        let Warned {
            value: data,
            warning,
        } = read_eeprom(&mut self.bus, self.address)?;
        self.calibration = Calibration::new(&data);
        Ok(Warned {
            value: self.calibration.clone(),
            warning,
        })
    }

    fn read_register(&mut self, register: Register) -> Result<u8, Error<I2C>> {
        read_byte(&mut self.bus, self.address, register).map_err(Error::I2cWriteReadError)
    }

    /// Read the 17-bit raw TP<sub>object</sub> value.
    pub fn read_raw_object(&mut self) -> Result<u32, Error<I2C>> {
        let high = self.read_register(Register::TpObject1)?;
        let middle = self.read_register(Register::TpObject2)?;
        let low = self.read_register(Register::TpObject3)?;
        Ok(assemble_object(high, middle, low))
    }

    /// Read the 15-bit raw TP<sub>ambient</sub> (PTAT) value.
    pub fn read_raw_ambient(&mut self) -> Result<u16, Error<I2C>> {
        let high = self.read_register(Register::TpObject3)?;
        let low = self.read_register(Register::TpAmbient2)?;
        Ok(assemble_ambient(high, low))
    }

    /// The ambient temperature, in kelvins.
    pub fn ambient_temperature(&mut self) -> Result<f64, Error<I2C>> {
        let raw = self.read_raw_ambient()?;
        Ok(self.calibration.ambient_temperature(raw))
    }

    /// The ambient temperature, in degrees Celsius.
    pub fn ambient_temperature_celsius(&mut self) -> Result<f64, Error<I2C>> {
        Ok(self.ambient_temperature()? - KELVINS_TO_CELSIUS)
    }

    /// The object temperature, in kelvins.
    pub fn object_temperature(&mut self) -> Result<f64, Error<I2C>> {
        let raw_object = self.read_raw_object()?;
        let ambient = self.ambient_temperature()?;
        Ok(self.calibration.object_temperature(raw_object, ambient))
    }

    /// The object temperature, in degrees Celsius.
    pub fn object_temperature_celsius(&mut self) -> Result<f64, Error<I2C>> {
        Ok(self.object_temperature()? - KELVINS_TO_CELSIUS)
    }

    pub fn presence(&mut self) -> Result<u8, Error<I2C>> {
        self.read_register(Register::TpPresence)
    }

    pub fn motion(&mut self) -> Result<u8, Error<I2C>> {
        self.read_register(Register::TpMotion)
    }

    pub fn ambient_shock(&mut self) -> Result<u8, Error<I2C>> {
        self.read_register(Register::TpAmbientShock)
    }

    /// Read (and clear) the interrupt status.
    pub fn interrupt_status(&mut self) -> Result<u8, Error<I2C>> {
        self.read_register(Register::InterruptStatus)
    }

    pub fn chip_status(&mut self) -> Result<u8, Error<I2C>> {
        self.read_register(Register::ChipStatus)
    }
}
