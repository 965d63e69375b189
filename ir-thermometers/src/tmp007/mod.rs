// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! Texas Instruments TMP007 contactless thermopile sensor.
//!
//! Registers are read by writing the register address, then reading two bytes. The read half is
//! retried on transport errors, up to [`READ_ATTEMPTS`] times.
use embedded_hal::blocking::{delay::DelayMs, i2c};
use log::{debug, trace, warn};

use crate::config::Config;
use crate::error::{Error, LibraryError};
use crate::util::retry;

mod register;

pub use register::{
    config, decode_sensor_voltage, decode_temperature, mask, Averaging, Register, Status,
    DEVICE_ID,
};

/// The factory default slave address.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// How many times the read half of a register access is attempted.
pub const READ_ATTEMPTS: usize = 50;

/// How long to wait between polls of the status register. The shortest conversion time (260 ms)
/// divided by four.
pub const POLL_INTERVAL_MS: u8 = 65;

/// Driver for the TMP007.
#[derive(Clone, Debug)]
pub struct Tmp007<I2C, D> {
    bus: I2C,

    /// Used when polling for new conversions.
    delay: D,

    address: u8,

    device_id: u16,
}

impl<I2C, D> Tmp007<I2C, D>
where
    I2C: i2c::Write + i2c::Read + i2c::WriteRead,
    D: DelayMs<u8>,
{
    /// Start communicating with a TMP007.
    ///
    /// The device ID is checked, then conversions and the conversion ready flag are enabled.
    pub fn new(bus: I2C, delay: D, config: Config) -> Result<Self, Error<I2C>> {
        let address = config.address_or(DEFAULT_ADDRESS);
        let mut driver = Self {
            bus,
            delay,
            address,
            device_id: 0,
        };
        driver.device_id = driver.read_register(Register::DeviceId)?;
        if driver.device_id != DEVICE_ID {
            return Err(LibraryError::DeviceNotDetected {
                expected: DEVICE_ID,
                actual: driver.device_id,
            }
            .into());
        }
        driver.configure()?;
        debug!("TMP007 responding at {:#04X}", address);
        Ok(driver)
    }

    fn configure(&mut self) -> Result<(), Error<I2C>> {
        self.write_register(Register::Configuration, config::CONVERSION_ENABLE)?;
        self.write_register(Register::StatusMask, mask::CONVERSION_READY_ENABLE)
    }

    /// Stop using the sensor. There is nothing to shut down, so this always succeeds.
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

    /// The device ID read when the driver was created.
    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// Read a register.
    pub fn read_register(&mut self, register: Register) -> Result<u16, Error<I2C>> {
        let address = self.address;
        self.bus
            .write(address, &[register.address()])
            .map_err(Error::I2cWriteError)?;
        let bus = &mut self.bus;
        let mut buffer = [0u8; 2];
        let mut attempt = 0;
        retry(
            READ_ATTEMPTS,
            |_| {
                attempt += 1;
                warn!(
                    "TMP007 read of {:?} failed (attempt {} of {})",
                    register, attempt, READ_ATTEMPTS
                );
                true
            },
            || bus.read(address, &mut buffer),
        )
        .map_err(Error::I2cReadError)?;
        let value = u16::from_be_bytes(buffer);
        trace!("TMP007 read {:#06X} from {:?}", value, register);
        Ok(value)
    }

    /// Write a register.
    pub fn write_register(&mut self, register: Register, value: u16) -> Result<(), Error<I2C>> {
        debug!("TMP007 writing {:#06X} to {:?}", value, register);
        let [high, low] = value.to_be_bytes();
        self.bus
            .write(self.address, &[register.address(), high, low])
            .map_err(Error::I2cWriteError)
    }

    /// The die temperature, in degrees Celsius.
    pub fn die_temperature(&mut self) -> Result<f64, Error<I2C>> {
        let raw = self.read_register(Register::DieTemperature)?;
        Ok(decode_temperature(raw)?)
    }

    /// The object temperature, in degrees Celsius.
    pub fn object_temperature(&mut self) -> Result<f64, Error<I2C>> {
        let raw = self.read_register(Register::ObjectTemperature)?;
        Ok(decode_temperature(raw)?)
    }

    /// The thermopile sensor voltage, in microvolts.
    pub fn sensor_voltage(&mut self) -> Result<f64, Error<I2C>> {
        let raw = self.read_register(Register::SensorVoltage)?;
        Ok(decode_sensor_voltage(raw))
    }

    pub fn status(&mut self) -> Result<Status, Error<I2C>> {
        Ok(self.read_register(Register::Status)?.into())
    }

    /// Change how many samples are averaged for each conversion.
    pub fn set_averaging(&mut self, averaging: Averaging) -> Result<(), Error<I2C>> {
        let current = self.read_register(Register::Configuration)?;
        self.write_register(Register::Configuration, averaging.apply(current))
    }

    /// Reset the sensor, then enable conversions and the conversion ready flag again.
    pub fn reset(&mut self) -> Result<(), Error<I2C>> {
        self.write_register(Register::Configuration, config::RESET)?;
        self.configure()
    }

    /// Block until a new conversion is ready.
    ///
    /// There is no limit on how long this waits, see
    /// [`wait_for_conversion_ready_within`][Tmp007::wait_for_conversion_ready_within] for a
    /// bounded version. Bus errors end the wait.
    pub fn wait_for_conversion_ready(&mut self) -> Result<(), Error<I2C>> {
        while !self.status()?.conversion_ready() {
            self.delay.delay_ms(POLL_INTERVAL_MS);
        }
        Ok(())
    }

    /// Block until a new conversion is ready, checking at most `max_polls` times.
    pub fn wait_for_conversion_ready_within(&mut self, max_polls: usize) -> Result<(), Error<I2C>> {
        for _ in 0..max_polls {
            if self.status()?.conversion_ready() {
                return Ok(());
            }
            self.delay.delay_ms(POLL_INTERVAL_MS);
        }
        Err(LibraryError::Timeout.into())
    }
}
