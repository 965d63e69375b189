// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! Opening I²C buses on Linux.
extern crate std;

use core::fmt;
use std::format;

use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use linux_embedded_hal::I2cdev;

use crate::config::{Config, DEFAULT_BUS};

/// The bus could not be opened.
#[derive(Debug)]
pub struct ConnectionError {
    bus: u8,
    source: LinuxI2CError,
}

impl ConnectionError {
    /// The number of the bus that failed to open.
    pub fn bus(&self) -> u8 {
        self.bus
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to open /dev/i2c-{}: {}", self.bus, self.source)
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// The device path for a bus number.
pub fn bus_path(bus: u8) -> std::string::String {
    format!("/dev/i2c-{}", bus)
}

/// Open the configured bus (or [`DEFAULT_BUS`]).
pub fn open_bus(config: &Config) -> Result<I2cdev, ConnectionError> {
    let bus = config.bus_or(DEFAULT_BUS);
    I2cdev::new(bus_path(bus)).map_err(|source| ConnectionError { bus, source })
}
