// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! Bus and address selection shared by all of the drivers.

/// The bus number used when none is configured.
///
/// On a Raspberry Pi the user-accessible I²C controller is `/dev/i2c-1`.
pub const DEFAULT_BUS: u8 = 1;

/// Which bus a device is attached to, and at which address.
///
/// Both values are optional, each driver falls back to its device's default address (and
/// [`DEFAULT_BUS`]) when they are not set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Config {
    bus: Option<u8>,
    address: Option<u8>,
}

impl Config {
    /// A configuration that uses the defaults for everything.
    pub const fn new() -> Self {
        Self {
            bus: None,
            address: None,
        }
    }

    /// Select a bus number.
    pub const fn with_bus(self, bus: u8) -> Self {
        Self {
            bus: Some(bus),
            ..self
        }
    }

    /// Select a 7-bit device address.
    pub const fn with_address(self, address: u8) -> Self {
        Self {
            address: Some(address),
            ..self
        }
    }

    pub fn bus(&self) -> Option<u8> {
        self.bus
    }

    pub fn address(&self) -> Option<u8> {
        self.address
    }

    /// The configured bus number, or `default` if none was set.
    pub fn bus_or(&self, default: u8) -> u8 {
        self.bus.unwrap_or(default)
    }

    /// The configured device address, or `default` if none was set.
    pub fn address_or(&self, default: u8) -> u8 {
        self.address.unwrap_or(default)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = Config::new();
        assert_eq!(config.bus_or(DEFAULT_BUS), 1);
        assert_eq!(config.address_or(0x5A), 0x5A);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides() {
        let config = Config::new().with_address(0x3A).with_bus(3);
        assert_eq!(config.bus(), Some(3));
        assert_eq!(config.address_or(0x5A), 0x3A);
        assert_eq!(config.bus_or(DEFAULT_BUS), 3);
    }
}
