// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// CaliPile registers.
///
/// Every register is a single byte. Some registers hold parts of two values (register 3 has the
/// last bit of TP<sub>object</sub> and the high bits of TP<sub>ambient</sub>), so each register is
/// named for the first value it holds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    /// TP<sub>object</sub> bits 16..9.
    TpObject1 = 1,

    /// TP<sub>object</sub> bits 8..1.
    TpObject2 = 2,

    /// TP<sub>object</sub> bit 0 in bit 7, TP<sub>ambient</sub> bits 14..8 in bits 6..0.
    TpObject3 = 3,

    /// TP<sub>ambient</sub> bits 7..0.
    TpAmbient2 = 4,

    TpPresence = 15,

    TpMotion = 16,

    TpAmbientShock = 17,

    /// Cleared when read.
    InterruptStatus = 18,

    ChipStatus = 19,

    /// Write 0x80 to allow the EEPROM to be read, 0x00 to lock it again.
    EepromControl = 31,

    EepromProtocol = 32,

    EepromChecksum1 = 33,

    EepromChecksum2 = 34,

    EepromLookup = 41,

    EepromPtat25High = 42,

    EepromPtat25Low = 43,

    EepromMHigh = 44,

    EepromMLow = 45,

    EepromU0High = 46,

    EepromU0Low = 47,

    EepromUOut1High = 48,

    EepromUOut1Low = 49,

    EepromTObj1 = 50,

    /// The slave address, with the external addressing enable in bit 7.
    EepromSlaveAddress = 63,
}

impl Register {
    pub fn address(self) -> u8 {
        self.into()
    }
}

/// Value for [`Register::EepromControl`] that unlocks the EEPROM for reading.
pub const EEPROM_ENABLE: u8 = 0x80;

/// Value for [`Register::EepromControl`] that locks the EEPROM.
pub const EEPROM_DISABLE: u8 = 0x00;

/// The general call command that reloads the configuration from EEPROM.
pub const GENERAL_CALL_RELOAD: [u8; 2] = [0x04, 0x00];

/// The I²C general call address.
pub const GENERAL_CALL_ADDRESS: u8 = 0x00;

/// Assemble the 17-bit TP<sub>object</sub> value from registers 1 through 3.
pub fn assemble_object(high: u8, middle: u8, low: u8) -> u32 {
    (u32::from(high) << 9) | (u32::from(middle) << 1) | (u32::from(low) >> 7)
}

/// Assemble the 15-bit TP<sub>ambient</sub> value from registers 3 and 4.
pub fn assemble_ambient(high: u8, low: u8) -> u16 {
    (u16::from(high & 0x7F) << 8) | u16::from(low)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn object_assembly() {
        assert_eq!(assemble_object(0x00, 0x00, 0x00), 0);
        assert_eq!(assemble_object(0x00, 0x00, 0x80), 1);
        // The ambient bits in register 3 are ignored
        assert_eq!(assemble_object(0x00, 0x00, 0x7F), 0);
        assert_eq!(assemble_object(0x00, 0x01, 0x00), 2);
        assert_eq!(assemble_object(0x80, 0x00, 0x00), 0x1_0000);
        assert_eq!(assemble_object(0xFF, 0xFF, 0xFF), 0x1_FFFF);
    }

    #[test]
    fn ambient_assembly() {
        assert_eq!(assemble_ambient(0x20, 0x64), 8292);
        // The object bit in register 3 is ignored
        assert_eq!(assemble_ambient(0xA0, 0x64), 8292);
        assert_eq!(assemble_ambient(0xFF, 0xFF), 0x7FFF);
    }
}
