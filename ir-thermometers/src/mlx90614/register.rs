// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::LibraryError;
use crate::util::is_bit_set;

/// How a register may be accessed by the controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    ReadOnly,

    ReadWrite,

    /// Readable, but writing would alter factory calibration.
    Protected,
}

/// The MLX90614 commands.
///
/// RAM is accessed with opcode `000x_xxxx`, EEPROM with `001x_xxxx`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    /// Raw IR data for channel 1 (RAM).
    RawIr1 = 0x04,

    /// Linearized ambient temperature T<sub>a</sub> (RAM).
    AmbientTemperature = 0x06,

    /// Linearized object temperature T<sub>obj1</sub> (RAM).
    ObjectTemperature1 = 0x07,

    /// Linearized object temperature T<sub>obj2</sub> (RAM).
    ObjectTemperature2 = 0x08,

    /// T<sub>o</sub> maximum (EEPROM).
    ObjectMax = 0x20,

    /// T<sub>o</sub> minimum (EEPROM).
    ObjectMin = 0x21,

    PwmControl = 0x22,

    /// T<sub>a</sub> range (EEPROM).
    AmbientRange = 0x23,

    /// Emissivity correction coefficient (EEPROM).
    Emissivity = 0x24,

    /// Config register 1 (EEPROM). See [`ConfigRegister`].
    Config = 0x25,

    /// SMBus slave address (EEPROM). Changes only take effect after a power-on reset.
    SlaveAddress = 0x2E,

    Id0 = 0x3C,

    Id1 = 0x3D,

    Id2 = 0x3E,

    Id3 = 0x3F,

    /// Read the status flags. See [`Flags`].
    Flags = 0xF0,

    /// Enter sleep mode.
    Sleep = 0xFF,
}

impl Register {
    pub fn access(self) -> Access {
        match self {
            Register::ObjectMax
            | Register::ObjectMin
            | Register::PwmControl
            | Register::AmbientRange
            | Register::Config
            | Register::SlaveAddress => Access::ReadWrite,
            Register::Emissivity => Access::Protected,
            _ => Access::ReadOnly,
        }
    }

    pub fn command(self) -> u8 {
        self.into()
    }
}

/// Commands that must never be written to, as they hold factory calibration.
///
/// Both the bare cell numbers and the EEPROM opcodes for the cells are listed.
pub(crate) const PROTECTED_COMMANDS: [u8; 5] = [0x0F, 0x19, 0x24, 0x2F, 0x39];

/// Check if a command is for a cell that must not be written to.
pub fn is_protected(command: u8) -> bool {
    PROTECTED_COMMANDS.contains(&command)
}

/// FIR filter settling constants (Table 7 of the datasheet), indexed by FIR setting - 4.
const FIR_SETTLING: [f64; 4] = [5.184, 9.28, 17.472, 33.856];

/// IIR filter settling constants (Table 7 of the datasheet), indexed by IIR setting.
const IIR_SETTLING: [f64; 8] = [10.0, 10.0, 10.0, 10.0, 1.0, 4.0, 8.0, 9.0];

/// Smallest FIR setting with a defined settling time.
const MIN_FIR: u8 = 0x04;

/// Both filter fields are three bits wide.
const MAX_FILTER_SETTING: u8 = 0x07;

/// A validated pair of FIR and IIR filter settings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FilterSettings {
    fir: u8,
    iir: u8,
}

impl FilterSettings {
    /// Validate a pair of filter settings.
    ///
    /// FIR must be in 4..=7 and IIR in 0..=7.
    pub fn new(fir: u8, iir: u8) -> Result<Self, LibraryError> {
        if fir < MIN_FIR {
            Err(LibraryError::OutOfRange(
                "FIR out of range: must be at least 0x04",
            ))
        } else if fir > MAX_FILTER_SETTING || iir > MAX_FILTER_SETTING {
            Err(LibraryError::OutOfRange(
                "FIR or IIR out of range: each must be less than 0x08",
            ))
        } else {
            Ok(Self { fir, iir })
        }
    }

    pub fn fir(&self) -> u8 {
        self.fir
    }

    pub fn iir(&self) -> u8 {
        self.iir
    }

    /// The settling time in milliseconds, from the digital signal filter application note.
    ///
    /// `dual` is whether the device has two IR sensors.
    pub fn settling_time_ms(&self, dual: bool) -> f64 {
        let fir = FIR_SETTLING[(self.fir - MIN_FIR) as usize];
        let iir = IIR_SETTLING[self.iir as usize];
        let dual = if dual { 1.0 } else { 0.0 };
        9.719 + iir * (fir + 5.26) + iir * (fir + 12.542) + dual * iir * (fir + 12.542)
    }
}

/// Config register 1 (EEPROM 0x25).
///
/// Most of this register is factory calibration, and those bits must be preserved when writing
/// it back. The layout, from the most significant bit:
///
/// | Bits   | Contents                                   |
/// |--------|--------------------------------------------|
/// | 15     | Sensor test enable                         |
/// | 14     | Sign of K<sub>t2</sub> (guard)             |
/// | 13..11 | Gain (guard)                               |
/// | 10..8  | FIR                                        |
/// | 7      | Sign of K<sub>s</sub> (guard)              |
/// | 6      | Dual IR sensor (guard)                     |
/// | 5..4   | PWM configuration of T<sub>a</sub>, T<sub>obj1</sub>, T<sub>obj2</sub> |
/// | 3      | Repeat sensor test (guard)                 |
/// | 2..0   | IIR                                        |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConfigRegister(u16);

impl ConfigRegister {
    const FIR_MASK: u16 = 0x0700;

    const FIR_SHIFT: u16 = 8;

    const IIR_MASK: u16 = 0x0007;

    const DUAL_BIT: usize = 6;

    pub fn fir(&self) -> u8 {
        ((self.0 & Self::FIR_MASK) >> Self::FIR_SHIFT) as u8
    }

    pub fn iir(&self) -> u8 {
        (self.0 & Self::IIR_MASK) as u8
    }

    /// Whether the device has two IR sensors.
    pub fn dual_sensor(&self) -> bool {
        is_bit_set(self.0, Self::DUAL_BIT)
    }

    /// The current filter settings, if the FIR setting is valid.
    pub fn filter(&self) -> Result<FilterSettings, LibraryError> {
        FilterSettings::new(self.fir(), self.iir())
    }

    /// Replace only the FIR and IIR bits, leaving every other bit untouched.
    pub fn with_filter(self, filter: FilterSettings) -> Self {
        let mut raw = self.0 & !(Self::FIR_MASK | Self::IIR_MASK);
        raw |= u16::from(filter.fir) << Self::FIR_SHIFT;
        raw |= u16::from(filter.iir);
        Self(raw)
    }

    /// The settling time for the current settings, in milliseconds.
    pub fn settling_time_ms(&self) -> Result<f64, LibraryError> {
        Ok(self.filter()?.settling_time_ms(self.dual_sensor()))
    }
}

impl From<u16> for ConfigRegister {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<ConfigRegister> for u16 {
    fn from(register: ConfigRegister) -> Self {
        register.0
    }
}

/// The diagnostic flags returned by the flags command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Flags {
    /// The previous EEPROM write or erase is still in progress.
    pub eeprom_busy: bool,

    /// An EEPROM double error has occurred.
    pub eeprom_dead: bool,

    /// The power-on initialization routine is still running.
    pub initializing: bool,
}

impl From<u16> for Flags {
    fn from(raw: u16) -> Self {
        Self {
            eeprom_busy: is_bit_set(raw, 7),
            eeprom_dead: is_bit_set(raw, 5),
            // INIT is low active
            initializing: !is_bit_set(raw, 4),
        }
    }
}

#[cfg(test)]
mod test {
    use core::convert::TryFrom;

    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn register_access() {
        assert_eq!(Register::Config.access(), Access::ReadWrite);
        assert_eq!(Register::SlaveAddress.access(), Access::ReadWrite);
        assert_eq!(Register::Emissivity.access(), Access::Protected);
        assert_eq!(Register::ObjectTemperature1.access(), Access::ReadOnly);
        assert_eq!(Register::Id2.access(), Access::ReadOnly);
        assert_eq!(Register::try_from(0x2E).ok(), Some(Register::SlaveAddress));
        assert!(Register::try_from(0x30u8).is_err());
    }

    #[test]
    fn protected_commands() {
        assert!(is_protected(Register::Emissivity.command()));
        assert!(is_protected(0x0F));
        assert!(is_protected(0x19));
        assert!(!is_protected(Register::Config.command()));
        assert!(!is_protected(Register::SlaveAddress.command()));
    }

    #[test]
    fn filter_rejects_low_fir() {
        for fir in 0..4 {
            assert!(matches!(
                FilterSettings::new(fir, 0),
                Err(LibraryError::OutOfRange(_))
            ));
        }
    }

    #[test]
    fn filter_rejects_overflow() {
        assert!(FilterSettings::new(8, 0).is_err());
        assert!(FilterSettings::new(4, 8).is_err());
        assert!(FilterSettings::new(0xFF, 0xFF).is_err());
    }

    #[test]
    fn filter_settling_times() {
        let filter = FilterSettings::new(4, 0).unwrap();
        let expected = 9.719 + 10.0 * (5.184 + 5.26) + 10.0 * (5.184 + 12.542);
        assert_approx_eq!(f64, filter.settling_time_ms(false), expected, epsilon = 1e-9);
        assert_approx_eq!(f64, filter.settling_time_ms(false), 291.419, epsilon = 1e-9);
        let dual = expected + 10.0 * (5.184 + 12.542);
        assert_approx_eq!(f64, filter.settling_time_ms(true), dual, epsilon = 1e-9);
        // FIR = 7, IIR = 4 (the factory default)
        let filter = FilterSettings::new(7, 4).unwrap();
        let expected = 9.719 + 1.0 * (33.856 + 5.26) + 1.0 * (33.856 + 12.542);
        assert_approx_eq!(f64, filter.settling_time_ms(false), expected, epsilon = 1e-9);
    }

    #[test]
    fn filter_accepts_all_valid() {
        let fir_table = [5.184, 9.28, 17.472, 33.856];
        let iir_table = [10.0, 10.0, 10.0, 10.0, 1.0, 4.0, 8.0, 9.0];
        for fir in 4..=7u8 {
            for iir in 0..=7u8 {
                let filter = FilterSettings::new(fir, iir).unwrap();
                let f = fir_table[(fir - 4) as usize];
                let i = iir_table[iir as usize];
                let expected = 9.719 + i * (f + 5.26) + i * (f + 12.542);
                assert_approx_eq!(f64, filter.settling_time_ms(false), expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn config_register_fields() {
        let config = ConfigRegister::from(0x9FB4);
        assert_eq!(config.fir(), 7);
        assert_eq!(config.iir(), 4);
        assert!(!config.dual_sensor());
        let dual = ConfigRegister::from(0x9FF4);
        assert!(dual.dual_sensor());
    }

    #[test]
    fn config_register_preserves_guard_bits() {
        let original = 0xFFFFu16;
        let updated = ConfigRegister::from(original).with_filter(FilterSettings::new(4, 1).unwrap());
        let raw: u16 = updated.into();
        assert_eq!(raw & !0x0707, original & !0x0707);
        assert_eq!(raw & 0x0707, 0x0401);
        let updated = ConfigRegister::from(0x0000).with_filter(FilterSettings::new(6, 5).unwrap());
        assert_eq!(u16::from(updated), 0x0605);
    }

    #[test]
    fn flags() {
        let flags = Flags::from(0x00B0);
        assert!(flags.eeprom_busy);
        assert!(flags.eeprom_dead);
        assert!(!flags.initializing);
        let flags = Flags::from(0x0000);
        assert!(!flags.eeprom_busy);
        assert!(!flags.eeprom_dead);
        assert!(flags.initializing);
    }
}
