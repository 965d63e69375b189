// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! CaliPile EEPROM contents and the calibration derived from them.
//!
//! The calibration math is taken from section 8.5 of the TPiS 1S 1385 datasheet. Both temperature
//! calculations are pure, so a [`Calibration`] can be built from stored values and used without a
//! device attached.
#[cfg_attr(feature = "std", allow(unused_imports))]
use num_traits::Float;

use crate::KELVINS_TO_CELSIUS;

/// The reference ambient temperature the sensor is calibrated at (25 °C), in kelvins.
const REFERENCE_AMBIENT: f64 = 298.15;

/// The thermopile response exponent.
const EXPONENT: f64 = 3.8;

/// The EEPROM values, exactly as they are stored on the device.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EepromData {
    pub protocol: u8,

    pub checksum: u16,

    /// The slave address cell, including the external addressing bit.
    pub slave_address: u8,

    pub lookup: u8,

    pub ptat25: u16,

    pub m: u16,

    pub u0: u16,

    pub uout1: u16,

    /// The calibration object temperature, in degrees Celsius.
    pub tobj1: u8,
}

/// Calibration constants, scaled into the units used by the temperature formulas.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    protocol: u8,
    checksum: u16,
    slave_address: u8,
    lookup: u8,
    ptat25: u16,
    m: f64,
    u0: u32,
    uout1: u32,
    tobj1: u8,
    k: f64,
}

impl Calibration {
    /// Scale the raw EEPROM values and compute k.
    pub fn new(data: &EepromData) -> Self {
        let m = f64::from(data.m) / 100.0;
        let u0 = u32::from(data.u0) + 32768;
        let uout1 = u32::from(data.uout1) * 2;
        let tobj1_kelvin = f64::from(data.tobj1) + KELVINS_TO_CELSIUS;
        let k = (f64::from(uout1) - f64::from(u0))
            / (tobj1_kelvin.powf(EXPONENT) - REFERENCE_AMBIENT.powf(EXPONENT));
        Self {
            protocol: data.protocol,
            checksum: data.checksum,
            // Bit 7 enables external addressing
            slave_address: data.slave_address & 0x7F,
            lookup: data.lookup,
            ptat25: data.ptat25,
            m,
            u0,
            uout1,
            tobj1: data.tobj1,
            k,
        }
    }

    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// The 7-bit slave address.
    pub fn slave_address(&self) -> u8 {
        self.slave_address
    }

    pub fn lookup(&self) -> u8 {
        self.lookup
    }

    /// PTAT value at 25 °C.
    pub fn ptat25(&self) -> u16 {
        self.ptat25
    }

    /// PTAT counts per kelvin.
    pub fn m(&self) -> f64 {
        self.m
    }

    pub fn u0(&self) -> u32 {
        self.u0
    }

    pub fn uout1(&self) -> u32 {
        self.uout1
    }

    /// The calibration object temperature, in degrees Celsius.
    pub fn tobj1(&self) -> u8 {
        self.tobj1
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Calculate the ambient temperature, in kelvins, from a raw TP<sub>ambient</sub> value.
    pub fn ambient_temperature(&self, raw_ambient: u16) -> f64 {
        REFERENCE_AMBIENT + (f64::from(raw_ambient) - f64::from(self.ptat25)) * (1.0 / self.m)
    }

    /// Calculate the object temperature, in kelvins, from a raw TP<sub>object</sub> value and the
    /// ambient temperature (in kelvins).
    pub fn object_temperature(&self, raw_object: u32, ambient: f64) -> f64 {
        let ambient_term = ambient.powf(EXPONENT);
        let object_term = (f64::from(raw_object) - f64::from(self.u0)) / self.k;
        (ambient_term + object_term).powf(1.0 / EXPONENT)
    }
}

impl From<&EepromData> for Calibration {
    fn from(data: &EepromData) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn example_data() -> EepromData {
        EepromData {
            protocol: 0x01,
            checksum: 0x1234,
            slave_address: 0x8C,
            lookup: 0x02,
            ptat25: 8192,
            m: 10000,
            u0: 1000,
            uout1: 20000,
            tobj1: 100,
        }
    }

    #[test]
    fn scaling() {
        let calibration = Calibration::new(&example_data());
        assert_approx_eq!(f64, calibration.m(), 100.0);
        assert_eq!(calibration.u0(), 33768);
        assert_eq!(calibration.uout1(), 40000);
        assert_eq!(calibration.slave_address(), 0x0C);
        assert_eq!(calibration.checksum(), 0x1234);
    }

    #[test]
    fn large_u0_does_not_wrap() {
        let data = EepromData {
            u0: 0xFFFF,
            ..example_data()
        };
        assert_eq!(Calibration::new(&data).u0(), 0xFFFF + 32768);
    }

    #[test]
    fn fractional_m() {
        let data = EepromData {
            m: 12345,
            ..example_data()
        };
        assert_approx_eq!(f64, Calibration::new(&data).m(), 123.45, epsilon = 1e-12);
    }

    #[test]
    fn k() {
        let calibration = Calibration::new(&example_data());
        let expected = (40000.0 - 33768.0) / (373.15f64.powf(3.8) - 298.15f64.powf(3.8));
        assert_approx_eq!(f64, calibration.k(), expected, epsilon = 1e-15);
        assert!(calibration.k() > 0.0);
    }

    #[test]
    fn ambient_temperature() {
        let calibration = Calibration::new(&example_data());
        assert_approx_eq!(
            f64,
            calibration.ambient_temperature(8292),
            299.15,
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            calibration.ambient_temperature(8192),
            298.15,
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            calibration.ambient_temperature(8092),
            297.15,
            epsilon = 1e-9
        );
    }

    #[test]
    fn object_temperature_at_ambient() {
        // With no thermopile signal the object is at the ambient temperature
        let calibration = Calibration::new(&example_data());
        let object = calibration.object_temperature(calibration.u0(), 299.15);
        assert_approx_eq!(f64, object, 299.15, epsilon = 1e-9);
    }

    #[test]
    fn object_temperature_at_calibration_point() {
        // At the reference ambient, UOut1 corresponds to TObj1
        let calibration = Calibration::new(&example_data());
        let object = calibration.object_temperature(calibration.uout1(), 298.15);
        assert_approx_eq!(f64, object, 373.15, epsilon = 1e-6);
    }
}
