// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::LibraryError;
use crate::util::is_bit_set;

/// TMP007 registers. All of them are 16 bits wide, and sent most significant byte first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    SensorVoltage = 0x00,

    DieTemperature = 0x01,

    Configuration = 0x02,

    ObjectTemperature = 0x03,

    Status = 0x04,

    StatusMask = 0x05,

    DeviceId = 0x1F,
}

impl Register {
    pub fn address(self) -> u8 {
        self.into()
    }
}

/// The expected contents of [`Register::DeviceId`].
pub const DEVICE_ID: u16 = 0x0078;

/// Configuration register bits.
pub mod config {
    /// Software reset, self clearing.
    pub const RESET: u16 = 0x8000;

    /// Enable conversions.
    pub const CONVERSION_ENABLE: u16 = 0x1000;

    /// The averaging field, see [`Averaging`][super::Averaging].
    pub const AVERAGING_MASK: u16 = 0x0E00;

    pub const ALERT_ENABLE: u16 = 0x0100;

    pub const ALERT_FLAG: u16 = 0x0080;

    /// Transient correction enable.
    pub const TRANSIENT_CORRECTION: u16 = 0x0040;
}

/// Status mask register bits.
pub mod mask {
    /// Alert pin enable.
    pub const ALERT_ENABLE: u16 = 0x8000;

    /// Conversion ready enable.
    pub const CONVERSION_READY_ENABLE: u16 = 0x4000;
}

/// How many samples are averaged into each conversion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum Averaging {
    One = 0x0000,
    Two = 0x0200,
    Four = 0x0400,
    Eight = 0x0600,
    Sixteen = 0x0800,
}

impl Averaging {
    /// Replace the averaging bits of a configuration register value.
    pub fn apply(self, configuration: u16) -> u16 {
        (configuration & !config::AVERAGING_MASK) | u16::from(self)
    }
}

impl Default for Averaging {
    fn default() -> Self {
        Self::Four
    }
}

/// The status register.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Status(u16);

impl Status {
    const CONVERSION_READY_BIT: usize = 14;

    /// A new conversion result is available.
    pub fn conversion_ready(&self) -> bool {
        is_bit_set(self.0, Self::CONVERSION_READY_BIT)
    }
}

impl From<u16> for Status {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> Self {
        status.0
    }
}

/// Temperature resolution, in degrees Celsius.
const DEGREES_PER_LSB: f64 = 0.03125;

/// Sensor voltage resolution, in nanovolts.
const NANOVOLTS_PER_LSB: f64 = 156.25;

/// Decode a die or object temperature register into degrees Celsius.
///
/// Bit 0 is the "not data valid" flag, and bit 1 is unused. Both are shifted out of the 14-bit
/// two's complement temperature.
pub fn decode_temperature(raw: u16) -> Result<f64, LibraryError> {
    if is_bit_set(raw, 0) {
        return Err(LibraryError::InvalidData("nDV bit is set"));
    }
    let value = (raw as i16) >> 2;
    Ok(f64::from(value) * DEGREES_PER_LSB)
}

/// Decode the sensor voltage register into microvolts.
pub fn decode_sensor_voltage(raw: u16) -> f64 {
    f64::from(raw as i16) * NANOVOLTS_PER_LSB / 1000.0
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn temperatures() {
        // 25 °C, 0x0320 before the flag bits
        assert_approx_eq!(f64, decode_temperature(0x0C80).unwrap(), 25.0);
        assert_approx_eq!(f64, decode_temperature(0x0000).unwrap(), 0.0);
        // Bit 1 is ignored
        assert_approx_eq!(f64, decode_temperature(0x0006).unwrap(), 0.03125);
        // -0.25 °C
        assert_approx_eq!(f64, decode_temperature(0xFFE0).unwrap(), -0.25);
    }

    #[test]
    fn invalid_temperature() {
        assert_eq!(
            decode_temperature(0x3201),
            Err(LibraryError::InvalidData("nDV bit is set"))
        );
        assert!(decode_temperature(0xFFFF).is_err());
    }

    #[test]
    fn sensor_voltage() {
        assert_approx_eq!(f64, decode_sensor_voltage(0x0000), 0.0);
        assert_approx_eq!(f64, decode_sensor_voltage(0x0008), 1.25);
        assert_approx_eq!(f64, decode_sensor_voltage(0xFFF8), -1.25);
        assert_approx_eq!(f64, decode_sensor_voltage(0x7FFF), 5119.84375);
    }

    #[test]
    fn status() {
        assert!(Status::from(0x4000).conversion_ready());
        assert!(Status::from(0xC000).conversion_ready());
        assert!(!Status::from(0x8000).conversion_ready());
        assert!(!Status::from(0x0000).conversion_ready());
    }

    #[test]
    fn averaging() {
        assert_eq!(Averaging::Sixteen.apply(config::CONVERSION_ENABLE), 0x1800);
        assert_eq!(Averaging::One.apply(0x1E40), 0x1040);
        assert_eq!(Averaging::Two.apply(0xFFFF), 0xF3FF);
        assert_eq!(Averaging::default(), Averaging::Four);
    }
}
