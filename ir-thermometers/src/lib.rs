// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! Drivers for a few small I²C infrared thermometers: the Melexis MLX90614, the Excelitas CaliPile
//! (TPiS 1S 1385) and the Texas Instruments TMP007.
//!
//! Each driver takes ownership of an [`embedded-hal`][embedded-hal] I²C bus, runs the device's
//! start-up checks when it is created, and then exposes typed accessors for the device's
//! registers. The register encodings and temperature calculations are plain functions, usable
//! without a device attached. This crate is `no_std` compatible; enable the `libm` feature (and
//! disable `std`) to get the floating point functions the CaliPile calculations need.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal/*/embedded_hal/blocking/i2c/index.html
//!
//! # Example
//! ```no_run
//! use ir_thermometers::{Config, Mlx90614};
//! use linux_embedded_hal::{Delay, I2cdev};
//!
//! let bus = I2cdev::new("/dev/i2c-1").expect("/dev/i2c-1 needs to be an I2C controller");
//! // Default address for the MLX90614 is 0x5A
//! let mut thermometer = Mlx90614::new(bus, Delay, Config::new())?;
//! let ambient = thermometer.ambient_temperature()?;
//! let object = thermometer.object_temperature()?;
//! println!("Ambient: {:.2} °C, object: {:.2} °C", ambient, object);
//! # Ok::<(), ir_thermometers::Error<I2cdev>>(())
//! ```
//!
//! # Logging
//! The drivers report what they are doing through the [`log`] facade: register writes and
//! start-up results at `debug`, raw reads at `trace`, and retried or non-fatal failures at `warn`.
//! Nothing is logged unless the application installs a logger. The encoding and calculation
//! functions never log.
//!
//! # SMBus and Packet Error Codes
//! The MLX90614 is an SMBus device and appends a PEC to every transaction. The PEC covers the
//! address bytes, which the I²C implementation sends on its own, so the [`mlx90614::pec`] module
//! builds and checks these codes itself. Corrupted responses are reported as
//! [`LibraryError::Checksum`] and are never retried, while transport failures are retried a fixed
//! number of times.

#![no_std]
#![allow(clippy::float_cmp)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Either the 'std' or 'libm' feature must be enabled.");

pub mod calipile;
pub mod config;
#[doc(hidden)]
pub mod error;
#[cfg(feature = "linux")]
pub mod linux;
pub mod mlx90614;
pub mod tmp007;
mod util;

#[doc(inline)]
pub use calipile::Calipile;
pub use config::Config;
#[doc(inline)]
pub use error::{CalibrationField, EepromPhase, Error, LibraryError, Warned};
#[doc(inline)]
pub use mlx90614::Mlx90614;
#[doc(inline)]
pub use tmp007::Tmp007;

/// The offset between the Kelvin and Celsius scales.
pub const KELVINS_TO_CELSIUS: f64 = 273.15;
