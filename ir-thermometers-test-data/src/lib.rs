// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

//! Simulated devices for testing `ir-thermometers` without hardware.
//!
//! Each mock shares its state between clones, so a test can keep a clone to inspect the recorded
//! operations after moving the original into a driver.
extern crate alloc;

mod bus;
mod calipile;
mod mlx90614;
mod tmp007;

pub use bus::{MockDelay, MockError, Operation, OperationKind};
pub use calipile::{
    calipile_at_address, MockCalipile, CALIPILE_M, CALIPILE_PTAT25, CALIPILE_RAW_AMBIENT,
    CALIPILE_RAW_OBJECT, CALIPILE_TOBJ1, CALIPILE_U0, CALIPILE_UOUT1,
};
pub use mlx90614::{
    mlx90614_at_address, MockMlx90614, MLX90614_AMBIENT, MLX90614_CONFIG, MLX90614_ID,
    MLX90614_OBJECT, MLX90614_RAW_IR_1,
};
pub use tmp007::{tmp007_at_address, MockTmp007, TMP007_DIE, TMP007_OBJECT, TMP007_VOLTAGE};
