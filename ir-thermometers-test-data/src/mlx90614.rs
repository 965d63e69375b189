// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::convert::TryInto;
use core::ops::RangeInclusive;

use embedded_hal::blocking::i2c;
use ir_thermometers::mlx90614::pec;

use crate::bus::{mock_bus_common, BusLog};
use crate::{MockError, Operation};

const EEPROM_RANGE: RangeInclusive<u8> = 0x20..=0x3F;

const SLEEP_COMMAND: u8 = 0xFF;

/// A simulated MLX90614.
///
/// Reads answer with a correct PEC (unless asked not to), writes must carry a correct PEC, and
/// EEPROM cells have to be erased before they can be written.
#[derive(Clone, Debug)]
pub struct MockMlx90614 {
    address: u8,
    memory: Rc<RefCell<BTreeMap<u8, u16>>>,
    corrupt_pecs: Rc<Cell<usize>>,
    asleep: Rc<Cell<bool>>,
    log: BusLog,
}

mock_bus_common!(MockMlx90614);

impl MockMlx90614 {
    pub fn new(address: u8, memory: &[(u8, u16)]) -> Self {
        Self {
            address,
            memory: Rc::new(RefCell::new(memory.iter().copied().collect())),
            corrupt_pecs: Rc::new(Cell::new(0)),
            asleep: Rc::new(Cell::new(false)),
            log: BusLog::default(),
        }
    }

    pub fn word(&self, command: u8) -> Option<u16> {
        self.memory.borrow().get(&command).copied()
    }

    pub fn set_word(&self, command: u8, value: u16) {
        self.memory.borrow_mut().insert(command, value);
    }

    /// Send a wrong PEC for the next `count` reads.
    pub fn corrupt_next_pec(&self, count: usize) {
        self.corrupt_pecs.set(count);
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep.get()
    }

    fn write_word(&self, command: u8, data: u16) -> Result<(), MockError> {
        if !EEPROM_RANGE.contains(&command) {
            return Err(MockError::IllegalWrite(command));
        }
        let mut memory = self.memory.borrow_mut();
        let cell = memory
            .get_mut(&command)
            .ok_or(MockError::UnknownRegister(command))?;
        if data == 0x0000 {
            *cell = 0x0000;
            Ok(())
        } else if *cell != 0x0000 {
            Err(MockError::NotErased(command))
        } else {
            *cell = data;
            Ok(())
        }
    }
}

impl i2c::Write for MockMlx90614 {
    type Error = MockError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.log.attempt(Operation::Write {
            address,
            bytes: bytes.to_vec(),
        })?;
        if address != self.address {
            return Err(MockError::UnknownI2cAddress(address));
        }
        match bytes.len() {
            2 if bytes[0] == SLEEP_COMMAND => {
                if bytes[..] != pec::command_frame(address, SLEEP_COMMAND)[..] {
                    return Err(MockError::BadPec(SLEEP_COMMAND));
                }
                self.asleep.set(true);
                Ok(())
            }
            _ => {
                let frame: [u8; 4] = bytes.try_into().map_err(|_| MockError::IllegalOperation)?;
                let (command, data) = pec::decode_write_frame(address, &frame)
                    .map_err(|_| MockError::BadPec(frame[0]))?;
                self.write_word(command, data)
            }
        }
    }
}

impl i2c::Read for MockMlx90614 {
    type Error = MockError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.log.attempt(Operation::Read {
            address,
            length: buffer.len(),
        })?;
        // Every MLX90614 read starts with a command
        Err(MockError::IllegalOperation)
    }
}

impl i2c::WriteRead for MockMlx90614 {
    type Error = MockError;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.log.attempt(Operation::WriteRead {
            address,
            command: bytes.first().copied().unwrap_or_default(),
            length: buffer.len(),
        })?;
        if address != self.address {
            return Err(MockError::UnknownI2cAddress(address));
        }
        if bytes.len() != 1 || buffer.len() != 3 || self.asleep.get() {
            return Err(MockError::IllegalOperation);
        }
        let command = bytes[0];
        let value = self
            .word(command)
            .ok_or(MockError::UnknownRegister(command))?;
        let mut pec = pec::read_pec(address, command, value);
        let corrupt = self.corrupt_pecs.get();
        if corrupt > 0 {
            self.corrupt_pecs.set(corrupt - 1);
            pec = !pec;
        }
        let [low, high] = value.to_le_bytes();
        buffer.copy_from_slice(&[low, high, pec]);
        Ok(())
    }
}

/// Raw IR channel 1 reading, -16 in sign-magnitude.
pub const MLX90614_RAW_IR_1: u16 = 0x8010;

/// Ambient temperature, 25.01 °C.
pub const MLX90614_AMBIENT: u16 = 0x3A3C;

/// Object temperature, the datasheet's 28.01 °C.
pub const MLX90614_OBJECT: u16 = 0x3AD2;

/// Factory default config register 1: FIR 7, IIR 4, single sensor.
pub const MLX90614_CONFIG: u16 = 0x9FB4;

pub const MLX90614_ID: [u16; 4] = [0x1234, 0x5678, 0x9ABC, 0xDEF0];

/// A simulated MLX90614 with typical factory EEPROM contents, configured for the given address.
pub fn mlx90614_at_address(address: u8) -> MockMlx90614 {
    MockMlx90614::new(
        address,
        &[
            (0x04, MLX90614_RAW_IR_1),
            (0x05, 0x0000),
            (0x06, MLX90614_AMBIENT),
            (0x07, MLX90614_OBJECT),
            (0x08, MLX90614_OBJECT),
            (0x20, 0x9993),
            (0x21, 0x62E3),
            (0x22, 0x0201),
            (0x23, 0xF71C),
            (0x24, 0xFFFF),
            (0x25, MLX90614_CONFIG),
            (0x2E, 0xBE00 | u16::from(address)),
            (0x3C, MLX90614_ID[0]),
            (0x3D, MLX90614_ID[1]),
            (0x3E, MLX90614_ID[2]),
            (0x3F, MLX90614_ID[3]),
            // EEBUSY and EE_DEAD clear, INIT done
            (0xF0, 0x0010),
        ],
    )
}
