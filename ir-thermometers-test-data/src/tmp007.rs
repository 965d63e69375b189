// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use alloc::collections::{BTreeMap, VecDeque};
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use embedded_hal::blocking::i2c;

use crate::bus::{mock_bus_common, BusLog};
use crate::{MockError, Operation};

const STATUS: u8 = 0x04;

const RESET_BIT: u16 = 0x8000;

/// A simulated TMP007.
///
/// Writing a single byte sets the register pointer, and plain reads return the register the
/// pointer selects. Status register values can be queued to simulate conversions completing.
#[derive(Clone, Debug)]
pub struct MockTmp007 {
    address: u8,
    registers: Rc<RefCell<BTreeMap<u8, u16>>>,
    pointer: Rc<Cell<u8>>,
    status_queue: Rc<RefCell<VecDeque<u16>>>,
    resets: Rc<Cell<usize>>,
    log: BusLog,
}

mock_bus_common!(MockTmp007);

impl MockTmp007 {
    pub fn new(address: u8, registers: &[(u8, u16)]) -> Self {
        Self {
            address,
            registers: Rc::new(RefCell::new(registers.iter().copied().collect())),
            pointer: Rc::new(Cell::new(0)),
            status_queue: Rc::new(RefCell::new(VecDeque::new())),
            resets: Rc::new(Cell::new(0)),
            log: BusLog::default(),
        }
    }

    pub fn register(&self, register: u8) -> Option<u16> {
        self.registers.borrow().get(&register).copied()
    }

    pub fn set_register(&self, register: u8, value: u16) {
        self.registers.borrow_mut().insert(register, value);
    }

    /// Values returned by the next status reads, before falling back to the status register.
    pub fn queue_status(&self, values: &[u16]) {
        self.status_queue.borrow_mut().extend(values.iter().copied());
    }

    /// How many software resets have been requested.
    pub fn resets(&self) -> usize {
        self.resets.get()
    }
}

impl i2c::Write for MockTmp007 {
    type Error = MockError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.log.attempt(Operation::Write {
            address,
            bytes: bytes.to_vec(),
        })?;
        if address != self.address {
            return Err(MockError::UnknownI2cAddress(address));
        }
        match *bytes {
            [register] => {
                if self.register(register).is_none() {
                    return Err(MockError::UnknownRegister(register));
                }
                self.pointer.set(register);
                Ok(())
            }
            [register, high, low] => {
                let value = u16::from_be_bytes([high, low]);
                match register {
                    0x02 if value & RESET_BIT != 0 => {
                        self.resets.set(self.resets.get() + 1);
                        // The reset bit clears itself
                        self.set_register(register, value & !RESET_BIT);
                    }
                    0x02 | 0x05 | 0x06 | 0x07 | 0x08 | 0x09 => self.set_register(register, value),
                    _ => return Err(MockError::IllegalWrite(register)),
                }
                self.pointer.set(register);
                Ok(())
            }
            _ => Err(MockError::IllegalOperation),
        }
    }
}

impl i2c::Read for MockTmp007 {
    type Error = MockError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.log.attempt(Operation::Read {
            address,
            length: buffer.len(),
        })?;
        if address != self.address {
            return Err(MockError::UnknownI2cAddress(address));
        }
        if buffer.len() != 2 {
            return Err(MockError::IllegalOperation);
        }
        let pointer = self.pointer.get();
        let queued = if pointer == STATUS {
            self.status_queue.borrow_mut().pop_front()
        } else {
            None
        };
        let value = match queued {
            Some(value) => value,
            None => self
                .register(pointer)
                .ok_or(MockError::UnknownRegister(pointer))?,
        };
        buffer.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

impl i2c::WriteRead for MockTmp007 {
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
        // Registers are always read with a separate pointer write
        Err(MockError::IllegalOperation)
    }
}

/// Die temperature, 25 °C.
pub const TMP007_DIE: u16 = 0x0C80;

/// Object temperature, 18.75 °C.
pub const TMP007_OBJECT: u16 = 0x0960;

/// Sensor voltage, 1.25 µV.
pub const TMP007_VOLTAGE: u16 = 0x0008;

/// A simulated TMP007 with power-on register values, at the given address.
pub fn tmp007_at_address(address: u8) -> MockTmp007 {
    MockTmp007::new(
        address,
        &[
            (0x00, TMP007_VOLTAGE),
            (0x01, TMP007_DIE),
            (0x02, 0x1440),
            (0x03, TMP007_OBJECT),
            (0x04, 0x0000),
            (0x05, 0x0000),
            (0x1F, 0x0078),
        ],
    )
}
