// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::ops::RangeInclusive;

use embedded_hal::blocking::i2c;

use crate::bus::{mock_bus_common, BusLog};
use crate::{MockError, Operation};

const REGISTER_COUNT: usize = 64;

const WRITEABLE_RANGE: RangeInclusive<u8> = 20..=31;

const EEPROM_RANGE: RangeInclusive<u8> = 32..=63;

const EEPROM_CONTROL: u8 = 31;

const EEPROM_UNLOCKED: u8 = 0x80;

const GENERAL_CALL_RELOAD: [u8; 2] = [0x04, 0x00];

/// A simulated CaliPile.
///
/// The EEPROM (registers 32 and up) can only be read after it has been unlocked through the
/// EEPROM control register.
#[derive(Clone, Debug)]
pub struct MockCalipile {
    address: u8,
    registers: Rc<RefCell<[u8; REGISTER_COUNT]>>,
    reloads: Rc<Cell<usize>>,
    rejected_read: Rc<Cell<Option<u8>>>,
    rejected_write: Rc<Cell<Option<u8>>>,
    log: BusLog,
}

mock_bus_common!(MockCalipile);

impl MockCalipile {
    pub fn new(address: u8, registers: [u8; REGISTER_COUNT]) -> Self {
        Self {
            address,
            registers: Rc::new(RefCell::new(registers)),
            reloads: Rc::new(Cell::new(0)),
            rejected_read: Rc::new(Cell::new(None)),
            rejected_write: Rc::new(Cell::new(None)),
            log: BusLog::default(),
        }
    }

    pub fn register(&self, register: u8) -> u8 {
        self.registers.borrow()[register as usize]
    }

    pub fn set_register(&self, register: u8, value: u8) {
        self.registers.borrow_mut()[register as usize] = value;
    }

    /// How many general call reloads have been received.
    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }

    pub fn eeprom_unlocked(&self) -> bool {
        self.register(EEPROM_CONTROL) == EEPROM_UNLOCKED
    }

    /// Fail every read of the given register.
    pub fn reject_reads_from(&self, register: u8) {
        self.rejected_read.set(Some(register));
    }

    /// Fail every write to the given register.
    pub fn reject_writes_to(&self, register: u8) {
        self.rejected_write.set(Some(register));
    }

    /// Set the raw TP<sub>object</sub> and TP<sub>ambient</sub> readings.
    pub fn set_readout(&self, object: u32, ambient: u16) {
        let mut registers = self.registers.borrow_mut();
        registers[1] = (object >> 9) as u8;
        registers[2] = (object >> 1) as u8;
        registers[3] = (((object & 0x01) as u8) << 7) | ((ambient >> 8) as u8 & 0x7F);
        registers[4] = ambient as u8;
    }
}

impl i2c::Write for MockCalipile {
    type Error = MockError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.log.attempt(Operation::Write {
            address,
            bytes: bytes.to_vec(),
        })?;
        if address == 0x00 {
            return if bytes == &GENERAL_CALL_RELOAD[..] {
                self.reloads.set(self.reloads.get() + 1);
                Ok(())
            } else {
                Err(MockError::IllegalOperation)
            };
        }
        if address != self.address {
            return Err(MockError::UnknownI2cAddress(address));
        }
        match *bytes {
            [register, value] => {
                if !WRITEABLE_RANGE.contains(&register) || self.rejected_write.get() == Some(register)
                {
                    return Err(MockError::IllegalWrite(register));
                }
                self.set_register(register, value);
                Ok(())
            }
            _ => Err(MockError::IllegalOperation),
        }
    }
}

impl i2c::Read for MockCalipile {
    type Error = MockError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.log.attempt(Operation::Read {
            address,
            length: buffer.len(),
        })?;
        Err(MockError::IllegalOperation)
    }
}

impl i2c::WriteRead for MockCalipile {
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
        let register = match *bytes {
            [register] if buffer.len() == 1 => register,
            _ => return Err(MockError::IllegalOperation),
        };
        if register as usize >= REGISTER_COUNT {
            return Err(MockError::UnknownRegister(register));
        }
        if self.rejected_read.get() == Some(register) {
            return Err(MockError::Injected);
        }
        if EEPROM_RANGE.contains(&register) && !self.eeprom_unlocked() {
            return Err(MockError::EepromLocked(register));
        }
        buffer[0] = self.register(register);
        Ok(())
    }
}

pub const CALIPILE_PTAT25: u16 = 8192;

/// M as stored, 100 counts per kelvin once scaled.
pub const CALIPILE_M: u16 = 10000;

/// U0 as stored, 33768 once scaled.
pub const CALIPILE_U0: u16 = 1000;

/// UOut1 as stored, 40000 once scaled.
pub const CALIPILE_UOUT1: u16 = 20000;

pub const CALIPILE_TOBJ1: u8 = 100;

/// Raw ambient reading for 299.15 K.
pub const CALIPILE_RAW_AMBIENT: u16 = 8292;

/// Raw object reading equal to the scaled U0, so the object is at the ambient temperature.
pub const CALIPILE_RAW_OBJECT: u32 = 33768;

/// A simulated CaliPile with example calibration values, configured for the given address.
pub fn calipile_at_address(address: u8) -> MockCalipile {
    let mut registers = [0u8; REGISTER_COUNT];
    registers[15] = 0x12; // presence
    registers[16] = 0x34; // motion
    registers[17] = 0x56; // ambient shock
    registers[18] = 0x08; // interrupt status
    registers[19] = 0x80; // chip status
    registers[32] = 0x01; // protocol
    registers[33..35].copy_from_slice(&0x1234u16.to_be_bytes());
    registers[41] = 0x02; // lookup
    registers[42..44].copy_from_slice(&CALIPILE_PTAT25.to_be_bytes());
    registers[44..46].copy_from_slice(&CALIPILE_M.to_be_bytes());
    registers[46..48].copy_from_slice(&CALIPILE_U0.to_be_bytes());
    registers[48..50].copy_from_slice(&CALIPILE_UOUT1.to_be_bytes());
    registers[50] = CALIPILE_TOBJ1;
    // External addressing enabled
    registers[63] = 0x80 | address;
    let mock = MockCalipile::new(address, registers);
    mock.set_readout(CALIPILE_RAW_OBJECT, CALIPILE_RAW_AMBIENT);
    mock
}
