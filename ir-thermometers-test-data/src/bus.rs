// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Ref, RefCell};

use embedded_hal::blocking::delay::DelayMs;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MockError {
    /// Nothing responds at the given address.
    UnknownI2cAddress(u8),

    /// The given register doesn't exist.
    UnknownRegister(u8),

    /// The given register can't be written to.
    IllegalWrite(u8),

    /// The PEC of a write did not match.
    BadPec(u8),

    /// An EEPROM cell was written without being erased first.
    NotErased(u8),

    /// The CaliPile EEPROM was accessed without being unlocked.
    EepromLocked(u8),

    /// The transaction doesn't have the shape the device expects.
    IllegalOperation,

    /// A failure requested by the test.
    Injected,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Write,
    Read,
    WriteRead,
}

impl OperationKind {
    fn index(self) -> usize {
        match self {
            OperationKind::Write => 0,
            OperationKind::Read => 1,
            OperationKind::WriteRead => 2,
        }
    }
}

/// Everything that happened on a simulated bus, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Write { address: u8, bytes: Vec<u8> },
    Read { address: u8, length: usize },
    WriteRead { address: u8, command: u8, length: usize },
    Delay(u8),
}

impl Operation {
    pub fn kind(&self) -> Option<OperationKind> {
        match self {
            Operation::Write { .. } => Some(OperationKind::Write),
            Operation::Read { .. } => Some(OperationKind::Read),
            Operation::WriteRead { .. } => Some(OperationKind::WriteRead),
            Operation::Delay(_) => None,
        }
    }
}

/// Operation recording and fault injection shared between clones of a mock device.
#[derive(Clone, Debug, Default)]
pub(crate) struct BusLog {
    operations: Rc<RefCell<Vec<Operation>>>,
    /// For each kind of operation, how many to let through, then how many to fail.
    faults: Rc<RefCell<[(usize, usize); 3]>>,
}

impl BusLog {
    pub(crate) fn record(&self, operation: Operation) {
        self.operations.borrow_mut().push(operation);
    }

    /// Record an operation, then fail it if a fault was queued for that kind of operation.
    pub(crate) fn attempt(&self, operation: Operation) -> Result<(), MockError> {
        let kind = operation.kind();
        self.record(operation);
        match kind {
            Some(kind) => {
                let mut faults = self.faults.borrow_mut();
                let (skip, count) = &mut faults[kind.index()];
                if *skip > 0 {
                    *skip -= 1;
                    Ok(())
                } else if *count > 0 {
                    *count -= 1;
                    Err(MockError::Injected)
                } else {
                    Ok(())
                }
            }
            None => Ok(()),
        }
    }

    pub(crate) fn fail_after(&self, kind: OperationKind, skip: usize, count: usize) {
        self.faults.borrow_mut()[kind.index()] = (skip, count);
    }

    pub(crate) fn operations(&self) -> Ref<Vec<Operation>> {
        self.operations.borrow()
    }

    pub(crate) fn clear(&self) {
        self.operations.borrow_mut().clear()
    }

    pub(crate) fn delay(&self) -> MockDelay {
        MockDelay { log: self.clone() }
    }
}

/// A delay that doesn't wait, but records each request in the bus's operations.
#[derive(Clone, Debug)]
pub struct MockDelay {
    log: BusLog,
}

impl MockDelay {
    /// A delay that isn't attached to a bus.
    pub fn new() -> Self {
        Self {
            log: BusLog::default(),
        }
    }

    /// The total time requested, in milliseconds.
    pub fn total_ms(&self) -> u32 {
        self.log
            .operations()
            .iter()
            .filter_map(|operation| match operation {
                Operation::Delay(ms) => Some(u32::from(*ms)),
                _ => None,
            })
            .sum()
    }
}

impl Default for MockDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayMs<u8> for MockDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.log.record(Operation::Delay(ms));
    }
}

/// Shared methods for inspecting and steering a mock device.
macro_rules! mock_bus_common {
    ($mock:ty) => {
        impl $mock {
            /// Everything that has happened on the bus so far.
            pub fn operations(&self) -> core::cell::Ref<alloc::vec::Vec<$crate::Operation>> {
                self.log.operations()
            }

            pub fn clear_operations(&self) {
                self.log.clear()
            }

            /// Make the next `count` operations of the given kind fail.
            pub fn fail_next(&self, kind: $crate::OperationKind, count: usize) {
                self.log.fail_after(kind, 0, count)
            }

            /// Let `skip` operations of the given kind succeed, then fail the next `count`.
            pub fn fail_after(&self, kind: $crate::OperationKind, skip: usize, count: usize) {
                self.log.fail_after(kind, skip, count)
            }

            /// A delay that records into this bus's operations.
            pub fn delay(&self) -> $crate::MockDelay {
                self.log.delay()
            }
        }
    };
}

pub(crate) use mock_bus_common;
