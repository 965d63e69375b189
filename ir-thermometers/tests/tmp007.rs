// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use float_cmp::assert_approx_eq;

use ir_thermometers::tmp007::{self, Averaging, Register, POLL_INTERVAL_MS, READ_ATTEMPTS};
use ir_thermometers::{Config, Error, LibraryError, Tmp007};
use ir_thermometers_test_data::*;

const ADDRESS: u8 = tmp007::DEFAULT_ADDRESS;

fn driver() -> (Tmp007<MockTmp007, MockDelay>, MockTmp007) {
    let mock = tmp007_at_address(ADDRESS);
    let driver = Tmp007::new(mock.clone(), mock.delay(), Config::new()).expect("the driver to start");
    mock.clear_operations();
    (driver, mock)
}

fn status_polls(mock: &MockTmp007) -> usize {
    mock.operations()
        .iter()
        .filter(|operation| {
            matches!(operation, Operation::Write { bytes, .. } if bytes[..] == [Register::Status.address()])
        })
        .count()
}

#[test]
fn start_sequence() {
    let mock = tmp007_at_address(ADDRESS);
    let driver = Tmp007::new(mock.clone(), mock.delay(), Config::new()).unwrap();
    assert_eq!(driver.device_id(), 0x0078);
    assert_eq!(
        &mock.operations()[..],
        &[
            Operation::Write {
                address: ADDRESS,
                bytes: vec![0x1F]
            },
            Operation::Read {
                address: ADDRESS,
                length: 2
            },
            Operation::Write {
                address: ADDRESS,
                bytes: vec![0x02, 0x10, 0x00]
            },
            Operation::Write {
                address: ADDRESS,
                bytes: vec![0x05, 0x40, 0x00]
            },
        ]
    );
    assert_eq!(mock.register(0x02), Some(tmp007::config::CONVERSION_ENABLE));
    assert_eq!(mock.register(0x05), Some(tmp007::mask::CONVERSION_READY_ENABLE));
}

#[test]
fn start_detects_wrong_device() {
    let mock = tmp007_at_address(ADDRESS);
    mock.set_register(0x1F, 0x0079);
    let result = Tmp007::new(mock.clone(), mock.delay(), Config::new());
    assert!(matches!(
        result,
        Err(Error::LibraryError(LibraryError::DeviceNotDetected {
            expected: 0x0078,
            actual: 0x0079
        }))
    ));
    // Nothing was configured
    assert_eq!(mock.register(0x02), Some(0x1440));
}

#[test]
fn temperatures() {
    let (mut driver, _) = driver();
    assert_approx_eq!(f64, driver.die_temperature().unwrap(), 25.0);
    assert_approx_eq!(f64, driver.object_temperature().unwrap(), 18.75);
    assert_approx_eq!(f64, driver.sensor_voltage().unwrap(), 1.25);
}

#[test]
fn negative_temperature() {
    let (mut driver, mock) = driver();
    // -0.25 °C
    mock.set_register(0x03, 0xFFE0);
    assert_approx_eq!(f64, driver.object_temperature().unwrap(), -0.25);
}

#[test]
fn invalid_data() {
    let (mut driver, mock) = driver();
    mock.set_register(0x01, TMP007_DIE | 0x0001);
    mock.set_register(0x03, TMP007_OBJECT | 0x0001);
    assert!(matches!(
        driver.die_temperature(),
        Err(Error::LibraryError(LibraryError::InvalidData(_)))
    ));
    assert!(matches!(
        driver.object_temperature(),
        Err(Error::LibraryError(LibraryError::InvalidData(_)))
    ));
}

#[test]
fn reads_are_retried() {
    let (mut driver, mock) = driver();
    mock.fail_next(OperationKind::Read, 5);
    assert_approx_eq!(f64, driver.die_temperature().unwrap(), 25.0);
    // One pointer write, five failed reads, one good read
    assert_eq!(mock.operations().len(), 7);
}

#[test]
fn read_retries_are_bounded() {
    let (mut driver, mock) = driver();
    mock.fail_next(OperationKind::Read, READ_ATTEMPTS);
    assert!(matches!(
        driver.die_temperature(),
        Err(Error::I2cReadError(MockError::Injected))
    ));
    assert_eq!(mock.operations().len(), READ_ATTEMPTS + 1);
}

#[test]
fn pointer_write_failure() {
    let (mut driver, mock) = driver();
    mock.fail_next(OperationKind::Write, 1);
    assert!(matches!(
        driver.status(),
        Err(Error::I2cWriteError(MockError::Injected))
    ));
    assert_eq!(mock.operations().len(), 1);
}

#[test]
fn wait_for_conversion() {
    let (mut driver, mock) = driver();
    mock.queue_status(&[0x0000, 0x0000, 0x0000, 0x4000]);
    driver.wait_for_conversion_ready().unwrap();
    assert_eq!(status_polls(&mock), 4);
    let delays: Vec<_> = mock
        .operations()
        .iter()
        .filter(|operation| matches!(operation, Operation::Delay(_)))
        .cloned()
        .collect();
    assert_eq!(delays, vec![Operation::Delay(POLL_INTERVAL_MS); 3]);
}

#[test]
fn wait_for_conversion_propagates_errors() {
    let (mut driver, mock) = driver();
    mock.queue_status(&[0x0000]);
    mock.fail_after(OperationKind::Write, 1, 1);
    assert!(matches!(
        driver.wait_for_conversion_ready(),
        Err(Error::I2cWriteError(MockError::Injected))
    ));
}

#[test]
fn bounded_wait() {
    let (mut driver, mock) = driver();
    mock.queue_status(&[0x0000, 0x4000]);
    driver.wait_for_conversion_ready_within(3).unwrap();
    assert_eq!(status_polls(&mock), 2);
}

#[test]
fn bounded_wait_times_out() {
    let (mut driver, mock) = driver();
    assert!(matches!(
        driver.wait_for_conversion_ready_within(4),
        Err(Error::LibraryError(LibraryError::Timeout))
    ));
    assert_eq!(status_polls(&mock), 4);
}

#[test]
fn averaging() {
    let (mut driver, mock) = driver();
    driver.set_averaging(Averaging::Sixteen).unwrap();
    assert_eq!(mock.register(0x02), Some(0x1800));
    driver.set_averaging(Averaging::One).unwrap();
    assert_eq!(mock.register(0x02), Some(0x1000));
}

#[test]
fn reset() {
    let (mut driver, mock) = driver();
    mock.set_register(0x05, 0x0000);
    driver.reset().unwrap();
    assert_eq!(mock.resets(), 1);
    assert_eq!(mock.register(0x02), Some(tmp007::config::CONVERSION_ENABLE));
    assert_eq!(mock.register(0x05), Some(tmp007::mask::CONVERSION_READY_ENABLE));
}

#[test]
fn release() {
    let (mut driver, mock) = driver();
    driver.halt().unwrap();
    assert_eq!(driver.address(), ADDRESS);
    let (_bus, _delay) = driver.release();
    assert!(mock.operations().is_empty());
}
