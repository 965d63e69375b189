use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ir_thermometers::calipile::{Calibration, EepromData};
use ir_thermometers_test_data::{
    CALIPILE_M, CALIPILE_PTAT25, CALIPILE_RAW_AMBIENT, CALIPILE_RAW_OBJECT, CALIPILE_TOBJ1,
    CALIPILE_U0, CALIPILE_UOUT1,
};

fn example_eeprom() -> EepromData {
    EepromData {
        protocol: 0x01,
        checksum: 0x1234,
        slave_address: 0x8C,
        lookup: 0x02,
        ptat25: CALIPILE_PTAT25,
        m: CALIPILE_M,
        u0: CALIPILE_U0,
        uout1: CALIPILE_UOUT1,
        tobj1: CALIPILE_TOBJ1,
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("CaliPile");

    group.bench_with_input("Calibration", &example_eeprom(), |b, eeprom| {
        b.iter(|| Calibration::new(eeprom))
    });
    let calibration = Calibration::new(&example_eeprom());
    group.bench_with_input("Ambient temperature", &calibration, |b, calibration| {
        b.iter(|| calibration.ambient_temperature(black_box(CALIPILE_RAW_AMBIENT)))
    });
    group.bench_with_input("Object temperature", &calibration, |b, calibration| {
        b.iter(|| calibration.object_temperature(black_box(CALIPILE_RAW_OBJECT + 500), black_box(299.15)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
