use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ir_thermometers::mlx90614::pec;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("MLX90614 PEC");

    group.bench_function("Write frame", |b| {
        b.iter(|| pec::write_frame(black_box(0x5A), black_box(0x25), black_box(0x9FB4)))
    });
    let pec = pec::read_pec(0x5A, 0x07, 0x3AD2);
    let response = [0xD2, 0x3A, pec];
    group.bench_with_input("Read response", &response, |b, response| {
        b.iter(|| pec::decode_read_response(black_box(0x5A), black_box(0x07), response))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
