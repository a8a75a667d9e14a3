use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use qrforge::{encode_binary, encode_text, ECLevel};

fn bench_encode(c: &mut Criterion) {
    c.bench_function("encode_text_v1", |b| {
        b.iter(|| encode_text(black_box("Hello, world!"), ECLevel::L).unwrap())
    });

    let digits = "1234567890".repeat(100);
    c.bench_function("encode_numeric_1k", |b| {
        b.iter(|| encode_text(black_box(&digits), ECLevel::M).unwrap())
    });

    let blob = vec![0xA5u8; 2000];
    c.bench_function("encode_binary_2k", |b| {
        b.iter(|| encode_binary(black_box(&blob), ECLevel::L).unwrap())
    });
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
