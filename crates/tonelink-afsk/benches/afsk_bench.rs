//! Throughput benchmarks for the AFSK codec.
//!
//! The demodulator must process a receive buffer far faster than real
//! time, or the half-duplex turnaround budget is eaten by DSP instead of
//! the wire.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tonelink_afsk::{AfskParams, Demodulator, Modulator};

fn bench_modulate(c: &mut Criterion) {
    let params = AfskParams::default();
    let mut modulator = Modulator::new(params);
    let payload = vec![0x5Au8; 64];

    c.bench_function("modulate_64_bytes", |b| {
        b.iter(|| modulator.modulate(black_box(&payload)))
    });
}

fn bench_demodulate(c: &mut Criterion) {
    let params = AfskParams::default();
    let mut modulator = Modulator::new(params);
    let demodulator = Demodulator::new(params);
    let samples = modulator.modulate(&vec![0x5Au8; 64]);

    c.bench_function("demodulate_64_bytes", |b| {
        b.iter(|| demodulator.demodulate_bits(black_box(&samples)))
    });
}

criterion_group!(benches, bench_modulate, bench_demodulate);
criterion_main!(benches);
