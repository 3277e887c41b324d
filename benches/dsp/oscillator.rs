//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keysynth::dsp::{Oscillator, Waveform};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for waveform in Waveform::ALL {
            let mut osc = Oscillator::new(waveform, 440.0);
            group.bench_with_input(BenchmarkId::new(waveform.as_str(), size), &size, |b, _| {
                b.iter(|| {
                    osc.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
                })
            });
        }
    }

    group.finish();
}
