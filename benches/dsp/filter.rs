//! Benchmarks for the state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keysynth::dsp::{FilterType, SVFilter, BUTTERWORTH_Q};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Sawtooth-like ramp as test signal
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let mut filter = SVFilter::new(FilterType::LowPass, 1000.0, BUTTERWORTH_Q);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });

        let mut filter = SVFilter::new(FilterType::HighPass, 1000.0, BUTTERWORTH_Q);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("highpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), black_box(SAMPLE_RATE));
            })
        });
    }

    group.finish();
}
