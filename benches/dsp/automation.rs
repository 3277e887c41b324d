//! Benchmarks for gain automation evaluation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keysynth::dsp::{AutomationEvent, ParamTimeline};

use crate::BLOCK_SIZES;

const DT: f64 = 1.0 / 48_000.0;

pub fn bench_automation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/automation");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack ramp followed by a held value: the common voice gain shape.
        let mut envelope = ParamTimeline::new(0.0);
        envelope.schedule(AutomationEvent::SetValue { value: 0.0, time: 0.0 });
        envelope.schedule(AutomationEvent::LinearRamp {
            value: 0.3,
            end_time: 0.05,
        });
        group.bench_with_input(BenchmarkId::new("ramp", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = envelope.value_at(black_box(0.01 + i as f64 * DT));
                }
            })
        });

        // Master gain: a stack of SetTarget retargets from volume changes.
        let mut master = ParamTimeline::new(0.5);
        for step in 0..8 {
            master.schedule(AutomationEvent::SetTarget {
                target: 0.2 + 0.1 * step as f32,
                start_time: step as f64 * 0.01,
                time_constant: 0.1,
            });
        }
        group.bench_with_input(BenchmarkId::new("set_target", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    *sample = master.value_at(black_box(0.1 + i as f64 * DT));
                }
            })
        });
    }

    group.finish();
}
