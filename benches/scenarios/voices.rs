//! Benchmarks for whole voice graphs.
//!
//! Every voice is a full chain (oscillator → low-pass → high-pass → gain)
//! feeding the master bus, rendered the way the audio callback renders it.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keysynth::{
    dsp::Waveform, synth::note, EngineConfig, GraphEngine, ParamChange, PolySynth, Settings,
    SynthConfig,
};

use crate::BLOCK_SIZES;

const CHORD: [u8; 8] = [
    note::C4,
    note::E4,
    note::G4,
    note::B4,
    note::D5,
    note::F5,
    note::A5,
    note::C6,
];

fn new_synth(waveform: Waveform) -> PolySynth<GraphEngine> {
    PolySynth::new(
        GraphEngine::new(EngineConfig::default()),
        SynthConfig {
            settings: Settings {
                waveform,
                ..Settings::default()
            },
            ..SynthConfig::default()
        },
    )
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for voices in [1usize, 4, 8] {
            let mut synth = new_synth(Waveform::Sawtooth);
            for &n in &CHORD[..voices] {
                let _ = synth.note_on(n);
            }
            let id = format!("sawtooth_x{voices}");
            group.bench_with_input(BenchmarkId::new(id, size), &size, |b, _| {
                b.iter(|| {
                    synth.engine().render_block(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}

/// Control-side cost: build a chain, release it, free it.
pub fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/churn");

    let mut synth = new_synth(Waveform::Sine);
    group.bench_function("note_on_off_panic", |b| {
        b.iter(|| {
            let _ = synth.note_on(black_box(note::A4));
            let _ = synth.note_off(black_box(note::A4));
            synth.panic();
        })
    });

    let mut synth = new_synth(Waveform::Sine);
    for &n in &CHORD {
        let _ = synth.note_on(n);
    }
    group.bench_function("cutoff_sweep_8_voices", |b| {
        let mut hz = 200.0f32;
        b.iter(|| {
            hz = if hz > 10_000.0 { 200.0 } else { hz * 1.1 };
            let _ = synth.set_parameter(ParamChange::LowCutoffHz(black_box(hz)));
        })
    });

    group.finish();
}
