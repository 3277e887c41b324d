use keysynth::{
    dsp::Waveform,
    synth::{note, FilterStage, NoteId, PEAK_LEVEL},
    AudioEngine, EngineConfig, GraphEngine, ParamChange, PolySynth, Settings, SynthConfig,
};

const SAMPLE_RATE: f32 = 48_000.0;
/// 1 ms blocks, so teardown timing is observable to within a millisecond.
const BLOCK: usize = 48;
const BLOCK_SECONDS: f64 = BLOCK as f64 / SAMPLE_RATE as f64;

fn synth_with(settings: Settings) -> PolySynth<GraphEngine> {
    PolySynth::new(
        GraphEngine::new(EngineConfig::with_sample_rate(SAMPLE_RATE)),
        SynthConfig {
            settings,
            ..SynthConfig::default()
        },
    )
}

fn synth() -> PolySynth<GraphEngine> {
    synth_with(Settings::default())
}

fn id(midi: u8) -> NoteId {
    NoteId::from_midi(midi).unwrap()
}

/// Render `seconds` in small blocks, servicing teardowns between blocks the
/// way a host loop would.
fn advance(synth: &mut PolySynth<GraphEngine>, seconds: f64) {
    let mut block = [0.0f32; BLOCK];
    let blocks = (seconds / BLOCK_SECONDS).round() as usize;
    for _ in 0..blocks {
        synth.engine().render_block(&mut block);
        synth.service();
    }
}

#[test]
fn one_chain_per_note_after_retrigger() {
    let mut synth = synth();
    synth.note_on(note::C4).unwrap();
    assert_eq!(synth.sounding_count(), 1);
    let first = synth.voice(id(note::C4)).unwrap().id();

    synth.note_on(note::C4).unwrap();
    assert_eq!(synth.sounding_count(), 1);
    assert_eq!(synth.active_notes(), vec![id(note::C4)]);

    // The first chain was released, not dropped on the floor.
    assert_ne!(synth.voice(id(note::C4)).unwrap().id(), first);
    assert_eq!(synth.releasing_count(), 1);
    assert_eq!(synth.releasing().next().unwrap().1.id(), first);
}

#[test]
fn note_off_for_silent_note_is_a_no_op() {
    let mut synth = synth();
    synth.note_on(note::E4).unwrap();
    let nodes = synth.engine().node_count();

    synth.note_off(note::G4).unwrap();

    assert_eq!(synth.sounding_count(), 1);
    assert_eq!(synth.releasing_count(), 0);
    assert_eq!(synth.engine().node_count(), nodes);
}

#[test]
fn teardown_lands_between_release_and_margin() {
    let mut synth = synth();
    let release = synth.snapshot().release_seconds as f64;
    let margin = synth.config().teardown_margin;

    synth.note_on(note::A4).unwrap();
    advance(&mut synth, 0.1);

    let off_at = synth.engine().current_time();
    synth.note_off(note::A4).unwrap();
    assert!(synth.voice(id(note::A4)).is_none(), "entry removed at note_off");
    assert_eq!(synth.releasing_count(), 1);

    let mut torn_down_at = None;
    for _ in 0..2_000 {
        advance(&mut synth, BLOCK_SECONDS);
        if synth.releasing_count() == 0 {
            torn_down_at = Some(synth.engine().current_time());
            break;
        }
    }

    let elapsed = torn_down_at.expect("chain was never torn down") - off_at;
    assert!(
        elapsed >= release && elapsed <= release + margin + BLOCK_SECONDS + 1e-9,
        "teardown {elapsed:.4}s after note_off, release {release}s, margin {margin}s"
    );
    // Only the master bus is left.
    assert_eq!(synth.engine().node_count(), 1);
}

#[test]
fn stale_teardown_spares_the_new_chain() {
    let mut synth = synth();
    synth.note_on(note::G4).unwrap();
    advance(&mut synth, 0.05);
    synth.note_off(note::G4).unwrap();
    advance(&mut synth, 0.05);
    synth.note_on(note::G4).unwrap();

    let fresh = synth.voice(id(note::G4)).unwrap().clone();
    assert_eq!(synth.sounding_count(), 1);

    // Past the first chain's teardown.
    advance(&mut synth, 0.5);

    assert_eq!(synth.releasing_count(), 0);
    assert_eq!(synth.sounding_count(), 1);
    let live = synth.voice(id(note::G4)).unwrap();
    assert_eq!(live.id(), fresh.id());
    for node in fresh.nodes() {
        assert!(synth.engine().contains(node), "{node} of the new chain was freed");
    }
    // Master + exactly one chain.
    assert_eq!(synth.engine().node_count(), 5);
}

#[test]
fn master_volume_is_clamped() {
    let mut synth = synth();
    assert_eq!(
        synth.set_parameter(ParamChange::MasterVolume(1.5)).unwrap(),
        ParamChange::MasterVolume(1.0)
    );
    assert_eq!(synth.snapshot().master_volume, 1.0);

    synth.set_parameter(ParamChange::MasterVolume(-3.0)).unwrap();
    assert_eq!(synth.snapshot().master_volume, 0.0);
}

#[test]
fn filter_change_reaches_sounding_chains_only() {
    let mut synth = synth();
    synth.note_on(note::C4).unwrap();
    synth.note_on(note::E4).unwrap();
    synth.note_on(note::G4).unwrap();
    advance(&mut synth, 0.02);
    synth.note_off(note::G4).unwrap();

    let gains_before: Vec<_> = [note::C4, note::E4]
        .iter()
        .map(|&n| {
            let gain = synth.voice(id(n)).unwrap().gain();
            synth.engine().pending_gain_events(gain).unwrap()
        })
        .collect();

    synth.set_parameter(ParamChange::LowCutoffHz(750.0)).unwrap();
    synth.set_parameter(ParamChange::HighCutoffHz(120.0)).unwrap();

    for (i, &n) in [note::C4, note::E4].iter().enumerate() {
        let chain = synth.voice(id(n)).unwrap();
        let engine = synth.engine();
        assert_eq!(engine.filter_cutoff(chain.filter(FilterStage::LowPass)).unwrap(), 750.0);
        assert_eq!(engine.filter_cutoff(chain.filter(FilterStage::HighPass)).unwrap(), 120.0);
        assert_eq!(
            engine.pending_gain_events(chain.gain()).unwrap(),
            gains_before[i],
            "gain automation of {n} changed"
        );
    }

    // The releasing G4 keeps the cutoff it was built with.
    let (_, releasing) = synth.releasing().next().unwrap();
    assert_eq!(
        synth
            .engine()
            .filter_cutoff(releasing.filter(FilterStage::LowPass))
            .unwrap(),
        Settings::default().low_cutoff_hz
    );
}

#[test]
fn waveform_change_applies_to_next_note() {
    let mut synth = synth();
    synth.note_on(note::C4).unwrap();
    synth
        .set_parameter(ParamChange::Waveform(Waveform::Sawtooth))
        .unwrap();
    synth.note_on(note::D4).unwrap();

    assert_eq!(synth.voice(id(note::C4)).unwrap().waveform(), Waveform::Sine);
    assert_eq!(synth.voice(id(note::D4)).unwrap().waveform(), Waveform::Sawtooth);
}

#[test]
fn release_mid_attack_starts_from_live_gain() {
    let mut synth = synth_with(Settings {
        attack_seconds: 0.1,
        release_seconds: 0.5,
        ..Settings::default()
    });

    synth.note_on(note::A4).unwrap();
    let chain = synth.voice(id(note::A4)).unwrap().clone();
    assert_eq!(chain.created_at(), 0.0);

    let engine = synth.engine();
    assert_eq!(engine.gain_value_at(chain.gain(), 0.0).unwrap(), 0.0);
    assert!((engine.gain_value_at(chain.gain(), 0.1).unwrap() - PEAK_LEVEL).abs() < 1e-6);

    advance(&mut synth, 0.05);
    synth.note_off(note::A4).unwrap();
    assert!(synth.voice(id(note::A4)).is_none());

    let engine = synth.engine();
    let start = engine.gain_value(chain.gain()).unwrap();
    assert!((start - 0.15).abs() < 1e-3, "release began at {start}, not ~0.15");

    let mid = engine.gain_value_at(chain.gain(), 0.3).unwrap();
    assert!((mid - 0.075).abs() < 1e-3, "mid-release gain {mid}");
    assert!(engine.gain_value_at(chain.gain(), 0.55).unwrap().abs() < 1e-6);

    // Monotonic fall: no snap back to 0 followed by a climb.
    let mut last = start;
    for step in 1..=50 {
        let t = 0.05 + step as f64 * 0.01;
        let v = engine.gain_value_at(chain.gain(), t).unwrap();
        assert!(v <= last + 1e-6, "gain rose from {last} to {v} at {t:.2}s");
        last = v;
    }

    let (due, _) = synth.releasing().next().unwrap();
    assert!((due - (0.55 + synth.config().teardown_margin)).abs() < 1e-6);
}

#[test]
fn zero_release_silences_immediately() {
    let mut synth = synth_with(Settings {
        release_seconds: 0.0,
        ..Settings::default()
    });
    synth.note_on(note::B4).unwrap();
    advance(&mut synth, 0.1);

    let gain = synth.voice(id(note::B4)).unwrap().gain();
    synth.note_off(note::B4).unwrap();
    assert_eq!(synth.engine().gain_value(gain).unwrap(), 0.0);

    let margin = synth.config().teardown_margin;
    advance(&mut synth, margin + BLOCK_SECONDS);
    assert_eq!(synth.releasing_count(), 0);
    assert!(!synth.engine().contains(gain));
}

#[test]
fn rapid_retrigger_never_double_frees() {
    let mut synth = synth();
    for _ in 0..10 {
        synth.note_on(note::F4).unwrap();
        advance(&mut synth, 0.01);
        synth.note_off(note::F4).unwrap();
    }
    synth.note_on(note::F4).unwrap();
    let survivor = synth.voice(id(note::F4)).unwrap().id();

    advance(&mut synth, 1.0);

    assert_eq!(synth.releasing_count(), 0);
    assert_eq!(synth.voice(id(note::F4)).unwrap().id(), survivor);
    assert_eq!(synth.engine().node_count(), 5);
}

#[test]
fn envelope_changes_apply_to_next_envelope() {
    let mut synth = synth();
    synth.set_parameter(ParamChange::AttackSeconds(0.2)).unwrap();
    synth.note_on(note::C5).unwrap();

    let gain = synth.voice(id(note::C5)).unwrap().gain();
    let half = synth.engine().gain_value_at(gain, 0.1).unwrap();
    assert!((half - PEAK_LEVEL / 2.0).abs() < 1e-5, "half-way gain {half}");
}
