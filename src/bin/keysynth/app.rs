//! keysynth - audio setup and the main loop

use std::{
    io::stdout,
    sync::{atomic::Ordering, Arc},
    thread,
    time::Duration,
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat,
};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::DefaultTerminal;

use keysynth::{
    engine::{AudioEngine, EngineState},
    synth::{drain, SynthMessage},
    EngineConfig, GraphEngine, PolySynth, SynthConfig, MAX_BLOCK_SIZE,
};

use super::{
    input::{self, Keymap, Shared},
    ui::{self, View, SCOPE_LEN},
};

const FRAME: Duration = Duration::from_millis(16);
const QUEUE_LEN: usize = 256;

pub struct App {
    config: SynthConfig,
}

impl App {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    /// Open the default output device, then run the UI until quit.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(eyre!(
                "output device wants {:?} samples, only f32 is supported",
                supported.sample_format()
            ));
        }

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        log::info!("output: {sample_rate} Hz, {channels} channels");

        let engine = GraphEngine::new(EngineConfig::with_sample_rate(sample_rate));

        // The callback renders mono from its own engine handle and copies it
        // to every channel.
        let render = engine.clone();
        let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device.build_output_stream(
            &supported.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut mono[..frames];
                    render.render_block(block);

                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }
                    frames_written += frames;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let synth = PolySynth::new(engine, self.config);

        let mut terminal = ratatui::init();
        let release_events = supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = run_loop(&mut terminal, synth, release_events);

        if release_events {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();
        result
    }
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    mut synth: PolySynth<GraphEngine>,
    release_events: bool,
) -> EyreResult<()> {
    let (tx, mut rx) = rtrb::RingBuffer::<SynthMessage>::new(QUEUE_LEN);
    let shared = Arc::new(Shared::new(release_events));
    let keymap = Keymap::new(synth.snapshot(), release_events);
    let input = input::spawn(keymap, tx, shared.clone());

    let sample_rate = synth.engine().sample_rate();
    let mut scope = vec![0.0f32; SCOPE_LEN];

    while !shared.quit.load(Ordering::Relaxed) {
        drain(&mut synth, &mut rx);

        let written = synth.read_scope(&mut scope);
        let view = View {
            settings: synth.snapshot(),
            active_notes: synth.active_notes(),
            releasing: synth.releasing_count(),
            nodes: synth.engine().node_count(),
            octave: shared.octave.load(Ordering::Relaxed),
            sample_rate,
            engine_state: match synth.engine().state() {
                EngineState::Suspended => "suspended",
                EngineState::Running => "running",
                EngineState::Closed => "closed",
            },
            release_events,
            scope: &scope[..written],
        };

        if let Err(err) = terminal.draw(|frame| ui::render(frame, &view)) {
            shared.quit.store(true, Ordering::Relaxed);
            return Err(err).wrap_err("failed to draw");
        }
        thread::sleep(FRAME);
    }

    // Let the input thread's final messages land, then silence everything.
    drain(&mut synth, &mut rx);
    synth.panic();
    synth.engine().close();

    input
        .join()
        .map_err(|_| eyre!("input thread panicked"))?
        .wrap_err("input thread failed")
}
