//! Computer keyboard → synth messages
//!
//! Runs on its own thread and talks to the synth only through the message
//! ring buffer.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rtrb::Producer;

use keysynth::{
    dsp::Waveform,
    synth::{note, ParamChange, ParameterStore, Settings, SynthMessage},
};

/// Note keys, one chromatic octave from C plus the next C.
const NOTE_KEYS: [char; 13] = [
    'a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k',
];

pub const MIN_OCTAVE: u8 = 3;
pub const MAX_OCTAVE: u8 = 5;
pub const DEFAULT_OCTAVE: u8 = 4;

/// How long a note is held without key events when the terminal cannot
/// report key releases. Longer than the usual auto-repeat delay, so a held
/// key keeps its note alive.
pub const HOLD_TIMEOUT: Duration = Duration::from_millis(550);

const CUTOFF_STEP: f32 = 1.25;
const TIME_STEP: f32 = 0.05;
const VOLUME_STEP: f32 = 0.05;

/// State shared between the input thread and the UI loop.
pub struct Shared {
    pub quit: AtomicBool,
    pub octave: AtomicU8,
    /// Whether the terminal reports key releases.
    pub release_events: AtomicBool,
}

impl Shared {
    pub fn new(release_events: bool) -> Self {
        Self {
            quit: AtomicBool::new(false),
            octave: AtomicU8::new(DEFAULT_OCTAVE),
            release_events: AtomicBool::new(release_events),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Send(SynthMessage),
    Quit,
}

/// Key bindings plus the little state they need: the current octave, the
/// notes each key is holding, and a mirror of the synth's parameter store so
/// that relative steps can be turned into absolute, clamped values.
pub struct Keymap {
    octave: u8,
    release_events: bool,
    held: HashMap<char, (u8, Instant)>,
    store: ParameterStore,
}

impl Keymap {
    pub fn new(settings: Settings, release_events: bool) -> Self {
        Self {
            octave: DEFAULT_OCTAVE,
            release_events,
            held: HashMap::new(),
            store: ParameterStore::new(settings),
        }
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Action::Quit];
        }

        if let KeyCode::Char(c) = key.code {
            let c = c.to_ascii_lowercase();
            if let Some(offset) = NOTE_KEYS.iter().position(|&k| k == c) {
                return self.on_note_key(c, offset as u8, key.kind, now);
            }
        }

        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }

        let s = self.store.snapshot();

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => vec![Action::Quit],
            KeyCode::Char(' ') => {
                self.held.clear();
                vec![Action::Send(SynthMessage::AllNotesOff)]
            }
            KeyCode::Backspace => {
                self.held.clear();
                vec![Action::Send(SynthMessage::Panic)]
            }
            KeyCode::Char('z') => {
                self.octave = self.octave.saturating_sub(1).max(MIN_OCTAVE);
                Vec::new()
            }
            KeyCode::Char('x') => {
                self.octave = (self.octave + 1).min(MAX_OCTAVE);
                Vec::new()
            }
            KeyCode::Char(c @ '1'..='4') => {
                let waveform = Waveform::ALL[(c as u8 - b'1') as usize];
                self.change(ParamChange::Waveform(waveform))
            }
            KeyCode::Char('[') => self.change(ParamChange::LowCutoffHz(
                s.low_cutoff_hz / CUTOFF_STEP,
            )),
            KeyCode::Char(']') => self.change(ParamChange::LowCutoffHz(
                s.low_cutoff_hz * CUTOFF_STEP,
            )),
            KeyCode::Char(';') => self.change(ParamChange::HighCutoffHz(
                s.high_cutoff_hz / CUTOFF_STEP,
            )),
            KeyCode::Char('\'') => self.change(ParamChange::HighCutoffHz(
                s.high_cutoff_hz * CUTOFF_STEP,
            )),
            KeyCode::Char(',') => self.change(ParamChange::AttackSeconds(
                s.attack_seconds - TIME_STEP,
            )),
            KeyCode::Char('.') => self.change(ParamChange::AttackSeconds(
                s.attack_seconds + TIME_STEP,
            )),
            KeyCode::Char('<') => self.change(ParamChange::ReleaseSeconds(
                s.release_seconds - TIME_STEP,
            )),
            KeyCode::Char('>') => self.change(ParamChange::ReleaseSeconds(
                s.release_seconds + TIME_STEP,
            )),
            KeyCode::Char('-') => self.change(ParamChange::MasterVolume(
                s.master_volume - VOLUME_STEP,
            )),
            KeyCode::Char('=') => self.change(ParamChange::MasterVolume(
                s.master_volume + VOLUME_STEP,
            )),
            _ => Vec::new(),
        }
    }

    /// Note-offs for keys whose hold timed out. Only used when the terminal
    /// does not report releases.
    pub fn expired(&mut self, now: Instant) -> Vec<Action> {
        if self.release_events {
            return Vec::new();
        }
        let mut released = Vec::new();
        self.held.retain(|_, (midi, pressed)| {
            if now.duration_since(*pressed) >= HOLD_TIMEOUT {
                released.push(Action::Send(SynthMessage::NoteOff { note: *midi }));
                false
            } else {
                true
            }
        });
        released
    }

    fn on_note_key(&mut self, key: char, offset: u8, kind: KeyEventKind, now: Instant) -> Vec<Action> {
        match kind {
            KeyEventKind::Press => {
                if let Some((_, pressed)) = self.held.get_mut(&key) {
                    // Auto-repeat: keep the note alive, don't retrigger.
                    *pressed = now;
                    return Vec::new();
                }
                let midi = note::C3 + (self.octave - MIN_OCTAVE) * 12 + offset;
                self.held.insert(key, (midi, now));
                vec![Action::Send(SynthMessage::NoteOn { note: midi })]
            }
            KeyEventKind::Repeat => {
                if let Some((_, pressed)) = self.held.get_mut(&key) {
                    *pressed = now;
                }
                Vec::new()
            }
            KeyEventKind::Release => match self.held.remove(&key) {
                Some((midi, _)) => vec![Action::Send(SynthMessage::NoteOff { note: midi })],
                None => Vec::new(),
            },
        }
    }

    fn change(&mut self, change: ParamChange) -> Vec<Action> {
        let stored = self.store.set(change);
        vec![Action::Send(SynthMessage::SetParam(stored))]
    }
}

/// Spawn the input thread. It runs until a quit key is pressed or
/// `shared.quit` is set by someone else.
pub fn spawn(
    mut keymap: Keymap,
    mut tx: Producer<SynthMessage>,
    shared: Arc<Shared>,
) -> JoinHandle<std::io::Result<()>> {
    thread::spawn(move || {
        while !shared.quit.load(Ordering::Relaxed) {
            let mut actions = Vec::new();
            if event::poll(Duration::from_millis(10))? {
                if let Event::Key(key) = event::read()? {
                    actions.extend(keymap.on_key(key, Instant::now()));
                }
            }
            actions.extend(keymap.expired(Instant::now()));

            for action in actions {
                match action {
                    Action::Send(message) => {
                        if tx.push(message).is_err() {
                            log::warn!("message queue full, dropped {message:?}");
                        }
                    }
                    Action::Quit => {
                        let _ = tx.push(SynthMessage::AllNotesOff);
                        shared.quit.store(true, Ordering::Relaxed);
                    }
                }
            }
            shared.octave.store(keymap.octave(), Ordering::Relaxed);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn release(c: char) -> KeyEvent {
        KeyEvent::new_with_kind(KeyCode::Char(c), KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn note_keys_follow_octave() {
        let mut keymap = Keymap::new(Settings::default(), true);
        let now = Instant::now();

        assert_eq!(
            keymap.on_key(press('a'), now),
            vec![Action::Send(SynthMessage::NoteOn { note: note::C4 })]
        );
        keymap.on_key(press('x'), now);
        assert_eq!(
            keymap.on_key(press('k'), now),
            vec![Action::Send(SynthMessage::NoteOn { note: note::C6 })]
        );
        keymap.on_key(press('x'), now);
        assert_eq!(keymap.octave(), MAX_OCTAVE);
    }

    #[test]
    fn release_uses_note_from_press() {
        let mut keymap = Keymap::new(Settings::default(), true);
        let now = Instant::now();
        keymap.on_key(press('a'), now);
        keymap.on_key(press('z'), now);

        assert_eq!(
            keymap.on_key(release('a'), now),
            vec![Action::Send(SynthMessage::NoteOff { note: note::C4 })]
        );
    }

    #[test]
    fn held_notes_time_out_without_release_events() {
        let mut keymap = Keymap::new(Settings::default(), false);
        let start = Instant::now();
        keymap.on_key(press('d'), start);

        // A repeat refreshes the hold.
        let repeat = start + Duration::from_millis(400);
        assert!(keymap.on_key(press('d'), repeat).is_empty());
        assert!(keymap.expired(start + Duration::from_millis(600)).is_empty());

        assert_eq!(
            keymap.expired(repeat + HOLD_TIMEOUT),
            vec![Action::Send(SynthMessage::NoteOff { note: note::E4 })]
        );
    }

    #[test]
    fn parameter_steps_are_absolute_and_clamped() {
        let mut keymap = Keymap::new(Settings::default(), true);
        let now = Instant::now();

        let mut last = Vec::new();
        for _ in 0..20 {
            last = keymap.on_key(press('='), now);
        }
        assert_eq!(
            last,
            vec![Action::Send(SynthMessage::SetParam(ParamChange::MasterVolume(1.0)))]
        );
        assert_eq!(
            keymap.on_key(press('2'), now),
            vec![Action::Send(SynthMessage::SetParam(ParamChange::Waveform(
                Waveform::Square
            )))]
        );
    }

    #[test]
    fn steps_continue_from_the_clamped_value() {
        let mut keymap = Keymap::new(Settings::default(), true);
        let now = Instant::now();

        for _ in 0..40 {
            keymap.on_key(press(']'), now);
        }
        assert_eq!(
            keymap.on_key(press('['), now),
            vec![Action::Send(SynthMessage::SetParam(ParamChange::LowCutoffHz(
                20_000.0 / CUTOFF_STEP
            )))]
        );
    }
}
