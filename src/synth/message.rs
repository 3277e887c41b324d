#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{
    engine::AudioEngine,
    error::SynthError,
    synth::{params::ParamChange, poly::PolySynth},
};

/// Commands for the synth from another thread (input, UI).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8 },
    NoteOff { note: u8 },
    SetParam(ParamChange),
    AllNotesOff,
    Panic,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Run one message against the synth.
pub fn dispatch<E: AudioEngine>(
    synth: &mut PolySynth<E>,
    message: SynthMessage,
) -> Result<(), SynthError> {
    match message {
        SynthMessage::NoteOn { note } => synth.note_on(note),
        SynthMessage::NoteOff { note } => synth.note_off(note),
        SynthMessage::SetParam(change) => synth.set_parameter(change).map(|_| ()),
        SynthMessage::AllNotesOff => synth.all_notes_off(),
        SynthMessage::Panic => {
            synth.panic();
            Ok(())
        }
    }
}

/// Dispatch everything waiting in `rx`, then service pending teardowns.
/// Failures are logged and do not stop the drain. Returns how many messages
/// were handled.
pub fn drain<E: AudioEngine, R: MessageReceiver + ?Sized>(
    synth: &mut PolySynth<E>,
    rx: &mut R,
) -> usize {
    let mut handled = 0;
    while let Some(message) = rx.pop() {
        if let Err(err) = dispatch(synth, message) {
            log::warn!("{message:?} failed: {err}");
        }
        handled += 1;
    }
    synth.service();
    handled
}
