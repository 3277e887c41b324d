use std::collections::HashMap;

use crate::synth::{note::NoteId, voice::VoiceChain};

/// Sounding chains, at most one per note.
///
/// A chain leaves the registry the moment its release is scheduled; from then
/// on it is owned by its pending teardown task.
#[derive(Debug, Default)]
pub struct VoiceRegistry {
    voices: HashMap<NoteId, VoiceChain>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `chain` under its note, returning whatever was there before.
    pub fn insert(&mut self, chain: VoiceChain) -> Option<VoiceChain> {
        self.voices.insert(chain.note(), chain)
    }

    pub fn remove(&mut self, note: NoteId) -> Option<VoiceChain> {
        self.voices.remove(&note)
    }

    pub fn get(&self, note: NoteId) -> Option<&VoiceChain> {
        self.voices.get(&note)
    }

    pub fn contains(&self, note: NoteId) -> bool {
        self.voices.contains_key(&note)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoiceChain> {
        self.voices.values()
    }

    /// Sounding notes, lowest first.
    pub fn notes(&self) -> Vec<NoteId> {
        let mut notes: Vec<NoteId> = self.voices.keys().copied().collect();
        notes.sort_unstable();
        notes
    }

    pub fn drain(&mut self) -> impl Iterator<Item = VoiceChain> + '_ {
        self.voices.drain().map(|(_, chain)| chain)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
