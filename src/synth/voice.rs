use std::fmt;

use crate::{dsp::Waveform, engine::NodeId, synth::note::NoteId};

/// Identity of one built chain. Never reused, so two chains for the same
/// note are always distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub(crate) u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain-{}", self.0)
    }
}

/// Which filter stage of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStage {
    LowPass,
    HighPass,
}

/// One sounding note's signal path:
/// generator → low-pass → high-pass → gain → mix bus.
///
/// The generator's waveform and frequency are fixed for the chain's lifetime.
/// Only the filter cutoffs and the gain change after it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceChain {
    pub(crate) id: ChainId,
    pub(crate) note: NoteId,
    pub(crate) waveform: Waveform,
    pub(crate) frequency: f32,
    pub(crate) generator: NodeId,
    pub(crate) lowpass: NodeId,
    pub(crate) highpass: NodeId,
    pub(crate) gain: NodeId,
    pub(crate) created_at: f64,
}

impl VoiceChain {
    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn note(&self) -> NoteId {
        self.note
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn generator(&self) -> NodeId {
        self.generator
    }

    pub fn filter(&self, stage: FilterStage) -> NodeId {
        match stage {
            FilterStage::LowPass => self.lowpass,
            FilterStage::HighPass => self.highpass,
        }
    }

    pub fn gain(&self) -> NodeId {
        self.gain
    }

    /// Engine time the chain was built and its generator started.
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Every engine node the chain owns, source first.
    pub fn nodes(&self) -> [NodeId; 4] {
        [self.generator, self.lowpass, self.highpass, self.gain]
    }
}
