pub mod config; // Construction-time settings
pub mod dsp; // Oscillator, filter and automation primitives
pub mod engine; // Engine contract and the in-process render graph
pub mod error;
pub mod synth; // Voice management and polyphony

pub use config::{EngineConfig, SynthConfig};
pub use engine::{AudioEngine, EngineError, EngineState, GraphEngine, NodeId};
pub use error::SynthError;
pub use synth::{NoteId, ParamChange, PolySynth, Settings, SynthMessage};

pub const MAX_BLOCK_SIZE: usize = 2048;
