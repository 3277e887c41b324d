//! Voice management: one independent signal chain per sounding note, kept
//! consistent under overlapping note events and live parameter changes.
//!
//! [`PolySynth`] is the entry point. The pieces it coordinates are usable on
//! their own against any [`AudioEngine`](crate::engine::AudioEngine).

pub mod envelope;
pub mod factory;
pub mod message;
pub mod note;
pub mod params;
pub mod poly;
pub mod propagator;
pub mod registry;
pub mod scheduler;
pub mod voice;

pub use envelope::{EnvelopeController, PEAK_LEVEL};
pub use factory::SignalChainFactory;
pub use message::{dispatch, drain, MessageReceiver, SynthMessage};
pub use note::NoteId;
pub use params::{Param, ParamChange, ParamValue, ParameterStore, Settings};
pub use poly::PolySynth;
pub use propagator::{LiveParameterPropagator, MASTER_TIME_CONSTANT};
pub use registry::VoiceRegistry;
pub use scheduler::Scheduler;
pub use voice::{ChainId, FilterStage, VoiceChain};
