//! The rendering engine the voice core programs.
//!
//! The core never renders audio itself. It builds and rewires nodes, and
//! schedules parameter automation against the engine clock, through the
//! [`AudioEngine`] trait. [`GraphEngine`] is the in-process implementation
//! used by the binary and by the tests.

pub mod graph;
mod node;
pub mod tap;

use std::fmt;

use thiserror::Error;

pub use crate::dsp::{AutomationEvent, FilterType, Waveform};
pub use graph::GraphEngine;

/// Handle to a node owned by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created but not yet rendering, or paused. The clock is frozen.
    Suspended,
    Running,
    /// Permanently shut down; cannot be resumed.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("audio engine is closed")]
    Closed,

    #[error("node limit of {limit} reached")]
    NodeLimit { limit: usize },

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is not a gain stage")]
    NotAGain(NodeId),

    #[error("node {0} is not a filter stage")]
    NotAFilter(NodeId),

    #[error("node {0} is not an oscillator")]
    NotAnOscillator(NodeId),

    #[error("connecting {from} to {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },
}

/// Operations the voice core needs from a rendering engine.
///
/// Times are seconds on the engine's own monotonic clock
/// ([`AudioEngine::current_time`]). Scheduling never blocks on rendering.
pub trait AudioEngine {
    fn state(&self) -> EngineState;

    /// Start (or restart) rendering. Fails if the engine is closed.
    fn resume(&mut self) -> Result<(), EngineError>;

    fn current_time(&self) -> f64;

    /// Final output node. Everything audible is connected into it.
    fn destination(&self) -> NodeId;

    /// Periodic generator with a fixed frequency. Silent until started.
    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32)
        -> Result<NodeId, EngineError>;

    fn create_filter(
        &mut self,
        filter_type: FilterType,
        cutoff_hz: f32,
        q: f32,
    ) -> Result<NodeId, EngineError>;

    fn create_gain(&mut self, value: f32) -> Result<NodeId, EngineError>;

    /// Route the output of `from` into `to`.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError>;

    /// Detach `node` from the graph and release it.
    fn disconnect(&mut self, node: NodeId) -> Result<(), EngineError>;

    fn start(&mut self, oscillator: NodeId, at: f64) -> Result<(), EngineError>;

    fn stop(&mut self, oscillator: NodeId, at: f64) -> Result<(), EngineError>;

    /// Change a filter's cutoff immediately.
    fn set_filter_cutoff(&mut self, filter: NodeId, cutoff_hz: f32) -> Result<(), EngineError>;

    fn schedule_gain(&mut self, gain: NodeId, event: AutomationEvent) -> Result<(), EngineError>;

    /// Rewrite the gain's automation from the current time on: drop what is
    /// scheduled, pin the gain at `from` (at its live value when `None`) and
    /// ramp linearly to `target` over `duration` seconds.
    ///
    /// This is a single step as far as rendering is concerned. No block is
    /// ever rendered from a curve that has been cancelled but not yet held,
    /// so a ramp that was in flight never drops back to an older set point.
    /// Returns the engine time the new ramp starts.
    fn ramp_gain_from_now(
        &mut self,
        gain: NodeId,
        from: Option<f32>,
        target: f32,
        duration: f64,
    ) -> Result<f64, EngineError>;

    /// Current instantaneous gain value.
    fn gain_value(&self, gain: NodeId) -> Result<f32, EngineError>;

    /// Copy the most recent output samples into `out`, oldest first.
    /// Returns how many samples were written.
    fn read_tap(&self, out: &mut [f32]) -> usize;
}
