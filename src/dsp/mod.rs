//! Low-level DSP primitives used by the in-process engine.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! so engine nodes can embed them directly. They stay focused on the
//! signal-processing math; wiring and scheduling live in [`crate::engine`].

/// Scheduled parameter curves (set, linear ramp, exponential approach).
pub mod automation;
/// State-variable filter with low-pass and high-pass responses.
pub mod filter;
/// Periodic waveforms and the phase-accumulating oscillator.
pub mod oscillator;

pub use automation::{AutomationEvent, ParamTimeline};
pub use filter::{FilterType, SVFilter, BUTTERWORTH_Q};
pub use oscillator::{Oscillator, Waveform};
