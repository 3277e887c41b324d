//! Scenario benchmarks.
//!
//! Chords rendered through the in-process engine, and the control-side cost
//! of building and tearing down voices.

mod voices;

pub use voices::{bench_churn, bench_voices};
