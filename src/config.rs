//! Construction-time configuration for the synth and the in-process engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::synth::params::Settings;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    /// Settings the parameter store starts from. Out-of-range values are clamped.
    pub settings: Settings,

    /// Extra engine time (seconds) between the end of a release ramp and the
    /// teardown of its chain.
    pub teardown_margin: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            teardown_margin: 0.02,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,

    /// Upper bound on live nodes, excluding the destination.
    pub max_nodes: usize,

    /// Samples of output history kept for the scope tap.
    pub scope_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_nodes: 512,
            scope_len: 2048,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }
}
