#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::Waveform;

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;
pub const MAX_ENVELOPE_SECONDS: f32 = 30.0;

/// Live synth settings. Every voice operation reads a copy of these.
///
/// `low_cutoff_hz` drives the low-pass stage and `high_cutoff_hz` the
/// high-pass stage. The two are clamped independently; a high-pass cutoff
/// above the low-pass cutoff is allowed and mostly silences the voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub waveform: Waveform,
    pub low_cutoff_hz: f32,
    pub high_cutoff_hz: f32,
    pub attack_seconds: f32,
    pub release_seconds: f32,
    pub master_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            low_cutoff_hz: 5_000.0,
            high_cutoff_hz: 20.0,
            attack_seconds: 0.05,
            release_seconds: 0.3,
            master_volume: 0.5,
        }
    }
}

/// A settings field, for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Waveform,
    LowCutoffHz,
    HighCutoffHz,
    AttackSeconds,
    ReleaseSeconds,
    MasterVolume,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Waveform(Waveform),
    Number(f32),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            ParamValue::Number(value) => Some(*value),
            ParamValue::Waveform(_) => None,
        }
    }

    pub fn as_waveform(&self) -> Option<Waveform> {
        match self {
            ParamValue::Waveform(waveform) => Some(*waveform),
            ParamValue::Number(_) => None,
        }
    }
}

/// A settings field together with its new value, for writes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    Waveform(Waveform),
    LowCutoffHz(f32),
    HighCutoffHz(f32),
    AttackSeconds(f32),
    ReleaseSeconds(f32),
    MasterVolume(f32),
}

impl ParamChange {
    pub fn param(&self) -> Param {
        match self {
            ParamChange::Waveform(_) => Param::Waveform,
            ParamChange::LowCutoffHz(_) => Param::LowCutoffHz,
            ParamChange::HighCutoffHz(_) => Param::HighCutoffHz,
            ParamChange::AttackSeconds(_) => Param::AttackSeconds,
            ParamChange::ReleaseSeconds(_) => Param::ReleaseSeconds,
            ParamChange::MasterVolume(_) => Param::MasterVolume,
        }
    }

    /// The same change with its value forced into the field's domain.
    pub fn clamped(self) -> Self {
        match self {
            ParamChange::Waveform(w) => ParamChange::Waveform(w),
            ParamChange::LowCutoffHz(hz) => {
                ParamChange::LowCutoffHz(clamp(hz, MIN_CUTOFF_HZ, MAX_CUTOFF_HZ))
            }
            ParamChange::HighCutoffHz(hz) => {
                ParamChange::HighCutoffHz(clamp(hz, MIN_CUTOFF_HZ, MAX_CUTOFF_HZ))
            }
            ParamChange::AttackSeconds(s) => {
                ParamChange::AttackSeconds(clamp(s, 0.0, MAX_ENVELOPE_SECONDS))
            }
            ParamChange::ReleaseSeconds(s) => {
                ParamChange::ReleaseSeconds(clamp(s, 0.0, MAX_ENVELOPE_SECONDS))
            }
            ParamChange::MasterVolume(v) => ParamChange::MasterVolume(clamp(v, 0.0, 1.0)),
        }
    }
}

/// NaN takes the lower bound; infinities land on the nearest bound.
#[inline]
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Owner of the current settings. Stores values and nothing else; pushing
/// changes into sounding voices is the propagator's job.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    settings: Settings,
}

impl ParameterStore {
    pub fn new(initial: Settings) -> Self {
        let mut store = Self::default();
        for change in [
            ParamChange::Waveform(initial.waveform),
            ParamChange::LowCutoffHz(initial.low_cutoff_hz),
            ParamChange::HighCutoffHz(initial.high_cutoff_hz),
            ParamChange::AttackSeconds(initial.attack_seconds),
            ParamChange::ReleaseSeconds(initial.release_seconds),
            ParamChange::MasterVolume(initial.master_volume),
        ] {
            store.set(change);
        }
        store
    }

    /// Clamp and store. Returns the change as stored.
    pub fn set(&mut self, change: ParamChange) -> ParamChange {
        let change = change.clamped();
        let s = &mut self.settings;
        match change {
            ParamChange::Waveform(w) => s.waveform = w,
            ParamChange::LowCutoffHz(hz) => s.low_cutoff_hz = hz,
            ParamChange::HighCutoffHz(hz) => s.high_cutoff_hz = hz,
            ParamChange::AttackSeconds(secs) => s.attack_seconds = secs,
            ParamChange::ReleaseSeconds(secs) => s.release_seconds = secs,
            ParamChange::MasterVolume(v) => s.master_volume = v,
        }
        change
    }

    pub fn get(&self, param: Param) -> ParamValue {
        let s = &self.settings;
        match param {
            Param::Waveform => ParamValue::Waveform(s.waveform),
            Param::LowCutoffHz => ParamValue::Number(s.low_cutoff_hz),
            Param::HighCutoffHz => ParamValue::Number(s.high_cutoff_hz),
            Param::AttackSeconds => ParamValue::Number(s.attack_seconds),
            Param::ReleaseSeconds => ParamValue::Number(s.release_seconds),
            Param::MasterVolume => ParamValue::Number(s.master_volume),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.settings
    }
}
