use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use thiserror::Error;

/*
Periodic Oscillator
===================

A phase accumulator walks around the unit interval once per period. Each
waveform is a different function of that phase:

  phase       0.0 ──────────────── 1.0

  sine        sin(2π·phase)
  square      +1 for the first half, -1 for the second
  sawtooth    2·phase - 1            (rises, then snaps back)
  triangle    1 - 4·|phase - 0.5|    (rises, then falls)

The increment per sample is `frequency / sample_rate`. A voice's frequency
never changes after it is built, so the increment is computed once per block.

These are the naive (non band-limited) shapes. Above a few kHz the square and
sawtooth alias, which is acceptable for a playable keyboard range.
*/

/// Shape of the periodic generator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// Value of the waveform at `phase` (0.0..1.0).
    #[inline]
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown waveform '{0}'")]
pub struct UnknownWaveform(pub String);

impl FromStr for Waveform {
    type Err = UnknownWaveform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            _ => Err(UnknownWaveform(s.to_string())),
        }
    }
}

/// Phase-accumulating oscillator with a fixed frequency.
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    #[inline]
    pub fn next_sample(&mut self, increment: f32) -> f32 {
        let value = self.waveform.sample(self.phase);
        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        value
    }

    /// Fill `buffer` with consecutive samples.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let increment = self.frequency / sample_rate;
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(increment);
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}
