use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type      | passes       | rejects      |
| --------- | ------------ | ------------ |
| low-pass  | below cutoff | above cutoff |
| high-pass | above cutoff | below cutoff |

A voice runs its generator through a low-pass stage then a high-pass stage.
With the high-pass cutoff below the low-pass cutoff the pair behaves as a
band-pass. Nothing stops the cutoffs from crossing, in which case the pair
rejects almost everything.

Q is the stage's resonance. At Q = 1/√2 the response is maximally flat
(Butterworth): no peak at the cutoff, -3 dB at the cutoff itself.
*/

/// Maximally flat response.
pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

/// Topology-preserving-transform state-variable filter.
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub q: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, q: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            q,
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, BUTTERWORTH_Q)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz, BUTTERWORTH_Q)
    }

    #[inline]
    fn compute_g(&self, sample_rate: f32) -> f32 {
        // tan() diverges at Nyquist
        let cutoff = self.cutoff_hz.clamp(1.0, sample_rate * 0.49);
        (PI * cutoff / sample_rate).tan()
    }

    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let g = self.compute_g(sample_rate);
        let k = 1.0 / self.q.max(0.01);

        for sample in buffer.iter_mut() {
            let outputs = self.next_sample(*sample, k, g);

            *sample = match self.filter_type {
                FilterType::LowPass => outputs.lowpass,
                FilterType::HighPass => outputs.highpass,
            }
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }
}
