use crate::{
    engine::{AudioEngine, EngineError},
    synth::voice::VoiceChain,
};

/// Gain every attack ramps up to.
pub const PEAK_LEVEL: f32 = 0.3;

/*
Attack / Release Scheduling
===========================

The envelope is two linear segments written into the chain's gain
automation; the engine renders them.

    gain
    0.3 ┤     ╱‾‾‾‾‾‾‾‾‾‾‾╲
        │    ╱             ╲
        │   ╱               ╲
      0 ┼──╱─────────────────╲────
          t0  t0+attack    now  now+release

Attack pins the gain at 0 and ramps to the peak:
    SetValue(0, t0), LinearRamp(peak, t0 + attack)

t0 is the chain's creation time. If the audio thread renders between the
build and the attack, t0 is the engine time the attack is written instead.
The gain has been 0 since creation, so the ramp always starts from silence.

Release may land in the middle of the attack ramp. Cancelling the scheduled
automation would snap the gain back to the last explicitly set value (0 at
t0), and ramping from there clicks. The live value has to be held first:

    v = gain(now)
    cancel(now); SetValue(v, now); LinearRamp(0, now + release)

The audio thread renders concurrently, so these steps are one engine call
(`ramp_gain_from_now`). Done as separate calls, a block rendered between the
cancel and the hold plays at 0.

The generator is told to stop where the ramp ends.
*/

/// Stateless: everything it needs lives in the chain and the engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeController;

impl EnvelopeController {
    /// Returns the engine time the ramp starts.
    pub fn attack<E: AudioEngine + ?Sized>(
        engine: &mut E,
        chain: &VoiceChain,
        attack_seconds: f32,
        peak: f32,
    ) -> Result<f64, EngineError> {
        engine.ramp_gain_from_now(chain.gain(), Some(0.0), peak, attack_seconds.max(0.0) as f64)
    }

    /// Ramp the chain to silence. Returns the engine time the ramp ends.
    pub fn release<E: AudioEngine + ?Sized>(
        engine: &mut E,
        chain: &VoiceChain,
        release_seconds: f32,
    ) -> Result<f64, EngineError> {
        let release = release_seconds.max(0.0) as f64;
        let start = engine.ramp_gain_from_now(chain.gain(), None, 0.0, release)?;
        let end = start + release;
        engine.stop(chain.generator(), end)?;

        Ok(end)
    }
}
