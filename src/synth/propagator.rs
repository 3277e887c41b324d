use crate::{
    dsp::{AutomationEvent, Waveform},
    engine::{AudioEngine, EngineError, NodeId},
    synth::{
        params::{ParamChange, ParameterStore},
        registry::VoiceRegistry,
        voice::FilterStage,
    },
};

/// Time constant (seconds) of the master gain's approach to a new volume.
pub const MASTER_TIME_CONSTANT: f64 = 0.1;

/// Pushes parameter changes into the store and then into whatever is
/// already sounding.
///
/// | change        | reaches                                        |
/// |---------------|------------------------------------------------|
/// | master volume | master gain, exponential approach              |
/// | cutoff        | that filter stage of every sounding chain, now |
/// | waveform      | the store only; sounding chains keep theirs    |
/// | attack/release| the store only; used by the next envelope      |
///
/// Chains that are already releasing are not in the registry and keep the
/// cutoffs they had when released.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveParameterPropagator;

impl LiveParameterPropagator {
    /// Store `change` and apply it live. Returns the change as stored.
    pub fn apply<E: AudioEngine + ?Sized>(
        store: &mut ParameterStore,
        engine: &mut E,
        registry: &VoiceRegistry,
        master: Option<NodeId>,
        change: ParamChange,
    ) -> Result<ParamChange, EngineError> {
        match change {
            ParamChange::MasterVolume(v) => Self::on_volume_change(store, engine, master, v),
            ParamChange::LowCutoffHz(hz) => {
                Self::on_filter_change(store, engine, registry, FilterStage::LowPass, hz)
            }
            ParamChange::HighCutoffHz(hz) => {
                Self::on_filter_change(store, engine, registry, FilterStage::HighPass, hz)
            }
            ParamChange::Waveform(w) => Ok(Self::on_waveform_change(store, w)),
            ParamChange::AttackSeconds(_) | ParamChange::ReleaseSeconds(_) => {
                Ok(Self::on_envelope_change(store, change))
            }
        }
    }

    /// Without a master bus the value is only stored; the bus picks it up
    /// when it is created.
    pub fn on_volume_change<E: AudioEngine + ?Sized>(
        store: &mut ParameterStore,
        engine: &mut E,
        master: Option<NodeId>,
        volume: f32,
    ) -> Result<ParamChange, EngineError> {
        let stored = store.set(ParamChange::MasterVolume(volume));
        if let (Some(master), ParamChange::MasterVolume(target)) = (master, stored) {
            let now = engine.current_time();
            engine.schedule_gain(
                master,
                AutomationEvent::SetTarget {
                    target,
                    start_time: now,
                    time_constant: MASTER_TIME_CONSTANT,
                },
            )?;
        }
        Ok(stored)
    }

    /// Every sounding chain is visited even if one fails; the first failure
    /// is returned.
    pub fn on_filter_change<E: AudioEngine + ?Sized>(
        store: &mut ParameterStore,
        engine: &mut E,
        registry: &VoiceRegistry,
        stage: FilterStage,
        cutoff_hz: f32,
    ) -> Result<ParamChange, EngineError> {
        let stored = store.set(match stage {
            FilterStage::LowPass => ParamChange::LowCutoffHz(cutoff_hz),
            FilterStage::HighPass => ParamChange::HighCutoffHz(cutoff_hz),
        });
        let hz = match stored {
            ParamChange::LowCutoffHz(hz) | ParamChange::HighCutoffHz(hz) => hz,
            _ => cutoff_hz,
        };

        let mut first_error = None;
        for chain in registry.iter() {
            let filter = chain.filter(stage);
            if let Err(err) = engine.set_filter_cutoff(filter, hz) {
                log::warn!("cutoff update for {} ({filter}) failed: {err}", chain.note());
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(stored),
        }
    }

    pub fn on_waveform_change(store: &mut ParameterStore, waveform: Waveform) -> ParamChange {
        store.set(ParamChange::Waveform(waveform))
    }

    pub fn on_envelope_change(store: &mut ParameterStore, change: ParamChange) -> ParamChange {
        debug_assert!(matches!(
            change,
            ParamChange::AttackSeconds(_) | ParamChange::ReleaseSeconds(_)
        ));
        store.set(change)
    }
}
