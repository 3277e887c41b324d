use crate::{
    dsp::{FilterType, BUTTERWORTH_Q},
    engine::{AudioEngine, EngineError, NodeId},
    synth::{
        note::NoteId,
        params::Settings,
        voice::{ChainId, VoiceChain},
    },
};

/*
Voice Chain Construction
========================

Every note gets its own chain, wired in a fixed order:

    generator ─→ low-pass ─→ high-pass ─→ gain ─→ mix bus

The generator takes the note's table frequency and the waveform from the
settings snapshot; both stay fixed for the life of the chain. The filters
take the snapshot's cutoffs with a Butterworth Q (1/√2), and the gain starts
at 0 so the chain is silent until an attack is scheduled.

The generator is started at the engine's current time, and that same reading
is the chain's `created_at`.

A build either returns a fully wired chain or nothing: if the engine refuses
any step, the nodes created so far are disconnected before the error is
returned.
*/

/// Builds voice chains. Owns the chain id counter.
#[derive(Debug, Default)]
pub struct SignalChainFactory {
    next_id: u64,
}

impl SignalChainFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<E: AudioEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        note: NoteId,
        settings: &Settings,
        mix_bus: NodeId,
    ) -> Result<VoiceChain, EngineError> {
        let mut created = Vec::with_capacity(4);
        match Self::wire(engine, note, settings, mix_bus, &mut created) {
            Ok(([generator, lowpass, highpass, gain], created_at)) => {
                let id = ChainId(self.next_id);
                self.next_id += 1;

                Ok(VoiceChain {
                    id,
                    note,
                    waveform: settings.waveform,
                    frequency: note.frequency(),
                    generator,
                    lowpass,
                    highpass,
                    gain,
                    created_at,
                })
            }
            Err(err) => {
                for node in created.into_iter().rev() {
                    if let Err(cleanup) = engine.disconnect(node) {
                        log::warn!("failed to free {node} after aborted build: {cleanup}");
                    }
                }
                Err(err)
            }
        }
    }

    fn wire<E: AudioEngine + ?Sized>(
        engine: &mut E,
        note: NoteId,
        settings: &Settings,
        mix_bus: NodeId,
        created: &mut Vec<NodeId>,
    ) -> Result<([NodeId; 4], f64), EngineError> {
        let generator = engine.create_oscillator(settings.waveform, note.frequency())?;
        created.push(generator);
        let lowpass =
            engine.create_filter(FilterType::LowPass, settings.low_cutoff_hz, BUTTERWORTH_Q)?;
        created.push(lowpass);
        let highpass =
            engine.create_filter(FilterType::HighPass, settings.high_cutoff_hz, BUTTERWORTH_Q)?;
        created.push(highpass);
        let gain = engine.create_gain(0.0)?;
        created.push(gain);

        engine.connect(generator, lowpass)?;
        engine.connect(lowpass, highpass)?;
        engine.connect(highpass, gain)?;
        engine.connect(gain, mix_bus)?;

        let now = engine.current_time();
        engine.start(generator, now)?;

        Ok(([generator, lowpass, highpass, gain], now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EngineConfig,
        dsp::Waveform,
        engine::{EngineState, GraphEngine},
        synth::{note, voice::FilterStage},
    };

    fn running_engine(config: EngineConfig) -> GraphEngine {
        let mut engine = GraphEngine::new(config);
        engine.resume().unwrap();
        engine
    }

    #[test]
    fn chain_is_wired_in_order() {
        let mut engine = running_engine(EngineConfig::default());
        let bus = engine.create_gain(1.0).unwrap();
        let mut factory = SignalChainFactory::new();
        let note = NoteId::from_midi(note::A4).unwrap();

        let chain = factory
            .build(&mut engine, note, &Settings::default(), bus)
            .unwrap();

        assert_eq!(engine.inputs_of(chain.filter(FilterStage::LowPass)).unwrap(), vec![chain.generator()]);
        assert_eq!(
            engine.inputs_of(chain.filter(FilterStage::HighPass)).unwrap(),
            vec![chain.filter(FilterStage::LowPass)]
        );
        assert_eq!(engine.inputs_of(chain.gain()).unwrap(), vec![chain.filter(FilterStage::HighPass)]);
        assert_eq!(engine.inputs_of(bus).unwrap(), vec![chain.gain()]);
        assert_eq!(chain.frequency(), 440.0);
    }

    #[test]
    fn chain_takes_snapshot_values_and_starts_silent() {
        let mut engine = running_engine(EngineConfig::default());
        let bus = engine.create_gain(1.0).unwrap();
        let settings = Settings {
            waveform: Waveform::Sawtooth,
            low_cutoff_hz: 1_200.0,
            high_cutoff_hz: 90.0,
            ..Settings::default()
        };
        let mut factory = SignalChainFactory::new();
        let chain = factory
            .build(&mut engine, NoteId::from_midi(note::C4).unwrap(), &settings, bus)
            .unwrap();

        assert_eq!(chain.waveform(), Waveform::Sawtooth);
        assert_eq!(engine.filter_cutoff(chain.filter(FilterStage::LowPass)).unwrap(), 1_200.0);
        assert_eq!(engine.filter_cutoff(chain.filter(FilterStage::HighPass)).unwrap(), 90.0);
        assert_eq!(engine.gain_value(chain.gain()).unwrap(), 0.0);
    }

    #[test]
    fn chain_ids_are_unique() {
        let mut engine = running_engine(EngineConfig::default());
        let bus = engine.create_gain(1.0).unwrap();
        let mut factory = SignalChainFactory::new();
        let note = NoteId::from_midi(note::E4).unwrap();

        let a = factory.build(&mut engine, note, &Settings::default(), bus).unwrap();
        let b = factory.build(&mut engine, note, &Settings::default(), bus).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn failed_build_leaks_nothing() {
        // Bus plus two free slots: the build fails on the third node.
        let mut engine = running_engine(EngineConfig {
            max_nodes: 3,
            ..EngineConfig::default()
        });
        let bus = engine.create_gain(1.0).unwrap();
        let mut factory = SignalChainFactory::new();

        let result = factory.build(
            &mut engine,
            NoteId::from_midi(note::C4).unwrap(),
            &Settings::default(),
            bus,
        );

        assert_eq!(result, Err(EngineError::NodeLimit { limit: 3 }));
        assert_eq!(engine.node_count(), 1);
        assert_eq!(engine.state(), EngineState::Running);
    }
}
