use crate::{
    config::SynthConfig,
    engine::{AudioEngine, EngineError, EngineState, NodeId},
    error::SynthError,
    synth::{
        envelope::{EnvelopeController, PEAK_LEVEL},
        factory::SignalChainFactory,
        note::NoteId,
        params::{ParamChange, ParameterStore, Settings},
        propagator::LiveParameterPropagator,
        registry::VoiceRegistry,
        scheduler::Scheduler,
        voice::VoiceChain,
    },
};

/*
Voice Lifecycle
===============

    Idle ──note_on──→ Sounding ──note_off──→ Releasing ──teardown──→ Idle
                         │  ↑                    ↑
                         └──┘ note_on (retrigger)│
                          old chain ─────────────┘

Sounding chains live in the registry, keyed by note. Releasing chains live
in the teardown scheduler, each owned by its own task. The two never share a
chain, so a teardown can only ever free the chain it was scheduled for: a
note that is released and struck again before the first teardown fires gets
a fresh chain the old task knows nothing about.

Teardown is due at `release end + teardown_margin` on the engine clock.
Tasks fire from `service()`, which runs at the start of every handler and
should also be called regularly by the host (once per UI frame is plenty).
A suspended engine freezes its clock, so nothing is torn down while paused.

Mix bus
-------

All chains feed one master gain, which feeds the engine destination. It is
built on the first `note_on`, after the engine has been resumed, with the
current master volume. Volume changes retarget it smoothly.
*/

/// The voice management core. Owns the engine handle and every piece of
/// voice state; all handlers go through `&mut self`.
pub struct PolySynth<E: AudioEngine> {
    engine: E,
    config: SynthConfig,
    store: ParameterStore,
    factory: SignalChainFactory,
    registry: VoiceRegistry,
    teardowns: Scheduler<VoiceChain>,
    master: Option<NodeId>,
}

impl<E: AudioEngine> PolySynth<E> {
    pub fn new(engine: E, config: SynthConfig) -> Self {
        Self {
            engine,
            store: ParameterStore::new(config.settings),
            config,
            factory: SignalChainFactory::new(),
            registry: VoiceRegistry::new(),
            teardowns: Scheduler::new(),
            master: None,
        }
    }

    pub fn note_on(&mut self, midi: u8) -> Result<(), SynthError> {
        self.service();
        let Some(note) = NoteId::from_midi(midi) else {
            log::debug!("ignoring note_on for unplayable note {midi}");
            return Ok(());
        };

        let master = self.ensure_master()?;

        if let Some(old) = self.registry.remove(note) {
            log::debug!("retrigger {note}: releasing {}", old.id());
            if let Err(err) = self.release_chain(old) {
                log::warn!("retrigger {note}: release failed, old chain freed at once: {err}");
            }
        }

        let settings = self.store.snapshot();
        let chain = self
            .factory
            .build(&mut self.engine, note, &settings, master)
            .inspect_err(|err| log::warn!("building voice for {note} failed: {err}"))?;

        if let Err(err) =
            EnvelopeController::attack(&mut self.engine, &chain, settings.attack_seconds, PEAK_LEVEL)
        {
            log::warn!("attack for {note} failed: {err}");
            self.teardown(chain);
            return Err(err.into());
        }

        log::debug!(
            "{note} on: {} ({}, {:.2} Hz) at {:.3}s",
            chain.id(),
            chain.waveform(),
            chain.frequency(),
            chain.created_at()
        );
        self.registry.insert(chain);
        Ok(())
    }

    /// Absent notes are a no-op. If the release cannot be scheduled the chain
    /// is freed immediately and the error returned.
    pub fn note_off(&mut self, midi: u8) -> Result<(), SynthError> {
        self.service();
        let Some(note) = NoteId::from_midi(midi) else {
            log::debug!("ignoring note_off for unplayable note {midi}");
            return Ok(());
        };

        match self.registry.remove(note) {
            Some(chain) => self.release_chain(chain).map_err(SynthError::from),
            None => Ok(()),
        }
    }

    /// Store a parameter and push it to what is sounding. Returns the change
    /// as stored, after clamping.
    pub fn set_parameter(&mut self, change: ParamChange) -> Result<ParamChange, SynthError> {
        self.service();
        let stored = LiveParameterPropagator::apply(
            &mut self.store,
            &mut self.engine,
            &self.registry,
            self.master,
            change,
        )?;
        log::trace!("parameter {:?} set to {stored:?}", change.param());
        Ok(stored)
    }

    /// Release every sounding note.
    pub fn all_notes_off(&mut self) -> Result<(), SynthError> {
        self.service();
        let chains: Vec<VoiceChain> = self.registry.drain().collect();
        let mut first_error = None;
        for chain in chains {
            if let Err(err) = self.release_chain(chain) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Silence everything now: cancel pending teardowns and free every chain,
    /// sounding or releasing. The master bus stays.
    pub fn panic(&mut self) {
        let releasing = self.teardowns.drain();
        let sounding: Vec<VoiceChain> = self.registry.drain().collect();
        log::debug!(
            "panic: freeing {} sounding and {} releasing voices",
            sounding.len(),
            releasing.len()
        );

        for chain in releasing {
            self.teardown(chain);
        }
        for chain in sounding {
            self.teardown(chain);
        }
    }

    /// Fire teardowns that are due on the engine clock. Returns how many fired.
    pub fn service(&mut self) -> usize {
        let now = self.engine.current_time();
        let due = self.teardowns.pop_due(now);
        let fired = due.len();
        for chain in due {
            log::trace!("teardown of {} fired at {now:.3}s", chain.id());
            self.teardown(chain);
        }
        fired
    }

    /// Copy the most recent output into `out`, oldest first. Returns how many
    /// samples were written.
    pub fn read_scope(&self, out: &mut [f32]) -> usize {
        self.engine.read_tap(out)
    }

    pub fn snapshot(&self) -> Settings {
        self.store.snapshot()
    }

    /// Sounding notes, lowest first. Releasing notes are not included.
    pub fn active_notes(&self) -> Vec<NoteId> {
        self.registry.notes()
    }

    pub fn voice(&self, note: NoteId) -> Option<&VoiceChain> {
        self.registry.get(note)
    }

    pub fn sounding_count(&self) -> usize {
        self.registry.len()
    }

    pub fn releasing_count(&self) -> usize {
        self.teardowns.len()
    }

    /// Chains waiting for teardown, with their due times.
    pub fn releasing(&self) -> impl Iterator<Item = (f64, &VoiceChain)> {
        self.teardowns.iter()
    }

    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Resume the engine if needed and build the master bus on first use.
    fn ensure_master(&mut self) -> Result<NodeId, EngineError> {
        if self.engine.state() != EngineState::Running {
            self.engine
                .resume()
                .inspect_err(|err| log::warn!("engine could not be resumed: {err}"))?;
        }
        if let Some(master) = self.master {
            return Ok(master);
        }

        let volume = self.store.snapshot().master_volume;
        let master = self.engine.create_gain(volume)?;
        let destination = self.engine.destination();
        if let Err(err) = self.engine.connect(master, destination) {
            let _ = self.engine.disconnect(master);
            return Err(err);
        }
        log::debug!("master bus {master} created at volume {volume:.2}");
        self.master = Some(master);
        Ok(master)
    }

    fn release_chain(&mut self, chain: VoiceChain) -> Result<(), EngineError> {
        let release = self.store.snapshot().release_seconds;
        match EnvelopeController::release(&mut self.engine, &chain, release) {
            Ok(end) => {
                let due = end + self.config.teardown_margin;
                log::debug!(
                    "{} off: {} releasing until {end:.3}s, teardown at {due:.3}s",
                    chain.note(),
                    chain.id()
                );
                self.teardowns.schedule(due, chain);
                Ok(())
            }
            Err(err) => {
                log::warn!("release of {} failed: {err}", chain.id());
                self.teardown(chain);
                Err(err)
            }
        }
    }

    fn teardown(&mut self, chain: VoiceChain) {
        for node in chain.nodes() {
            if let Err(err) = self.engine.disconnect(node) {
                log::warn!("freeing {node} of {} failed: {err}", chain.id());
            }
        }
        log::trace!("{} ({}) torn down", chain.id(), chain.note());
    }
}
