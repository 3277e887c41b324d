use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    config::EngineConfig,
    dsp::{AutomationEvent, FilterType, Oscillator, ParamTimeline, SVFilter, Waveform},
    engine::{
        node::{Node, NodeKind},
        tap::ScopeTap,
        AudioEngine, EngineError, EngineState, NodeId,
    },
    MAX_BLOCK_SIZE,
};

/*
In-Process Render Graph
=======================

Nodes live in an arena keyed by `NodeId`. Edges are stored on both ends
(`inputs` for pulling, `outputs` for detaching). Each block the graph is
walked depth-first from the destination, producing a post-order in which
every node comes after all of its inputs. Nodes that cannot reach the
destination are not rendered at all.

    osc ─→ low-pass ─→ high-pass ─→ gain ─┐
    osc ─→ low-pass ─→ high-pass ─→ gain ─┼─→ master gain ─→ destination ─→ tap
    osc ─→ low-pass ─→ high-pass ─→ gain ─┘

A node's input is the sum of its inputs' blocks, so a gain node with many
inputs is a mix bus.

The graph is shared between the control thread (which builds and schedules)
and the audio callback (which renders) behind one mutex. The lock is held for
one render call at a time.
*/

struct Graph {
    config: EngineConfig,
    state: EngineState,
    frames_rendered: u64,
    nodes: HashMap<NodeId, Node>,
    next_id: u32,
    destination: NodeId,
    order: Vec<NodeId>,
    stack: Vec<(NodeId, bool)>,
    tap: ScopeTap,
}

impl Graph {
    fn new(config: EngineConfig) -> Self {
        let destination = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(destination, Node::new(NodeKind::Destination));

        Self {
            tap: ScopeTap::new(config.scope_len),
            config,
            state: EngineState::Suspended,
            frames_rendered: 0,
            nodes,
            next_id: 1,
            destination,
            order: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.config.sample_rate as f64
    }

    fn insert(&mut self, kind: NodeKind) -> Result<NodeId, EngineError> {
        if self.state == EngineState::Closed {
            return Err(EngineError::Closed);
        }
        // The destination does not count against the limit.
        if self.nodes.len() > self.config.max_nodes {
            return Err(EngineError::NodeLimit {
                limit: self.config.max_nodes,
            });
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(kind));
        Ok(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, EngineError> {
        self.nodes.get_mut(&id).ok_or(EngineError::UnknownNode(id))
    }

    fn timeline_mut(&mut self, id: NodeId) -> Result<&mut ParamTimeline, EngineError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Gain(timeline) => Ok(timeline),
            _ => Err(EngineError::NotAGain(id)),
        }
    }

    fn timeline(&self, id: NodeId) -> Result<&ParamTimeline, EngineError> {
        match self.nodes.get(&id).map(|node| &node.kind) {
            Some(NodeKind::Gain(timeline)) => Ok(timeline),
            Some(_) => Err(EngineError::NotAGain(id)),
            None => Err(EngineError::UnknownNode(id)),
        }
    }

    /// True if `target` is downstream of `from`.
    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut pending = vec![from];
        let mut seen = Vec::new();
        while let Some(id) = pending.pop() {
            if id == target {
                return true;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if let Some(node) = self.nodes.get(&id) {
                pending.extend(node.outputs.iter().copied());
            }
        }
        false
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        if !self.nodes.contains_key(&to) {
            return Err(EngineError::UnknownNode(to));
        }
        if from == to || self.reaches(to, from) {
            return Err(EngineError::Cycle { from, to });
        }

        let source = self.node_mut(from)?;
        if source.outputs.contains(&to) {
            return Ok(());
        }
        source.outputs.push(to);
        self.node_mut(to)?.inputs.push(from);
        Ok(())
    }

    fn disconnect(&mut self, id: NodeId) -> Result<(), EngineError> {
        if id == self.destination {
            return Ok(());
        }
        let node = self.nodes.remove(&id).ok_or(EngineError::UnknownNode(id))?;

        for input in &node.inputs {
            if let Some(upstream) = self.nodes.get_mut(input) {
                upstream.outputs.retain(|&out| out != id);
            }
        }
        for output in &node.outputs {
            if let Some(downstream) = self.nodes.get_mut(output) {
                downstream.inputs.retain(|&inp| inp != id);
            }
        }
        Ok(())
    }

    /// Post-order walk from the destination: inputs before consumers.
    fn update_order(&mut self) {
        let Graph {
            nodes,
            order,
            stack,
            destination,
            ..
        } = self;

        order.clear();
        stack.clear();
        stack.push((*destination, false));

        while let Some((id, expanded)) = stack.pop() {
            if order.contains(&id) {
                continue;
            }
            if expanded {
                order.push(id);
                continue;
            }
            let Some(node) = nodes.get(&id) else {
                continue;
            };
            stack.push((id, true));
            for input in &node.inputs {
                if !order.contains(input) {
                    stack.push((*input, false));
                }
            }
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let frames = out.len();
        let sample_rate = self.config.sample_rate;
        let block_start = self.current_time();

        self.update_order();

        for index in 0..self.order.len() {
            let id = self.order[index];
            let Some(mut buffer) = self
                .nodes
                .get_mut(&id)
                .map(|node| std::mem::take(&mut node.buffer))
            else {
                continue;
            };

            let block = &mut buffer[..frames];
            block.fill(0.0);
            if let Some(node) = self.nodes.get(&id) {
                if !node.is_source() {
                    for input in &node.inputs {
                        if let Some(upstream) = self.nodes.get(input) {
                            for (o, &s) in block.iter_mut().zip(&upstream.buffer[..frames]) {
                                *o += s;
                            }
                        }
                    }
                }
            }

            if let Some(node) = self.nodes.get_mut(&id) {
                node.process(block, block_start, sample_rate);
                node.buffer = buffer;
            }
        }

        match self.nodes.get(&self.destination) {
            Some(destination) => out.copy_from_slice(&destination.buffer[..frames]),
            None => out.fill(0.0),
        }
        self.tap.push_block(out);
        self.frames_rendered += frames as u64;
    }
}

/// Cloneable handle to a shared in-process render graph.
///
/// One clone lives in the audio callback and calls [`GraphEngine::render_block`];
/// another is owned by the synth and used through [`AudioEngine`].
#[derive(Clone)]
pub struct GraphEngine {
    inner: Arc<Mutex<Graph>>,
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Graph::new(config))),
        }
    }

    fn graph(&self) -> MutexGuard<'_, Graph> {
        // Rendering never leaves the graph half-updated, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render the next `out.len()` frames. Silent, and the clock stays put,
    /// unless the engine is running.
    pub fn render_block(&self, out: &mut [f32]) {
        let mut graph = self.graph();
        if graph.state != EngineState::Running {
            out.fill(0.0);
            return;
        }
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            graph.render_chunk(chunk);
        }
    }

    /// Render and discard `seconds` of audio. Useful for offline driving.
    pub fn run_for(&self, seconds: f64) {
        let sample_rate = self.sample_rate() as f64;
        let mut remaining = (seconds * sample_rate).round().max(0.0) as usize;
        let mut scratch = vec![0.0f32; MAX_BLOCK_SIZE];
        while remaining > 0 {
            let frames = remaining.min(MAX_BLOCK_SIZE);
            self.render_block(&mut scratch[..frames]);
            remaining -= frames;
        }
    }

    pub fn suspend(&self) {
        let mut graph = self.graph();
        if graph.state == EngineState::Running {
            graph.state = EngineState::Suspended;
            log::debug!("engine suspended at {:.3}s", graph.current_time());
        }
    }

    pub fn close(&self) {
        let mut graph = self.graph();
        graph.state = EngineState::Closed;
        graph.tap.clear();
        log::debug!("engine closed");
    }

    pub fn sample_rate(&self) -> f32 {
        self.graph().config.sample_rate
    }

    /// Live nodes, not counting the destination.
    pub fn node_count(&self) -> usize {
        self.graph().nodes.len() - 1
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.graph().nodes.contains_key(&node)
    }

    pub fn inputs_of(&self, node: NodeId) -> Result<Vec<NodeId>, EngineError> {
        self.graph()
            .nodes
            .get(&node)
            .map(|n| n.inputs.clone())
            .ok_or(EngineError::UnknownNode(node))
    }

    pub fn filter_cutoff(&self, filter: NodeId) -> Result<f32, EngineError> {
        match self.graph().nodes.get(&filter).map(|n| &n.kind) {
            Some(NodeKind::Filter(svf)) => Ok(svf.cutoff_hz),
            Some(_) => Err(EngineError::NotAFilter(filter)),
            None => Err(EngineError::UnknownNode(filter)),
        }
    }

    /// Value the gain curve will have at `t`, according to what is scheduled now.
    pub fn gain_value_at(&self, gain: NodeId, t: f64) -> Result<f32, EngineError> {
        Ok(self.graph().timeline(gain)?.value_at(t))
    }

    pub fn pending_gain_events(&self, gain: NodeId) -> Result<Vec<AutomationEvent>, EngineError> {
        Ok(self.graph().timeline(gain)?.pending().to_vec())
    }
}

impl AudioEngine for GraphEngine {
    fn state(&self) -> EngineState {
        self.graph().state
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        let mut graph = self.graph();
        match graph.state {
            EngineState::Closed => Err(EngineError::Closed),
            EngineState::Running => Ok(()),
            EngineState::Suspended => {
                graph.state = EngineState::Running;
                log::debug!("engine running at {:.3}s", graph.current_time());
                Ok(())
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.graph().current_time()
    }

    fn destination(&self) -> NodeId {
        self.graph().destination
    }

    fn create_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f32,
    ) -> Result<NodeId, EngineError> {
        self.graph().insert(NodeKind::Oscillator {
            osc: Oscillator::new(waveform, frequency),
            start: None,
            stop: None,
        })
    }

    fn create_filter(
        &mut self,
        filter_type: FilterType,
        cutoff_hz: f32,
        q: f32,
    ) -> Result<NodeId, EngineError> {
        self.graph()
            .insert(NodeKind::Filter(SVFilter::new(filter_type, cutoff_hz, q)))
    }

    fn create_gain(&mut self, value: f32) -> Result<NodeId, EngineError> {
        self.graph().insert(NodeKind::Gain(ParamTimeline::new(value)))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        self.graph().connect(from, to)
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), EngineError> {
        self.graph().disconnect(node)
    }

    fn start(&mut self, oscillator: NodeId, at: f64) -> Result<(), EngineError> {
        match &mut self.graph().node_mut(oscillator)?.kind {
            NodeKind::Oscillator { start, .. } => {
                *start = Some(at);
                Ok(())
            }
            _ => Err(EngineError::NotAnOscillator(oscillator)),
        }
    }

    fn stop(&mut self, oscillator: NodeId, at: f64) -> Result<(), EngineError> {
        match &mut self.graph().node_mut(oscillator)?.kind {
            NodeKind::Oscillator { stop, .. } => {
                *stop = Some(at);
                Ok(())
            }
            _ => Err(EngineError::NotAnOscillator(oscillator)),
        }
    }

    fn set_filter_cutoff(&mut self, filter: NodeId, cutoff_hz: f32) -> Result<(), EngineError> {
        match &mut self.graph().node_mut(filter)?.kind {
            NodeKind::Filter(svf) => {
                svf.set_cutoff(cutoff_hz);
                Ok(())
            }
            _ => Err(EngineError::NotAFilter(filter)),
        }
    }

    fn schedule_gain(&mut self, gain: NodeId, event: AutomationEvent) -> Result<(), EngineError> {
        self.graph().timeline_mut(gain)?.schedule(event);
        Ok(())
    }

    fn ramp_gain_from_now(
        &mut self,
        gain: NodeId,
        from: Option<f32>,
        target: f32,
        duration: f64,
    ) -> Result<f64, EngineError> {
        // One lock for the whole rewrite: the audio callback sees either the
        // old curve or the new one.
        let mut graph = self.graph();
        let now = graph.current_time();
        let timeline = graph.timeline_mut(gain)?;
        match from {
            Some(value) => {
                timeline.cancel_scheduled_values(now);
                timeline.schedule(AutomationEvent::SetValue { value, time: now });
            }
            None => timeline.cancel_and_hold(now),
        }
        timeline.schedule(AutomationEvent::LinearRamp {
            value: target,
            end_time: now + duration.max(0.0),
        });
        Ok(now)
    }

    fn gain_value(&self, gain: NodeId) -> Result<f32, EngineError> {
        let graph = self.graph();
        let now = graph.current_time();
        Ok(graph.timeline(gain)?.value_at(now))
    }

    fn read_tap(&self, out: &mut [f32]) -> usize {
        self.graph().tap.read(out)
    }
}
