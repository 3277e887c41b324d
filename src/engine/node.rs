use crate::{
    dsp::{Oscillator, ParamTimeline, SVFilter},
    engine::NodeId,
    MAX_BLOCK_SIZE,
};

pub(crate) enum NodeKind {
    Oscillator {
        osc: Oscillator,
        start: Option<f64>,
        stop: Option<f64>,
    },
    Filter(SVFilter),
    Gain(ParamTimeline),
    Destination,
}

/// One arena slot of the render graph.
pub(crate) struct Node {
    pub kind: NodeKind,
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
    pub buffer: Vec<f32>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Process one block in place. `block` already holds the summed inputs.
    pub fn process(&mut self, block: &mut [f32], block_start: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;

        match &mut self.kind {
            NodeKind::Oscillator { osc, start, stop } => {
                let increment = osc.frequency() / sample_rate;
                for (i, sample) in block.iter_mut().enumerate() {
                    let t = block_start + i as f64 * dt;
                    let started = start.is_some_and(|s| t >= s);
                    let stopped = stop.is_some_and(|s| t >= s);
                    *sample = if started && !stopped {
                        osc.next_sample(increment)
                    } else {
                        0.0
                    };
                }
            }
            NodeKind::Filter(filter) => filter.render(block, sample_rate),
            NodeKind::Gain(timeline) => {
                timeline.prune(block_start);
                for (i, sample) in block.iter_mut().enumerate() {
                    *sample *= timeline.value_at(block_start + i as f64 * dt);
                }
            }
            NodeKind::Destination => {}
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, NodeKind::Oscillator { .. })
    }
}
