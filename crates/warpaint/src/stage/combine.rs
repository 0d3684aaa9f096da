//! Combine stages.
use std::fmt;

use crate::engine::{node_kind, ImageGraph, NodeId};
use crate::rng::RandomSource;
use crate::stage::params::Range;

/// How a combine stage merges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    Add,
    Lerp,
    Multiply,
}

impl CombineMode {
    /// Engine node kind implementing this mode.
    pub fn node_kind(self) -> &'static str {
        match self {
            CombineMode::Add => node_kind::COMBINE_ADD,
            CombineMode::Lerp => node_kind::COMBINE_LERP,
            CombineMode::Multiply => node_kind::MULTIPLY,
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_kind())
    }
}

/// Randomizable parameters of a combine stage.
#[derive(Debug, Clone)]
pub struct CombineParams {
    pub adjust_black: Range,
    pub adjust_offset: Range,
    pub adjust_gamma: Range,
}

impl Default for CombineParams {
    fn default() -> Self {
        Self {
            adjust_black: Range::default(),
            adjust_offset: Range::new(1.0, 1.0),
            adjust_gamma: Range::new(1.0, 1.0),
        }
    }
}

impl CombineParams {
    pub(crate) fn randomize(
        &self,
        engine: &dyn ImageGraph,
        node: NodeId,
        rng: &mut dyn RandomSource,
    ) {
        let adjust_black = rng.random_float(self.adjust_black.low, self.adjust_black.high);
        let adjust_offset = rng.random_float(self.adjust_offset.low, self.adjust_offset.high);
        let adjust_gamma = rng.random_float(self.adjust_gamma.low, self.adjust_gamma.high);
        let adjust_white = adjust_black + adjust_offset;

        engine.set_param(node, "adjust black", adjust_black.into());
        engine.set_param(node, "adjust white", adjust_white.into());
        engine.set_param(node, "adjust gamma", adjust_gamma.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{Call, RecordingGraph};
    use crate::engine::{NodeOptions, ParamValue};
    use crate::rng::UniformRandomStream;

    #[test]
    fn mode_maps_to_engine_node_kind() {
        assert_eq!(CombineMode::Add.node_kind(), "combine_add");
        assert_eq!(CombineMode::Lerp.node_kind(), "combine_lerp");
        assert_eq!(CombineMode::Multiply.node_kind(), "multiply");
    }

    #[test]
    fn randomize_draws_three_adjust_values() {
        let graph = RecordingGraph::default();
        let node = graph.add_node(node_kind::COMBINE_ADD, NodeOptions::default());
        let params = CombineParams {
            adjust_gamma: Range::new(0.0, 1.0),
            ..CombineParams::default()
        };
        let mut stream = UniformRandomStream::new(42);
        params.randomize(&graph, node, &mut stream);

        assert_eq!(graph.param(node, "adjust black"), Some(ParamValue::Float(0.0)));
        assert_eq!(graph.param(node, "adjust white"), Some(ParamValue::Float(1.0)));
        assert_eq!(
            graph.param(node, "adjust gamma"),
            Some(ParamValue::Float(0.7370189999868251))
        );
    }

    #[test]
    fn randomize_does_not_invalidate() {
        let graph = RecordingGraph::default();
        let node = graph.add_node(node_kind::COMBINE_LERP, NodeOptions::default());
        let mut stream = UniformRandomStream::new(7);
        CombineParams::default().randomize(&graph, node, &mut stream);
        assert!(!graph
            .calls()
            .iter()
            .any(|call| matches!(call, Call::Invalidate(_))));
    }
}
