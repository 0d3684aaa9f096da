//! Select stages.
//!
//! A select stage routes between its children based on a group texture. The
//! engine models it as a `select` node fed by a fixed-size int-array node
//! holding the threshold levels.
use tracing::warn;

use crate::engine::{node_kind, ImageGraph, NodeId, NodeOptions};
use crate::stage::params::parse_leading_int;

/// Capacity of the level array backing a select node.
pub(crate) const SELECT_LEVELS: usize = 16;

/// Creates a select node with its level-array predecessor and writes the
/// resolved levels. Returns the select node.
pub(crate) fn add_select_nodes(engine: &dyn ImageGraph, levels: &[String]) -> NodeId {
    let array_node = engine.add_node(node_kind::INT_ARRAY, NodeOptions::length(SELECT_LEVELS));
    let select_node = engine.add_node(node_kind::SELECT, NodeOptions::default());
    engine.set_predecessor(select_node, "selectvalues", array_node, "output");

    for (i, level) in levels.iter().enumerate() {
        if i >= SELECT_LEVELS {
            warn!("Ignoring select levels beyond {}.", SELECT_LEVELS);
            break;
        }
        match parse_leading_int(level) {
            Some(value) => engine.set_value(array_node, i, value),
            None => warn!("Unparsable select level '{}'.", level),
        }
    }

    engine.invalidate(select_node);
    select_node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recording::{Call, RecordingGraph};

    #[test]
    fn builds_the_node_pair_and_writes_levels() {
        let graph = RecordingGraph::default();
        let levels = ["0".to_owned(), "64".to_owned(), "128".to_owned()];
        let select = add_select_nodes(&graph, &levels);

        let calls = graph.calls();
        assert_eq!(
            calls[0],
            Call::AddNode(0, node_kind::INT_ARRAY.to_owned())
        );
        assert_eq!(calls[1], Call::AddNode(1, node_kind::SELECT.to_owned()));
        assert_eq!(
            calls[2],
            Call::SetPredecessor(select.0, "selectvalues".to_owned(), 0, "output".to_owned())
        );
        assert_eq!(calls[3], Call::SetValue(0, 0, 0));
        assert_eq!(calls[4], Call::SetValue(0, 1, 64));
        assert_eq!(calls[5], Call::SetValue(0, 2, 128));
        assert_eq!(calls[6], Call::Invalidate(select.0));
    }

    #[test]
    fn unparsable_levels_are_skipped() {
        let graph = RecordingGraph::default();
        let levels = ["ten".to_owned(), "32".to_owned()];
        add_select_nodes(&graph, &levels);

        let writes: Vec<_> = graph
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::SetValue(..)))
            .collect();
        assert_eq!(writes, vec![Call::SetValue(0, 1, 32)]);
    }

    #[test]
    fn levels_are_capped_at_the_array_length() {
        let graph = RecordingGraph::default();
        let levels: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        add_select_nodes(&graph, &levels);

        let writes = graph
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::SetValue(..)))
            .count();
        assert_eq!(writes, SELECT_LEVELS);
    }
}
