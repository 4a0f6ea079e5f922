//! Graph fixtures for the pass tests.

use netcupl_graph::{Graph, NodeId};

/// Builds the graph of the only module in `json`.
pub(crate) fn build(json: &str) -> Graph {
    netcupl_netlist::build_graph(json, None).unwrap()
}

/// The pin named `name`.
pub(crate) fn pin(graph: &Graph, name: &str) -> NodeId {
    graph
        .pins()
        .iter()
        .copied()
        .find(|&p| graph.node_name(p) == name)
        .unwrap_or_else(|| panic!("no pin named {name}"))
}
