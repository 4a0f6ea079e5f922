//! Combinational loop detection.
//!
//! Feedback through a register or a named pin is legal; feedback through
//! gates alone cannot be written as a finite equation. The gates and the
//! driver edges between them are copied into a `petgraph` digraph and any
//! strongly connected component with a cycle is reported.

use crate::graph::Graph;
use crate::ids::NodeId;
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Returns the nodes of the first combinational loop found among the cells,
/// or `None` if the gates form a DAG.
pub fn find_combinational_loop(graph: &Graph) -> Option<Vec<NodeId>> {
    let mut dg: DiGraph<NodeId, ()> = DiGraph::new();
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
    for &cell in graph.cells() {
        if graph.node(cell).kind.is_combinational() {
            index.insert(cell, dg.add_node(cell));
        }
    }

    let mut self_loop = None;
    for &cell in graph.cells() {
        let Some(&to) = index.get(&cell) else {
            continue;
        };
        for input in graph.inputs_or_bidir(cell) {
            let Some(driver) = graph.driver(input) else {
                continue;
            };
            let from_node = graph.parent(driver);
            if let Some(&from) = index.get(&from_node) {
                if from_node == cell {
                    self_loop.get_or_insert(cell);
                }
                dg.add_edge(from, to, ());
            }
        }
    }
    if let Some(cell) = self_loop {
        return Some(vec![cell]);
    }

    let mut loops: Vec<Vec<NodeId>> = kosaraju_scc(&dg)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut nodes: Vec<NodeId> = scc.into_iter().map(|i| dg[i]).collect();
            nodes.sort();
            nodes
        })
        .collect();
    loops.sort();
    loops.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnId, Direction, NodeKind};

    fn gate(g: &mut Graph, name: &str, kind: NodeKind) -> (NodeId, ConnId, ConnId) {
        let n = g.add_cell(name, kind);
        let a = g.add_connection(n, "A", Direction::Input);
        let y = g.add_connection(n, "Y", Direction::Output);
        (n, a, y)
    }

    #[test]
    fn chain_has_no_loop() {
        let mut g = Graph::new("top");
        let (_, _, y1) = gate(&mut g, "n1", NodeKind::Not);
        let (_, a2, _) = gate(&mut g, "n2", NodeKind::Not);
        g.link(a2, y1);
        assert!(find_combinational_loop(&g).is_none());
    }

    #[test]
    fn two_inverters_in_a_ring() {
        let mut g = Graph::new("top");
        let (n1, a1, y1) = gate(&mut g, "n1", NodeKind::Not);
        let (n2, a2, y2) = gate(&mut g, "n2", NodeKind::Not);
        g.link(a2, y1);
        g.link(a1, y2);
        assert_eq!(find_combinational_loop(&g), Some(vec![n1, n2]));
    }

    #[test]
    fn self_loop() {
        let mut g = Graph::new("top");
        let (n, a, y) = gate(&mut g, "n", NodeKind::Not);
        g.link(a, y);
        assert_eq!(find_combinational_loop(&g), Some(vec![n]));
    }

    #[test]
    fn register_breaks_the_loop() {
        let mut g = Graph::new("top");
        let (_, a, y) = gate(&mut g, "n", NodeKind::Not);
        let r = g.add_cell("r", NodeKind::Dff);
        let d = g.add_connection(r, "D", Direction::Input);
        let q = g.add_connection(r, "Q", Direction::Output);
        g.link(d, y);
        g.link(a, q);
        assert!(find_combinational_loop(&g).is_none());
    }
}
