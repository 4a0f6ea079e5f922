//! Pin-node budget enforcement by expression duplication.
//!
//! Some devices have few or no buried macrocells. When a pin-node limit is
//! set, purely combinational pin nodes are removed cheapest first: the logic
//! behind each one is cloned into every consumer, so the consumers no longer
//! reference it by name.

use crate::pass::Pass;
use netcupl_common::{ensure, CuplResult, InvariantViolation};
use netcupl_graph::{ConnId, Graph, NodeId, NodeKind};
use std::collections::{HashMap, HashSet};

/// Expands combinational pin nodes until at most `limit` pin nodes remain
/// or no candidate is left.
pub(crate) struct ExpandPass {
    pub limit: usize,
}

impl Pass for ExpandPass {
    fn name(&self) -> &'static str {
        "expand"
    }

    fn run(&self, graph: &mut Graph) -> CuplResult<bool> {
        let mut expanded = 0;
        while graph.pin_nodes().len() > self.limit {
            let Some(candidate) = next_candidate(graph) else {
                log::debug!(
                    "{} pin nodes left above the limit of {}",
                    graph.pin_nodes().len(),
                    self.limit
                );
                break;
            };
            expand_pin_node(graph, candidate)?;
            graph.rebuild_top();
            graph.check_all()?;
            expanded += 1;
        }
        Ok(expanded > 0)
    }
}

/// The cheapest combinational, non-feedback pin node. Ties go to the pin
/// node created first.
fn next_candidate(graph: &Graph) -> Option<NodeId> {
    graph
        .pin_nodes()
        .iter()
        .copied()
        .filter(|&pn| graph.node(pn).state.is_none() && !is_feedback(graph, pn))
        .map(|pn| (pn, output_complexity(graph, pn)))
        .min_by_key(|&(_, cost)| cost)
        .map(|(pn, cost)| {
            log::debug!("expanding {} (cost {cost})", graph.node_name(pn));
            pn
        })
}

/// Complexity of the expression driving `pn`, times its fan-out.
fn output_complexity(graph: &Graph, pn: NodeId) -> usize {
    let mut visited = HashSet::new();
    visited.insert(pn);
    let complexity: usize = graph
        .inputs_or_bidir(pn)
        .into_iter()
        .filter_map(|c| graph.driver(c))
        .map(|d| complexity(graph, d, &mut visited))
        .sum();
    let fan_out = graph.output_of(pn).map_or(0, |o| graph.fan_out(o));
    complexity * fan_out
}

/// 1 for a terminal or an already counted node; otherwise 1 plus the
/// complexity of every driven input.
fn complexity(graph: &Graph, output: ConnId, visited: &mut HashSet<NodeId>) -> usize {
    let node = graph.parent(output);
    if !visited.insert(node) || graph.node(node).kind.is_terminal() {
        return 1;
    }
    1 + graph
        .inputs_or_bidir(node)
        .into_iter()
        .filter_map(|c| graph.driver(c))
        .map(|d| complexity(graph, d, visited))
        .sum::<usize>()
}

/// Stops a subtree walk: these are referenced by name, never cloned.
fn is_boundary(kind: NodeKind) -> bool {
    kind.is_sequential() || kind.is_named() || kind == NodeKind::Module
}

/// Walks the logic behind `output` and returns the cloneable nodes in
/// pre-order, plus every boundary node it stopped at.
fn scan_subtree(graph: &Graph, output: ConnId) -> (Vec<NodeId>, HashSet<NodeId>) {
    let mut inner = Vec::new();
    let mut seen = HashSet::new();
    let mut boundary = HashSet::new();
    let mut stack = vec![output];
    while let Some(out) = stack.pop() {
        let node = graph.parent(out);
        if is_boundary(graph.node(node).kind) {
            boundary.insert(node);
            continue;
        }
        if !seen.insert(node) {
            continue;
        }
        inner.push(node);
        let drivers: Vec<ConnId> = graph
            .inputs(node)
            .into_iter()
            .filter_map(|c| graph.driver(c))
            .collect();
        stack.extend(drivers.into_iter().rev());
    }
    (inner, boundary)
}

/// A pin node whose own logic reaches back to it.
fn is_feedback(graph: &Graph, pn: NodeId) -> bool {
    graph
        .inputs_or_bidir(pn)
        .into_iter()
        .filter_map(|c| graph.driver(c))
        .any(|d| scan_subtree(graph, d).1.contains(&pn))
}

fn expand_pin_node(graph: &mut Graph, pn: NodeId) -> CuplResult<()> {
    let inputs = graph.inputs(pn);
    ensure(inputs.len() == 1, || InvariantViolation::Cardinality {
        location: graph.node_name(pn).to_string(),
        message: format!("combinational pin node has {} inputs", inputs.len()),
    })?;
    let expression = graph.driver(inputs[0]).ok_or_else(|| {
        InvariantViolation::Internal(format!("{} is not driven", graph.node_name(pn)))
    })?;
    let pn_out = graph.output_of(pn).ok_or_else(|| {
        InvariantViolation::Internal(format!("{} has no output", graph.node_name(pn)))
    })?;

    let (subtree, _) = scan_subtree(graph, expression);
    let consumers = graph.conn(pn_out).refs.clone();
    for consumer in consumers {
        if subtree.contains(&graph.parent(consumer)) {
            continue;
        }
        let new_output = clone_subtree(graph, &subtree, expression, pn, consumer)?;
        graph.unlink(consumer, pn_out);
        graph.link(consumer, new_output);
    }

    graph.retire_node(pn);
    for node in subtree {
        let dead = graph.output_of(node).map_or(true, |o| graph.fan_out(o) == 0);
        if dead {
            graph.retire_node(node);
        }
    }
    Ok(())
}

/// Clones `subtree` for one consumer and returns the clone of `expression`.
///
/// References into the subtree are mirrored onto the clones. References to
/// `pn` itself resolve to the consumer node's own output; all other
/// references keep pointing at the original driver.
fn clone_subtree(
    graph: &mut Graph,
    subtree: &[NodeId],
    expression: ConnId,
    pn: NodeId,
    consumer: ConnId,
) -> CuplResult<ConnId> {
    let mut clones: HashMap<NodeId, NodeId> = HashMap::new();
    for &old in subtree {
        let node = graph.node(old);
        let (kind, constant, name) = (node.kind, node.constant, node.name);
        let conns = node.connections.clone();
        let name = graph.resolve(name).to_string();
        let new = graph.add_cell(&name, kind);
        graph.node_mut(new).constant = constant;
        for c in conns {
            let conn = graph.conn(c);
            let (name, direction) = (conn.name, conn.direction);
            graph.add_connection_ident(new, name, direction);
        }
        clones.insert(old, new);
    }

    for &old in subtree {
        let new = clones[&old];
        let pairs: Vec<(ConnId, ConnId)> = graph
            .node(old)
            .connections
            .iter()
            .copied()
            .zip(graph.node(new).connections.iter().copied())
            .collect();
        for (old_conn, new_conn) in pairs {
            if !graph.conn(old_conn).direction.is_input() {
                continue;
            }
            let Some(source) = graph.driver(old_conn) else {
                continue;
            };
            let source_node = graph.parent(source);
            let target = if let Some(&clone) = clones.get(&source_node) {
                graph.output_of(clone)
            } else if source_node == pn {
                graph.output_or_bidir_of(graph.parent(consumer))
            } else {
                Some(source)
            };
            let target = target.ok_or_else(|| {
                InvariantViolation::Internal(format!(
                    "no output to reconnect {} to",
                    graph.conn_path(new_conn)
                ))
            })?;
            graph.link(new_conn, target);
        }
    }

    let root = graph.parent(expression);
    match clones.get(&root) {
        Some(&clone) => graph.output_of(clone).ok_or_else(|| {
            InvariantViolation::Internal(format!(
                "clone of {} has no output",
                graph.node_name(root)
            ))
            .into()
        }),
        None => Ok(expression),
    }
}
