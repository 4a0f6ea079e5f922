//! Pin creation and branching-point pin nodes.
//!
//! Every module port becomes a Pin. Then every combinational output that
//! feeds more than one consumer gets a pin node spliced in front of its
//! consumers, so a shared term is written once and referenced by name.

use crate::pass::Pass;
use crate::splice::insert_pin_node;
use netcupl_common::{ensure, CuplResult, InvariantViolation};
use netcupl_graph::{ConnId, Graph, NodeId, NodeKind};
use std::collections::HashSet;

/// Creates pins for the module ports and pin nodes at fan-out points.
pub(crate) struct BranchingPass;

impl Pass for BranchingPass {
    fn name(&self) -> &'static str {
        "branching"
    }

    fn run(&self, graph: &mut Graph) -> CuplResult<bool> {
        let pins = create_pins(graph);
        let pin_nodes = insert_branching_pin_nodes(graph)?;
        graph.rebuild_top();
        graph.check_all()?;
        Ok(pins + pin_nodes > 0)
    }
}

/// Moves each module port connection onto a new Pin named after the port.
fn create_pins(graph: &mut Graph) -> usize {
    let module = graph.module();
    let ports = graph.node(module).connections.clone();
    for &conn in &ports {
        let name = graph.conn_name(conn).to_string();
        let pin = graph.add_pin(&name);
        graph.reparent(conn, pin);
    }
    ports.len()
}

struct Frame {
    inputs: Vec<ConnId>,
    next: usize,
}

/// Depth-first walk from every pin, then every register and tri-state
/// buffer, toward the drivers. Returns the number of pin nodes created.
///
/// The walk keeps its own frame stack; nodes are visited in the same order
/// a recursive pre-order walk would visit them.
fn insert_branching_pin_nodes(graph: &mut Graph) -> CuplResult<usize> {
    let roots: Vec<NodeId> = graph
        .pins()
        .iter()
        .copied()
        .chain(
            graph
                .cells()
                .iter()
                .copied()
                .filter(|&c| graph.node(c).kind.is_sequential()),
        )
        .collect();

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut created = 0;

    for root in roots {
        enter(graph, root, &mut visited, &mut stack);
        while let Some(frame) = stack.last_mut() {
            let Some(&input) = frame.inputs.get(frame.next) else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            let refs = &graph.conn(input).refs;
            if refs.is_empty() {
                continue;
            }
            ensure(refs.len() == 1, || InvariantViolation::Cardinality {
                location: graph.conn_path(input),
                message: format!("input has {} drivers", refs.len()),
            })?;
            let output = refs[0];
            ensure(graph.conn(output).direction.is_output(), || {
                InvariantViolation::ReferenceMismatch {
                    connection: graph.conn_path(input),
                    message: format!("driven by non-output {}", graph.conn_path(output)),
                }
            })?;

            let driver = graph.parent(output);
            let kind = graph.node(driver).kind;
            if !(kind.is_sequential() || kind.is_named()) && graph.fan_out(output) > 1 {
                insert_pin_node(graph, output)?;
                created += 1;
            }
            if !kind.is_named() {
                enter(graph, driver, &mut visited, &mut stack);
            }
        }
    }
    log::debug!("{created} branching pin nodes inserted");
    Ok(created)
}

fn enter(graph: &Graph, node: NodeId, visited: &mut HashSet<NodeId>, stack: &mut Vec<Frame>) {
    if graph.node(node).kind == NodeKind::PinNode || !visited.insert(node) {
        return;
    }
    stack.push(Frame {
        inputs: graph.inputs_or_bidir(node),
        next: 0,
    });
}
