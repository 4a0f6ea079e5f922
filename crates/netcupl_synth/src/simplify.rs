//! Pass-through removal and latch control stripping.

use crate::pass::Pass;
use crate::splice::redirect_consumers;
use netcupl_common::{ensure, CuplResult, InvariantViolation};
use netcupl_graph::{ConnId, Direction, Graph, NodeKind};

/// Splices out pin nodes that only forward a signal into a single-input
/// pin or pin node, then strips latch preset/clear inputs tied to 0.
pub(crate) struct SimplifyPass;

impl Pass for SimplifyPass {
    fn name(&self) -> &'static str {
        "simplify"
    }

    fn run(&self, graph: &mut Graph) -> CuplResult<bool> {
        let mut changed = false;
        loop {
            let mut spliced = 0;
            for input in graph.top().to_vec() {
                if is_splice_candidate(graph, input) {
                    remove_adjacent_node(graph, input)?;
                    spliced += 1;
                }
            }
            graph.rebuild_top();
            if spliced == 0 {
                break;
            }
            log::debug!("spliced {spliced} forwarding pin nodes");
            changed = true;
        }
        changed |= strip_latch_controls(graph)?;
        graph.rebuild_top();
        graph.check_all()?;
        Ok(changed)
    }
}

/// `input` is a plain Input on a Pin or PinNode whose only input slot it is,
/// and it is driven by the output of a different PinNode.
fn is_splice_candidate(graph: &Graph, input: ConnId) -> bool {
    if !graph.is_attached(input) || graph.conn(input).direction != Direction::Input {
        return false;
    }
    let a = graph.parent(input);
    if !graph.node(a).kind.is_named() || graph.inputs_or_bidir(a).len() != 1 {
        return false;
    }
    let Some(driver) = graph.driver(input) else {
        return false;
    };
    let b = graph.parent(driver);
    b != a && graph.node(b).kind == NodeKind::PinNode
}

/// Removes the pin node driving `a_input`, moving its input onto the node
/// that owns `a_input`.
fn remove_adjacent_node(graph: &mut Graph, a_input: ConnId) -> CuplResult<()> {
    let a = graph.parent(a_input);
    let b_output = graph.driver(a_input).ok_or_else(|| {
        InvariantViolation::Internal(format!("{} has no driver", graph.conn_path(a_input)))
    })?;
    let b = graph.parent(b_output);
    let b_inputs = graph.inputs(b);
    ensure(b_inputs.len() == 1, || InvariantViolation::Cardinality {
        location: graph.node_name(b).to_string(),
        message: format!("pin node has {} inputs", b_inputs.len()),
    })?;
    let b_input = b_inputs[0];

    log::debug!("splicing {} into {}", graph.node_name(b), graph.node_name(a));
    let name = graph.conn(a_input).name;
    graph.detach(a_input);
    graph.rename_conn(b_input, name);
    graph.reparent(b_input, a);
    redirect_consumers(graph, a, b_output)?;

    let state = graph.node(b).state;
    graph.node_mut(a).state |= state;
    graph.retire_node(b);
    Ok(())
}

/// Removes every latch `PRE`/`CLR` input. A wired one must be driven by a
/// constant 0, which is removed with it.
fn strip_latch_controls(graph: &mut Graph) -> CuplResult<bool> {
    let latches: Vec<_> = graph
        .cells()
        .iter()
        .copied()
        .filter(|&c| graph.node(c).kind == NodeKind::Latch)
        .collect();

    let mut changed = false;
    for latch in latches {
        for input in graph.inputs(latch) {
            let control = match graph.conn_name(input) {
                "CLR" => "clear",
                "PRE" => "preset",
                _ => continue,
            };
            if let Some(driver) = graph.driver(input) {
                let source = graph.parent(driver);
                let node = graph.node(source);
                ensure(
                    node.kind == NodeKind::Constant && node.constant == Some(0),
                    || InvariantViolation::UnsupportedLatchControl {
                        latch: graph.node_name(latch).to_string(),
                        control,
                        port: graph.conn_name(input).to_string(),
                    },
                )?;
                graph.detach(input);
                if graph.fan_out(driver) == 0 {
                    graph.retire_node(source);
                }
            } else {
                graph.detach(input);
            }
            changed = true;
        }
    }
    Ok(changed)
}
