//! Merging of tri-state buffers, flip-flops, and latches into pins.
//!
//! CUPL has no freestanding register or buffer: a flip-flop is written as
//! the `.D`/`.CK`/... extensions of the pin or pin node it drives, and a
//! tri-state buffer as the `.OE` extension plus the pin equation itself.
//! This pass finds that pin (or creates a pin node) for every such cell,
//! moves the cell's inputs onto it, and retires the cell.

use crate::pass::Pass;
use crate::splice::{insert_pin_node, redirect_consumers};
use netcupl_common::{ensure, CuplResult, InvariantViolation};
use netcupl_graph::{ConnId, Graph, NodeId, NodeKind, ProcessState};

/// Data input of a tri-state buffer.
const TBUF_DATA: &str = "A";

/// Output-enable input of a tri-state buffer, after renaming.
const TBUF_ENABLE: &str = "OE";

/// Collapses every TBUF, then every Dff and Latch.
pub(crate) struct CollapsePass;

impl Pass for CollapsePass {
    fn name(&self) -> &'static str {
        "collapse"
    }

    fn run(&self, graph: &mut Graph) -> CuplResult<bool> {
        let mut merges = 0;
        for tbuf in cells_of(graph, |k| k == NodeKind::TriStateBuffer) {
            if collapse_tri_state_buffer(graph, tbuf)? {
                merges += 1;
                graph.rebuild_top();
                graph.check_all()?;
            }
        }
        for reg in cells_of(graph, NodeKind::is_register) {
            if collapse_register(graph, reg)? {
                merges += 1;
                graph.rebuild_top();
                graph.check_all()?;
            }
        }
        log::debug!("{merges} cells merged into pins and pin nodes");
        Ok(merges > 0)
    }
}

fn cells_of(graph: &Graph, pred: impl Fn(NodeKind) -> bool) -> Vec<NodeId> {
    graph
        .cells()
        .iter()
        .copied()
        .filter(|&c| pred(graph.node(c).kind))
        .collect()
}

/// Returns the output of `cell` if something consumes it.
fn live_output(graph: &Graph, cell: NodeId) -> Option<ConnId> {
    graph.output_of(cell).filter(|&o| graph.fan_out(o) > 0)
}

/// Picks the pin or pin node that `output` will be merged into.
///
/// With several consumers the target is the one Pin among them, if exactly
/// one consumer belongs to a Pin. With a single consumer it is that
/// consumer's node when it is a Pin or PinNode. Otherwise a fresh pin node
/// is spliced in after `output`.
fn merge_target(graph: &mut Graph, output: ConnId) -> CuplResult<NodeId> {
    let refs = &graph.conn(output).refs;
    let existing = if refs.len() > 1 {
        let pins: Vec<NodeId> = refs
            .iter()
            .map(|&r| graph.parent(r))
            .filter(|&p| graph.node(p).kind == NodeKind::Pin)
            .collect();
        match pins.as_slice() {
            [pin] => Some(*pin),
            _ => None,
        }
    } else {
        refs.first()
            .map(|&r| graph.parent(r))
            .filter(|&p| graph.node(p).kind.is_named())
    };
    match existing {
        Some(node) => Ok(node),
        None => insert_pin_node(graph, output),
    }
}

fn collapse_tri_state_buffer(graph: &mut Graph, tbuf: NodeId) -> CuplResult<bool> {
    let Some(output) = live_output(graph, tbuf) else {
        return Ok(false);
    };
    let target = merge_target(graph, output)?;
    ensure(
        !graph.node(target).state.contains(ProcessState::MERGED_TBUF),
        || InvariantViolation::DoubleTriStateMerge {
            node: graph.node_name(target).to_string(),
        },
    )?;

    let slots = graph.inputs_or_bidir(target);
    ensure(slots.len() == 1, || InvariantViolation::Cardinality {
        location: graph.node_name(target).to_string(),
        message: format!("merge target has {} inputs", slots.len()),
    })?;
    let slot = slots[0];
    ensure(graph.conn(slot).refs.contains(&output), || {
        InvariantViolation::ReferenceMismatch {
            connection: graph.conn_path(slot),
            message: format!("not driven by {}", graph.conn_path(output)),
        }
    })?;

    log::debug!(
        "merging tri-state buffer {} into {}",
        graph.node_name(tbuf),
        graph.node_name(target)
    );
    graph.clear_refs(slot);
    for input in graph.inputs(tbuf) {
        if graph.conn_name(input) == TBUF_DATA {
            if let Some(source) = graph.driver(input) {
                graph.unlink(input, source);
                graph.link(slot, source);
            }
        } else {
            graph.reparent(input, target);
        }
    }
    redirect_consumers(graph, target, output)?;
    graph.node_mut(target).state |= ProcessState::MERGED_TBUF;
    graph.retire_node(tbuf);
    Ok(true)
}

fn collapse_register(graph: &mut Graph, reg: NodeId) -> CuplResult<bool> {
    let Some(output) = live_output(graph, reg) else {
        return Ok(false);
    };
    let mut target = merge_target(graph, output)?;
    let state = graph.node(target).state;

    let slot = if state.contains(ProcessState::MERGED_REGISTER) {
        target = insert_pin_node(graph, output)?;
        sole_input(graph, target)?
    } else if state.contains(ProcessState::MERGED_TBUF) {
        let slot = graph
            .node(target)
            .connections
            .iter()
            .copied()
            .find(|&c| graph.conn(c).refs.contains(&output))
            .ok_or_else(|| {
                InvariantViolation::Internal(format!(
                    "{} is not driven by {}",
                    graph.node_name(target),
                    graph.conn_path(output)
                ))
            })?;
        if graph.conn_name(slot) == TBUF_ENABLE || graph.fan_out(output) > 1 {
            target = insert_pin_node(graph, output)?;
            sole_input(graph, target)?
        } else {
            slot
        }
    } else {
        sole_input(graph, target)?
    };

    log::debug!(
        "merging {} {} into {}",
        graph.node(reg).kind,
        graph.node_name(reg),
        graph.node_name(target)
    );
    graph.detach(slot);
    for input in graph.inputs(reg) {
        graph.reparent(input, target);
    }
    redirect_consumers(graph, target, output)?;
    graph.node_mut(target).state |= ProcessState::MERGED_REGISTER;
    graph.retire_node(reg);
    Ok(true)
}

fn sole_input(graph: &Graph, node: NodeId) -> CuplResult<ConnId> {
    let inputs = graph.inputs(node);
    ensure(inputs.len() == 1, || InvariantViolation::Cardinality {
        location: graph.node_name(node).to_string(),
        message: format!("merge target has {} inputs", inputs.len()),
    })?;
    Ok(inputs[0])
}
