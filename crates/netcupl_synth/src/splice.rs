//! Rewiring primitives shared by the passes.

use netcupl_common::{ensure, CuplResult, InvariantViolation};
use netcupl_graph::{ConnId, Direction, Graph, NodeId, PIN_IN, PIN_OUT};

/// Splices a new pin node between `output` and all of its consumers.
///
/// The pin node is named after the driving register when `output` belongs to
/// a Dff or Latch, and gets a generated name otherwise. Afterwards `output`
/// drives only the new `_PIN_IN`, and every former consumer is driven by the
/// new `_PIN_OUT`.
pub(crate) fn insert_pin_node(graph: &mut Graph, output: ConnId) -> CuplResult<NodeId> {
    ensure(graph.conn(output).direction.is_output(), || {
        InvariantViolation::Internal(format!(
            "cannot create a pin node on {}",
            graph.conn_path(output)
        ))
    })?;

    let driver = graph.parent(output);
    let name = if graph.node(driver).kind.is_register() {
        graph.node_name(driver).to_string()
    } else {
        graph.generate_name()
    };
    let pin_node = graph.add_pin_node(&name);
    let new_out = graph.add_connection(pin_node, PIN_OUT, Direction::Output);
    let new_in = graph.add_connection(pin_node, PIN_IN, Direction::Input);

    let consumers = std::mem::take(&mut graph.conn_mut(output).refs);
    for consumer in consumers {
        let conn = graph.conn(consumer);
        ensure(conn.direction.is_input() && conn.refs.len() <= 1, || {
            InvariantViolation::Cardinality {
                location: graph.conn_path(consumer),
                message: "consumer must be an input with a single driver".to_string(),
            }
        })?;
        let conn = graph.conn_mut(consumer);
        conn.refs.clear();
        conn.refs.push(new_out);
        graph.conn_mut(new_out).refs.push(consumer);
    }
    graph.link(new_in, output);

    log::debug!("pin node {name} inserted after {}", graph.conn_path(output));
    Ok(pin_node)
}

/// Moves every consumer of `output` onto the output of `target`.
///
/// `target` gets a `_PIN_OUT` when it has no output yet. Consumers owned by
/// `target` itself are unwired instead of redirected. On return `output` has
/// no references.
pub(crate) fn redirect_consumers(
    graph: &mut Graph,
    target: NodeId,
    output: ConnId,
) -> CuplResult<()> {
    ensure(graph.conn(output).direction.is_output(), || {
        InvariantViolation::Internal(format!(
            "cannot redirect consumers of {}",
            graph.conn_path(output)
        ))
    })?;

    let consumers = std::mem::take(&mut graph.conn_mut(output).refs);
    if consumers.is_empty() {
        return Ok(());
    }
    let target_out = match graph.output_of(target) {
        Some(out) => out,
        None => graph.add_connection(target, PIN_OUT, Direction::Output),
    };
    for consumer in consumers {
        let conn = graph.conn_mut(consumer);
        conn.refs.retain(|&r| r != output);
        if conn.parent == target {
            continue;
        }
        conn.refs.clear();
        conn.refs.push(target_out);
        if !graph.conn(target_out).refs.contains(&consumer) {
            graph.conn_mut(target_out).refs.push(consumer);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcupl_graph::NodeKind;

    #[test]
    fn pin_node_takes_over_fan_out() {
        let mut g = Graph::new("top");
        let and = g.add_cell("g", NodeKind::And);
        let y = g.add_connection(and, "Y", Direction::Output);
        let mut consumers = Vec::new();
        for name in ["p", "q", "r"] {
            let pin = g.add_pin(name);
            let input = g.add_connection(pin, name, Direction::Input);
            g.link(input, y);
            consumers.push(input);
        }

        let pn = insert_pin_node(&mut g, y).unwrap();
        assert_eq!(g.node_name(pn), "PN1");
        let pn_out = g.output_of(pn).unwrap();
        let pn_in = g.inputs(pn)[0];
        assert_eq!(g.conn(y).refs, vec![pn_in]);
        assert_eq!(g.conn(pn_out).refs, consumers);
        for c in consumers {
            assert_eq!(g.driver(c), Some(pn_out));
        }
        g.check_all().unwrap();
    }

    #[test]
    fn register_pin_node_keeps_register_name() {
        let mut g = Graph::new("top");
        let r = g.add_cell("count0", NodeKind::Dff);
        let q = g.add_connection(r, "Q", Direction::Output);
        let pn = insert_pin_node(&mut g, q).unwrap();
        assert_eq!(g.node_name(pn), "count0");
    }

    #[test]
    fn redirect_creates_output_and_skips_own_inputs() {
        let mut g = Graph::new("top");
        let src = g.add_cell("src", NodeKind::Or);
        let y = g.add_connection(src, "Y", Direction::Output);
        let target = g.add_pin("t");
        let own = g.add_connection(target, "t", Direction::Input);
        let other = g.add_pin("o");
        let other_in = g.add_connection(other, "o", Direction::Input);
        g.link(own, y);
        g.link(other_in, y);

        redirect_consumers(&mut g, target, y).unwrap();
        let t_out = g.output_of(target).unwrap();
        assert_eq!(g.conn_name(t_out), PIN_OUT);
        assert!(g.conn(y).refs.is_empty());
        assert!(g.conn(own).refs.is_empty());
        assert_eq!(g.conn(t_out).refs, vec![other_in]);
        assert_eq!(g.driver(other_in), Some(t_out));
        g.check_all().unwrap();
    }
}
