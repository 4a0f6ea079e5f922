//! CUPL source emission.
//!
//! A file consists of the header block, a banner comment, the `PIN` and
//! `PINNODE` declarations, and one equation per driven input on the top
//! list. Groups are separated by three blank lines and every line ends in
//! CRLF.

use crate::wrap::{wrap, ENDLINE, LINE_WIDTH};
use netcupl_common::{ensure, CuplResult, InvariantViolation};
use netcupl_config::{HeaderConfig, PinTable};
use netcupl_graph::{ConnId, Graph, NodeId, NodeKind, PIN_IN, PIN_OUT};
use std::collections::HashSet;
use std::fmt::Write;

/// Deepest expression nesting the generator follows.
pub const MAX_EXPRESSION_DEPTH: usize = 4096;

/// Device, header, and pin numbers for one output file.
#[derive(Debug, Clone, Copy)]
pub struct CuplTarget<'a> {
    /// WinCUPL device mnemonic.
    pub device: &'a str,
    /// Header field values.
    pub header: &'a HeaderConfig,
    /// Pin numbers by pin name.
    pub pins: &'a PinTable,
}

/// Renders the whole CUPL file.
pub(crate) fn generate_code(graph: &Graph, target: &CuplTarget<'_>) -> CuplResult<String> {
    let mut out = String::new();
    write_header(&mut out, graph, target);
    write_separator(&mut out);
    out.push_str(&format!(
        "/* The following was auto-generated by netcupl {} */",
        env!("CARGO_PKG_VERSION")
    ));
    write_separator(&mut out);
    for &pin in graph.pins() {
        let name = graph.node_name(pin);
        let number = match target.pins.get(name) {
            0 => String::new(),
            n => n.to_string(),
        };
        out.push_str(&format!("PIN  {number}  = {name};{ENDLINE}"));
    }
    write_separator(&mut out);
    for &pn in graph.pin_nodes() {
        out.push_str(&format!("PINNODE      = {};{ENDLINE}", graph.node_name(pn)));
    }
    write_separator(&mut out);
    for equation in generate_equations(graph)? {
        out.push_str(&equation);
        out.push_str(ENDLINE);
    }
    Ok(out)
}

fn write_header(out: &mut String, graph: &Graph, target: &CuplTarget<'_>) {
    for (key, value) in target.header.fields() {
        let value = if key == "Name" && value.is_empty() {
            graph.module_name()
        } else {
            value
        };
        // Name and Partno keep a space before the semicolon.
        let pad = if matches!(key, "Name" | "Partno") { " " } else { "" };
        out.push_str(&format!("{key} {value}{pad};{ENDLINE}"));
    }
    out.push_str(&format!("Device {};{ENDLINE}", target.device));
}

fn write_separator(out: &mut String) {
    for _ in 0..3 {
        out.push_str(ENDLINE);
    }
}

/// One wrapped equation per driven top-list input, in top-list order.
pub(crate) fn generate_equations(graph: &Graph) -> CuplResult<Vec<String>> {
    let mut writer = ExprWriter {
        graph,
        visited: HashSet::new(),
    };
    let mut equations = Vec::new();
    for &input in graph.top() {
        let Some(&driver) = graph
            .conn(input)
            .refs
            .iter()
            .find(|&&r| graph.conn(r).direction.is_output())
        else {
            continue;
        };
        let name = equation_name(graph, input);
        let mut text = format!("{name} = ");
        writer.expr(driver, &name, 0, &mut text)?;
        text.push(';');
        equations.push(wrap(&text, LINE_WIDTH));
    }
    Ok(equations)
}

/// Left-hand side of the equation for `input`.
fn equation_name(graph: &Graph, input: ConnId) -> String {
    let conn = graph.conn_name(input);
    let parent = graph.parent(input);
    let parent_name = graph.node_name(parent);
    match graph.node(parent).kind {
        NodeKind::Pin | NodeKind::PinNode => {
            if conn == PIN_IN || conn == PIN_OUT || conn == parent_name {
                parent_name.to_string()
            } else {
                format!("{parent_name}.{conn}")
            }
        }
        NodeKind::Module => conn.to_string(),
        _ => format!("{parent_name}.{conn}"),
    }
}

struct ExprWriter<'g> {
    graph: &'g Graph,
    /// Combinational nodes already written in this generation pass.
    visited: HashSet<NodeId>,
}

impl ExprWriter<'_> {
    fn expr(
        &mut self,
        output: ConnId,
        equation: &str,
        depth: usize,
        out: &mut String,
    ) -> CuplResult<()> {
        let graph = self.graph;
        ensure(depth < MAX_EXPRESSION_DEPTH, || InvariantViolation::ExpressionTooDeep {
            connection: equation.to_string(),
            limit: MAX_EXPRESSION_DEPTH,
        })?;
        ensure(graph.conn(output).direction.is_output(), || {
            InvariantViolation::ReferenceMismatch {
                connection: graph.conn_path(output),
                message: "expression reached a non-output connection".to_string(),
            }
        })?;

        let node_id = graph.parent(output);
        let node = graph.node(node_id);
        match node.kind {
            NodeKind::Dff | NodeKind::Latch | NodeKind::TriStateBuffer => {
                out.push_str(&graph.conn_path(output));
                return Ok(());
            }
            NodeKind::Pin | NodeKind::PinNode => {
                out.push_str(graph.node_name(node_id));
                return Ok(());
            }
            NodeKind::Module => {
                out.push_str(graph.conn_name(output));
                return Ok(());
            }
            NodeKind::Constant => {
                let value = node.constant.unwrap_or(0);
                let _ = write!(out, "'b'{value}");
                return Ok(());
            }
            NodeKind::Unknown => {
                return Err(InvariantViolation::Internal(format!(
                    "unknown combinational operator at {}",
                    graph.node_name(node_id)
                ))
                .into());
            }
            NodeKind::And | NodeKind::Or | NodeKind::Xor | NodeKind::Not => {}
        }

        ensure(self.visited.insert(node_id), || InvariantViolation::Cardinality {
            location: graph.node_name(node_id).to_string(),
            message: format!("reached twice while generating {equation}"),
        })?;

        let mut drivers = Vec::new();
        for input in graph.inputs_or_bidir(node_id) {
            let refs = &graph.conn(input).refs;
            ensure(refs.len() <= 1, || InvariantViolation::Cardinality {
                location: graph.conn_path(input),
                message: format!("input has {} drivers", refs.len()),
            })?;
            drivers.extend(refs.first().copied());
        }

        if node.kind == NodeKind::Not {
            ensure(drivers.len() == 1, || InvariantViolation::Cardinality {
                location: graph.node_name(node_id).to_string(),
                message: format!("inverter has {} connected inputs", drivers.len()),
            })?;
            out.push_str("! ( ");
            self.expr(drivers[0], equation, depth + 1, out)?;
        } else {
            ensure(drivers.len() >= 2, || InvariantViolation::Cardinality {
                location: graph.node_name(node_id).to_string(),
                message: format!("{} gate has {} connected inputs", node.kind, drivers.len()),
            })?;
            let op = node.kind.operator().unwrap_or("&");
            out.push_str(" ( ");
            for (i, &driver) in drivers.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, " {op} ");
                }
                self.expr(driver, equation, depth + 1, out)?;
            }
        }
        out.push_str(" )");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcupl_graph::Direction;

    fn gate(g: &mut Graph, name: &str, kind: NodeKind, sources: &[ConnId]) -> ConnId {
        let cell = g.add_cell(name, kind);
        for (i, &s) in sources.iter().enumerate() {
            let input = g.add_connection(cell, &format!("I{i}"), Direction::Input);
            g.link(input, s);
        }
        g.add_connection(cell, "Y", Direction::Output)
    }

    fn source_pin(g: &mut Graph, name: &str) -> ConnId {
        let pin = g.add_pin(name);
        g.add_connection(pin, name, Direction::Output)
    }

    fn sink_pin(g: &mut Graph, name: &str, driver: ConnId) -> NodeId {
        let pin = g.add_pin(name);
        let input = g.add_connection(pin, name, Direction::Input);
        g.link(input, driver);
        pin
    }

    #[test]
    fn renders_operators_and_inversion() {
        let mut g = Graph::new("top");
        let a = source_pin(&mut g, "a");
        let b = source_pin(&mut g, "b");
        let c = source_pin(&mut g, "c");
        let and = gate(&mut g, "g1", NodeKind::And, &[a, b, c]);
        let not = gate(&mut g, "g2", NodeKind::Not, &[and]);
        sink_pin(&mut g, "y", not);
        g.rebuild_top();
        assert_eq!(generate_equations(&g).unwrap(), vec!["y = ! ( ( a & b & c ) );"]);
    }

    #[test]
    fn constants_and_register_outputs_are_atoms() {
        let mut g = Graph::new("top");
        let (_, zero) = g.add_constant(0);
        let reg = g.add_cell("r", NodeKind::Dff);
        let q = g.add_connection(reg, "Q", Direction::Output);
        let xor = gate(&mut g, "g", NodeKind::Xor, &[q, zero]);
        sink_pin(&mut g, "y", xor);
        g.rebuild_top();
        assert_eq!(generate_equations(&g).unwrap(), vec!["y = ( r.Q $ 'b'0 );"]);
    }

    #[test]
    fn equation_names_follow_parent_kind() {
        let mut g = Graph::new("top");
        let a = source_pin(&mut g, "a");
        let q = g.add_pin("q");
        for port in ["D", "q"] {
            let input = g.add_connection(q, port, Direction::Input);
            g.link(input, a);
        }
        let pn = g.add_pin_node("PN1");
        let pn_in = g.add_connection(pn, PIN_IN, Direction::Input);
        g.link(pn_in, a);
        let latch = g.add_cell("l", NodeKind::Latch);
        let le = g.add_connection(latch, "LE", Direction::Input);
        g.link(le, a);
        let module_in = g.add_connection(g.module(), "m", Direction::Input);
        g.link(module_in, a);

        let names: Vec<String> = [q, pn, latch]
            .iter()
            .flat_map(|&n| g.inputs(n))
            .chain([module_in])
            .map(|c| equation_name(&g, c))
            .collect();
        assert_eq!(names, vec!["q.D", "q", "PN1", "l.LE", "m"]);
    }

    #[test]
    fn gate_reached_twice_is_fatal() {
        let mut g = Graph::new("top");
        let a = source_pin(&mut g, "a");
        let not = gate(&mut g, "n", NodeKind::Not, &[a]);
        sink_pin(&mut g, "x", not);
        sink_pin(&mut g, "y", not);
        g.rebuild_top();
        let err = generate_equations(&g).unwrap_err();
        assert!(format!("{err}").contains("reached twice"));
    }

    #[test]
    fn single_input_and_is_fatal() {
        let mut g = Graph::new("top");
        let a = source_pin(&mut g, "a");
        let and = gate(&mut g, "g", NodeKind::And, &[a]);
        sink_pin(&mut g, "y", and);
        g.rebuild_top();
        assert!(generate_equations(&g).is_err());
    }

    #[test]
    fn deep_chain_is_rejected_not_overflowed() {
        let mut g = Graph::new("top");
        let mut out = source_pin(&mut g, "a");
        for i in 0..MAX_EXPRESSION_DEPTH + 1 {
            out = gate(&mut g, &format!("n{i}"), NodeKind::Not, &[out]);
        }
        sink_pin(&mut g, "y", out);
        g.rebuild_top();
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(move || generate_equations(&g).map(|_| ()))
            .unwrap();
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(
            err,
            netcupl_common::CompileError::Invariant(InvariantViolation::ExpressionTooDeep { .. })
        ));
    }

    #[test]
    fn file_layout() {
        let mut g = Graph::new("top");
        let a = source_pin(&mut g, "a");
        let pn = g.add_pin_node("PN1");
        let pn_in = g.add_connection(pn, PIN_IN, Direction::Input);
        let pn_out = g.add_connection(pn, PIN_OUT, Direction::Output);
        g.link(pn_in, a);
        sink_pin(&mut g, "y", pn_out);
        g.rebuild_top();

        let mut pins = PinTable::new();
        pins.insert("a", 2);
        let header = HeaderConfig::default();
        let target = CuplTarget {
            device: "g22v10",
            header: &header,
            pins: &pins,
        };
        let text = generate_code(&g, &target).unwrap();
        let banner = format!(
            "/* The following was auto-generated by netcupl {} */",
            env!("CARGO_PKG_VERSION")
        );
        let expected = [
            "Name top ;",
            "Partno 00 ;",
            "Date ;",
            "Revision 01;",
            "Designer Engineer;",
            "Company None;",
            "Assembly None;",
            "Location ;",
            "Device g22v10;",
            "",
            "",
            "",
            banner.as_str(),
            "",
            "",
            "PIN  2  = a;",
            "PIN    = y;",
            "",
            "",
            "",
            "PINNODE      = PN1;",
            "",
            "",
            "",
            "y = PN1;",
            "PN1 = a;",
            "",
        ]
        .join(ENDLINE);
        assert_eq!(text, expected);
        assert!(!text.replace(ENDLINE, "").contains('\n'));
    }
}
