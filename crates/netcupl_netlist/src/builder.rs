//! Builds a [`Graph`] from one module of a Yosys document.
//!
//! Wire identity comes from bit-ids: every bit has exactly one driving
//! output (a module input port, a cell output, or a synthesized constant)
//! and any number of consuming inputs. The builder creates all connections
//! first, then resolves each consumer through the bit → driver table.

use crate::cell_types::{cell_kind, cupl_port_name, parse_direction, register_port_direction};
use crate::json::{BitRef, YosysCell, YosysDocument, YosysModule, YosysPort};
use netcupl_common::{CuplResult, FormatError};
use netcupl_graph::{ConnId, Direction, Graph, NodeId, NodeKind};
use std::collections::HashMap;

/// Picks the module to compile.
///
/// With a name the module must exist; without one the document must define
/// exactly one.
pub fn select_module<'a>(
    doc: &'a YosysDocument,
    name: Option<&str>,
) -> Result<(&'a str, &'a YosysModule), FormatError> {
    match name {
        Some(name) => doc
            .modules
            .get_key_value(name)
            .map(|(k, m)| (k.as_str(), m))
            .ok_or_else(|| FormatError::ModuleNotFound(name.to_string())),
        None => {
            let mut modules = doc.modules.iter();
            match (modules.next(), modules.next()) {
                (None, _) => Err(FormatError::NoModules),
                (Some((k, m)), None) => Ok((k.as_str(), m)),
                (Some(_), Some(_)) => Err(FormatError::AmbiguousModule(doc.modules.len())),
            }
        }
    }
}

/// Parses `text` and builds the graph of the selected module.
pub fn build_graph(text: &str, module: Option<&str>) -> CuplResult<Graph> {
    let doc = crate::json::parse_document(text)?;
    let (name, module) = select_module(&doc, module)?;
    build_module(name, module)
}

/// Builds the graph of one module.
pub fn build_module(name: &str, module: &YosysModule) -> CuplResult<Graph> {
    let mut builder = NetlistBuilder::new(name);
    for (port_name, port) in &module.ports {
        builder.add_port(port_name, port)?;
    }
    for (cell_name, cell) in &module.cells {
        builder.add_cell(cell_name, cell)?;
    }
    builder.link()?;
    builder.apply_netnames(module);
    let graph = builder.graph;
    log::info!(
        "built module {}: {} cells, {} ports",
        graph.module_name(),
        graph.cells().len(),
        graph.node(graph.module()).connections.len()
    );
    Ok(graph)
}

/// A consumer waiting for its driver.
struct Pending {
    conn: ConnId,
    bit: i64,
    path: String,
}

struct NetlistBuilder {
    graph: Graph,
    prefix: String,
    drivers: HashMap<i64, ConnId>,
    cell_inputs: Vec<Pending>,
    port_inputs: Vec<Pending>,
    registers: HashMap<i64, NodeId>,
    next_synthetic: i64,
}

impl NetlistBuilder {
    fn new(module: &str) -> Self {
        Self {
            graph: Graph::new(module),
            prefix: format!("modules.{module}"),
            drivers: HashMap::new(),
            cell_inputs: Vec::new(),
            port_inputs: Vec::new(),
            registers: HashMap::new(),
            next_synthetic: -1,
        }
    }

    fn add_port(&mut self, name: &str, port: &YosysPort) -> CuplResult<()> {
        let path = format!("{}.ports.{name}", self.prefix);
        // The module drives what the outside world reads, and vice versa.
        let direction = match parse_direction(&port.direction) {
            Some(Direction::Input) => Direction::Output,
            Some(Direction::Output) => Direction::Input,
            Some(Direction::Bidirectional) => Direction::Bidirectional,
            None => {
                return Err(FormatError::UnsupportedDirection {
                    path: format!("{path}.direction"),
                    direction: port.direction.clone(),
                }
                .into())
            }
        };

        let module = self.graph.module();
        let multi = port.bits.len() > 1;
        for (ix, bit) in port.bits.iter().enumerate() {
            let conn_name = if multi {
                format!("{name}{ix}")
            } else {
                name.to_string()
            };
            let conn = self.graph.add_connection(module, &conn_name, direction);
            let bit_path = format!("{path}.bits.{ix}");
            self.bind(conn, direction, bit, bit_path, false)?;
        }
        Ok(())
    }

    fn add_cell(&mut self, name: &str, cell: &YosysCell) -> CuplResult<()> {
        let path = format!("{}.cells.{name}", self.prefix);
        let kind = cell_kind(&cell.cell_type).ok_or_else(|| FormatError::UnknownCellType {
            path: format!("{path}.type"),
            cell_type: cell.cell_type.clone(),
        })?;
        let node = self.graph.add_cell(name, kind);

        for (port, bits) in &cell.connections {
            let port_path = format!("{path}.connections.{port}");
            let [bit] = bits.as_slice() else {
                return Err(FormatError::Malformed {
                    path: port_path,
                    message: format!("expected exactly one bit, found {}", bits.len()),
                }
                .into());
            };

            let conn_name = cupl_port_name(kind, port);
            let direction = if kind.is_register() {
                register_port_direction(conn_name).ok_or_else(|| FormatError::UnknownPort {
                    path: path.clone(),
                    port: port.clone(),
                })?
            } else {
                let declared = cell.port_directions.get(port).ok_or_else(|| {
                    FormatError::Malformed {
                        path: format!("{path}.port_directions"),
                        message: format!("no direction for port '{port}'"),
                    }
                })?;
                parse_direction(declared).ok_or_else(|| FormatError::UnsupportedDirection {
                    path: format!("{path}.port_directions.{port}"),
                    direction: declared.clone(),
                })?
            };

            let conn = self.graph.add_connection(node, conn_name, direction);
            if kind.is_register() && direction == Direction::Output {
                if let BitRef::Bit(b) = bit {
                    self.registers.insert(*b, node);
                }
            }
            self.bind(conn, direction, bit, port_path, true)?;
        }
        Ok(())
    }

    /// Records the bit of a new connection: drivers go into the lookup table,
    /// consumers into the pending list, and literals get a constant driver.
    fn bind(
        &mut self,
        conn: ConnId,
        direction: Direction,
        bit: &BitRef,
        path: String,
        is_cell: bool,
    ) -> CuplResult<()> {
        let bit = match bit {
            BitRef::Bit(b) => *b,
            BitRef::Literal(literal) => {
                if direction != Direction::Input {
                    return Err(FormatError::ConstantOnNonInput { path }.into());
                }
                let value: u32 = literal.parse().map_err(|_| FormatError::BadConstant {
                    path: path.clone(),
                    literal: literal.clone(),
                })?;
                let (_, out) = self.graph.add_constant(value);
                let synthetic = self.next_synthetic;
                self.next_synthetic -= 1;
                self.drivers.insert(synthetic, out);
                synthetic
            }
        };

        if direction == Direction::Output {
            if self.drivers.insert(bit, conn).is_some() {
                return Err(FormatError::AmbiguousDriver { bit }.into());
            }
        } else {
            let pending = Pending { conn, bit, path };
            if is_cell {
                self.cell_inputs.push(pending);
            } else {
                self.port_inputs.push(pending);
            }
        }
        Ok(())
    }

    fn link(&mut self) -> CuplResult<()> {
        let pending = std::mem::take(&mut self.cell_inputs)
            .into_iter()
            .chain(std::mem::take(&mut self.port_inputs));
        for Pending { conn, bit, path } in pending {
            let driver = *self
                .drivers
                .get(&bit)
                .ok_or(FormatError::UndrivenBit { path, bit })?;
            self.graph.link(conn, driver);
        }
        Ok(())
    }

    /// Renames registers after the nets their outputs drive. Nets Yosys
    /// named itself are skipped so user names win.
    fn apply_netnames(&mut self, module: &YosysModule) {
        for (net, def) in module.netnames.iter().filter(|(_, d)| d.hide_name == 0) {
            let multi = def.bits.len() > 1;
            for (ix, bit) in def.bits.iter().enumerate() {
                let BitRef::Bit(b) = bit else {
                    continue;
                };
                if let Some(&reg) = self.registers.get(b) {
                    let name = if multi {
                        format!("{net}{ix}")
                    } else {
                        net.clone()
                    };
                    log::debug!("register {} renamed to {name}", self.graph.node_name(reg));
                    self.graph.rename_node(reg, &name);
                }
            }
        }
    }
}
