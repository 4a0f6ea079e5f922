//! Rewrite passes and CUPL code generation for netcupl.
//!
//! A [`Compiler`] owns the graph of one module and drives it through the
//! pipeline:
//!
//! 1. **Loop check**: combinational cycles are rejected up front
//! 2. **Branching**: ports become pins, shared combinational outputs get
//!    pin nodes
//! 3. **Simplification**: forwarding pin nodes are spliced out, latch
//!    preset/clear inputs tied low are dropped
//! 4. **Collapse**: tri-state buffers, flip-flops, and latches merge into
//!    the pins and pin nodes they drive
//! 5. **Expansion** (optional): combinational pin nodes above the
//!    configured limit are inlined into their consumers
//! 6. **Code generation**: pin names are sanitized and the CUPL file is
//!    rendered
//!
//! # Usage
//!
//! ```ignore
//! use netcupl_synth::{compile, CompileOptions};
//! let pld = compile(&json_text, None, &CompileOptions::default())?;
//! ```

#![warn(missing_docs)]

mod branching;
mod codegen;
mod collapse;
mod expand;
mod pass;
mod sanitize;
mod simplify;
mod splice;
mod wrap;
pub mod yosys_script;

#[cfg(test)]
pub(crate) mod test_util;

use netcupl_common::{CuplResult, InvariantViolation};
use netcupl_config::{HeaderConfig, PinTable, DEFAULT_DEVICE};
use netcupl_graph::{find_combinational_loop, Graph};
use pass::run_pass;

pub use codegen::{CuplTarget, MAX_EXPRESSION_DEPTH};
pub use sanitize::sanitize_name;
pub use wrap::{wrap, ENDLINE, LINE_WIDTH};
pub use yosys_script::YosysScript;

/// Everything the pipeline needs besides the netlist itself.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// WinCUPL device mnemonic written into the header.
    pub device: String,
    /// Header field values.
    pub header: HeaderConfig,
    /// Pin numbers by pin name.
    pub pins: PinTable,
    /// Maximum number of pin nodes; `None` disables expansion.
    pub pinnode_limit: Option<usize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            header: HeaderConfig::default(),
            pins: PinTable::new(),
            pinnode_limit: None,
        }
    }
}

/// Drives one module graph through the rewrite passes.
///
/// The stage methods can be called one at a time, which is how the CLI
/// produces its intermediate dumps; [`Compiler::compile`] runs them all.
#[derive(Debug)]
pub struct Compiler {
    graph: Graph,
    options: CompileOptions,
}

impl Compiler {
    /// Wraps an already built graph.
    pub fn new(graph: Graph, options: CompileOptions) -> Self {
        Self { graph, options }
    }

    /// Builds the graph of `module` (or the only module) from Yosys JSON.
    pub fn from_json(
        json: &str,
        module: Option<&str>,
        options: CompileOptions,
    ) -> CuplResult<Self> {
        let graph = netcupl_netlist::build_graph(json, module)?;
        Ok(Self::new(graph, options))
    }

    /// The graph in its current state.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The options this compiler was created with.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Fails if combinational cells form a cycle.
    pub fn check_loops(&self) -> CuplResult<()> {
        match find_combinational_loop(&self.graph) {
            None => Ok(()),
            Some(cycle) => {
                let nodes = cycle
                    .iter()
                    .map(|&n| self.graph.node_name(n))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(InvariantViolation::CombinationalLoop { nodes }.into())
            }
        }
    }

    /// Creates pins for the module ports and pin nodes at fan-out points.
    pub fn generate_branching_nodes(&mut self) -> CuplResult<bool> {
        run_pass(&branching::BranchingPass, &mut self.graph)
    }

    /// Splices out forwarding pin nodes and strips tied-low latch controls.
    pub fn simplify_connections(&mut self) -> CuplResult<bool> {
        run_pass(&simplify::SimplifyPass, &mut self.graph)
    }

    /// Merges tri-state buffers, flip-flops, and latches into pins.
    pub fn collapse_nodes(&mut self) -> CuplResult<bool> {
        run_pass(&collapse::CollapsePass, &mut self.graph)
    }

    /// Inlines combinational pin nodes above the configured limit. Does
    /// nothing when no limit is set.
    pub fn expand_combinational_pin_nodes(&mut self) -> CuplResult<bool> {
        match self.options.pinnode_limit {
            Some(limit) => run_pass(&expand::ExpandPass { limit }, &mut self.graph),
            None => Ok(false),
        }
    }

    /// Replaces characters CUPL does not accept in pin and pin-node names.
    pub fn fix_pin_names(&mut self) {
        sanitize::fix_pin_names(&mut self.graph);
    }

    /// Renders the graph as a CUPL file.
    pub fn generate_code(&self) -> CuplResult<String> {
        let target = CuplTarget {
            device: &self.options.device,
            header: &self.options.header,
            pins: &self.options.pins,
        };
        codegen::generate_code(&self.graph, &target)
    }

    /// Runs every stage and returns the CUPL file.
    pub fn compile(mut self) -> CuplResult<String> {
        self.check_loops()?;
        self.generate_branching_nodes()?;
        self.simplify_connections()?;
        self.collapse_nodes()?;
        self.expand_combinational_pin_nodes()?;
        self.fix_pin_names();
        self.generate_code()
    }
}

/// Compiles a Yosys JSON netlist to CUPL source text.
pub fn compile(json: &str, module: Option<&str>, options: &CompileOptions) -> CuplResult<String> {
    Compiler::from_json(json, module, options.clone())?.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcupl_common::CompileError;

    const SINGLE_AND: &str = r#"{"modules": {"top": {
        "ports": {
            "a": {"direction": "input", "bits": [2]},
            "b": {"direction": "input", "bits": [3]},
            "y": {"direction": "output", "bits": [4]}
        },
        "cells": {
            "g": {"type": "$_AND_", "port_directions": {"A": "input", "B": "input", "Y": "output"},
                  "connections": {"A": [2], "B": [3], "Y": [4]}}
        }
    }}}"#;

    #[test]
    fn compile_single_gate() {
        let text = compile(SINGLE_AND, None, &CompileOptions::default()).unwrap();
        assert!(text.starts_with("Name top ;\r\n"));
        assert!(text.contains("Device virtual;\r\n"));
        assert!(text.ends_with("\r\ny = ( a & b );\r\n"));
    }

    #[test]
    fn stages_report_changes() {
        let mut c = Compiler::from_json(SINGLE_AND, None, CompileOptions::default()).unwrap();
        c.check_loops().unwrap();
        assert!(c.generate_branching_nodes().unwrap());
        assert!(!c.simplify_connections().unwrap());
        assert!(!c.collapse_nodes().unwrap());
        assert!(!c.expand_combinational_pin_nodes().unwrap());
        assert_eq!(c.graph().pins().len(), 3);
    }

    const RING: &str = r#"{"modules": {"top": {
        "ports": {"y": {"direction": "output", "bits": [3]}},
        "cells": {
            "n1": {"type": "$_NOT_", "port_directions": {"A": "input", "Y": "output"},
                   "connections": {"A": [3], "Y": [2]}},
            "n2": {"type": "$_NOT_", "port_directions": {"A": "input", "Y": "output"},
                   "connections": {"A": [2], "Y": [3]}}
        }
    }}}"#;

    #[test]
    fn combinational_loop_is_rejected_before_passes() {
        let err = compile(RING, None, &CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::Invariant(InvariantViolation::CombinationalLoop {
                nodes: "n1, n2".to_string()
            })
        );
    }

    #[test]
    fn pin_numbers_and_device_reach_the_output() {
        let mut options = CompileOptions {
            device: "g16v8".to_string(),
            ..CompileOptions::default()
        };
        options.pins.insert("a", 2);
        options.pins.insert("y", 19);
        options.header.name = "andgate".to_string();
        let text = compile(SINGLE_AND, None, &options).unwrap();
        assert!(text.starts_with("Name andgate ;\r\n"));
        assert!(text.contains("PIN  2  = a;\r\nPIN    = b;\r\nPIN  19  = y;\r\n"));
        assert!(text.contains("Device g16v8;"));
    }
}
