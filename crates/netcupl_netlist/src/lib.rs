//! Yosys JSON netlist ingestion.
//!
//! [`build_graph`] parses a `write_json` document, selects one module, and
//! turns its ports, cells, and net names into a [`netcupl_graph::Graph`]
//! whose connections are wired by bit identity.

#![warn(missing_docs)]

pub mod builder;
pub mod cell_types;
pub mod json;

pub use builder::{build_graph, build_module, select_module};
pub use json::{parse_document, BitRef, YosysDocument, YosysModule};
