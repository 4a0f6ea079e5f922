//! Serde model of the Yosys `write_json` document.
//!
//! Only the keys that establish graph structure are modeled; `attributes`,
//! `parameters`, and friends are ignored. Objects are read into `BTreeMap`s
//! so every later walk sees ports, cells, and nets in name order.

use netcupl_common::FormatError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The whole netlist document.
#[derive(Debug, Deserialize)]
pub struct YosysDocument {
    /// Modules by name.
    #[serde(default)]
    pub modules: BTreeMap<String, YosysModule>,
}

/// One module of the document.
#[derive(Debug, Default, Deserialize)]
pub struct YosysModule {
    /// Top-level ports by name.
    #[serde(default)]
    pub ports: BTreeMap<String, YosysPort>,
    /// Cell instances by name.
    #[serde(default)]
    pub cells: BTreeMap<String, YosysCell>,
    /// Net-name metadata by name.
    #[serde(default)]
    pub netnames: BTreeMap<String, YosysNetname>,
}

/// A module port.
#[derive(Debug, Deserialize)]
pub struct YosysPort {
    /// `input`, `output`, or `inout`, seen from outside the module.
    pub direction: String,
    /// One entry per signal bit.
    pub bits: Vec<BitRef>,
}

/// A cell instance.
#[derive(Debug, Deserialize)]
pub struct YosysCell {
    /// Primitive type, e.g. `$_AND_` or `FDCP`.
    #[serde(rename = "type")]
    pub cell_type: String,
    /// Port directions; absent for library cells such as `FDCP`.
    #[serde(default)]
    pub port_directions: BTreeMap<String, String>,
    /// Port bindings.
    #[serde(default)]
    pub connections: BTreeMap<String, Vec<BitRef>>,
}

/// Net-name metadata.
#[derive(Debug, Deserialize)]
pub struct YosysNetname {
    /// Non-zero for names Yosys generated itself.
    #[serde(default)]
    pub hide_name: u8,
    /// Bits carried by the net.
    #[serde(default)]
    pub bits: Vec<BitRef>,
}

/// A wire reference: a bit-id, or a literal such as `"0"`, `"1"`, or `"x"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BitRef {
    /// Bit-id of a wire.
    Bit(i64),
    /// Literal constant.
    Literal(String),
}

/// Parses a netlist document.
pub fn parse_document(text: &str) -> Result<YosysDocument, FormatError> {
    serde_json::from_str(text).map_err(|e| FormatError::Syntax {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })
}
