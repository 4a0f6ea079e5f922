//! Cell-type table and the per-kind port conventions of the CUPL target.

use netcupl_graph::{Direction, NodeKind};

const CELL_TYPES: &[(&str, NodeKind)] = &[
    ("$_AND_", NodeKind::And),
    ("$_OR_", NodeKind::Or),
    ("$_XOR_", NodeKind::Xor),
    ("$_NOT_", NodeKind::Not),
    ("$_TBUF_", NodeKind::TriStateBuffer),
    ("FDCP", NodeKind::Dff),
    ("LDCP", NodeKind::Latch),
];

/// Register ports that consume a signal. `D`/`L` is data, `CK`/`LE` the
/// clock or enable, and `AR`/`AP`/`PRE`/`CLR` the asynchronous controls.
const REGISTER_INPUTS: &[&str] = &["CK", "AR", "AP", "D", "LE", "L", "PRE", "CLR"];

/// Maps a Yosys cell type to a node kind.
pub fn cell_kind(cell_type: &str) -> Option<NodeKind> {
    CELL_TYPES
        .iter()
        .find(|(name, _)| *name == cell_type)
        .map(|&(_, kind)| kind)
}

/// Renames a cell port to the suffix CUPL uses for it.
pub fn cupl_port_name(kind: NodeKind, port: &str) -> &str {
    match (kind, port) {
        (NodeKind::Latch, "D") => "L",
        (NodeKind::Latch, "G") => "LE",
        (NodeKind::TriStateBuffer, "E") => "OE",
        _ => port,
    }
}

/// Direction of a flip-flop or latch port, after renaming.
///
/// Library cells carry no `port_directions`, so the direction is fixed by
/// name; `None` means the name has no CUPL suffix.
pub fn register_port_direction(port: &str) -> Option<Direction> {
    if port == "Q" {
        Some(Direction::Output)
    } else if REGISTER_INPUTS.contains(&port) {
        Some(Direction::Input)
    } else {
        None
    }
}

/// Parses a Yosys direction string, as written (no inversion).
pub fn parse_direction(direction: &str) -> Option<Direction> {
    match direction {
        "input" => Some(Direction::Input),
        "output" => Some(Direction::Output),
        "inout" => Some(Direction::Bidirectional),
        _ => None,
    }
}
