//! Node kinds, the merge bitmask, and the node record itself.

use crate::ids::ConnId;
use netcupl_common::Ident;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// The closed set of node kinds in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The top-level module; owns the port connections until pins are created.
    Module,
    /// Two-or-more input AND gate.
    And,
    /// Two-or-more input OR gate.
    Or,
    /// Two-or-more input XOR gate.
    Xor,
    /// Inverter.
    Not,
    /// D flip-flop with optional asynchronous reset and preset.
    Dff,
    /// Transparent latch.
    Latch,
    /// Tri-state buffer.
    TriStateBuffer,
    /// Literal 0/1 driver.
    Constant,
    /// Device-external signal.
    Pin,
    /// Named buried signal.
    PinNode,
    /// A node whose kind could not be determined.
    Unknown,
}

impl NodeKind {
    /// And, Or, Xor, or Not.
    pub fn is_combinational(self) -> bool {
        matches!(
            self,
            NodeKind::And | NodeKind::Or | NodeKind::Xor | NodeKind::Not
        )
    }

    /// Dff or Latch.
    pub fn is_register(self) -> bool {
        matches!(self, NodeKind::Dff | NodeKind::Latch)
    }

    /// Dff, Latch, or TriStateBuffer.
    pub fn is_sequential(self) -> bool {
        self.is_register() || self == NodeKind::TriStateBuffer
    }

    /// Pin or PinNode.
    pub fn is_named(self) -> bool {
        matches!(self, NodeKind::Pin | NodeKind::PinNode)
    }

    /// Kinds referenced by name inside an expression instead of being inlined.
    pub fn is_terminal(self) -> bool {
        self.is_sequential()
            || self.is_named()
            || matches!(self, NodeKind::Module | NodeKind::Constant)
    }

    /// The CUPL operator for a binary gate.
    pub fn operator(self) -> Option<&'static str> {
        match self {
            NodeKind::And => Some("&"),
            NodeKind::Or => Some("#"),
            NodeKind::Xor => Some("$"),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Module => "module",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Xor => "xor",
            NodeKind::Not => "not",
            NodeKind::Dff => "dff",
            NodeKind::Latch => "latch",
            NodeKind::TriStateBuffer => "tbuf",
            NodeKind::Constant => "constant",
            NodeKind::Pin => "pin",
            NodeKind::PinNode => "pinnode",
            NodeKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Which sequential elements have been folded into a node.
///
/// A node may host at most one register and at most one tri-state buffer;
/// the two flags are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProcessState(u8);

impl ProcessState {
    /// Nothing merged; the node is purely combinational.
    pub const NONE: ProcessState = ProcessState(0);
    /// A flip-flop or latch was merged into this node.
    pub const MERGED_REGISTER: ProcessState = ProcessState(1);
    /// A tri-state buffer was merged into this node.
    pub const MERGED_TBUF: ProcessState = ProcessState(2);

    /// Returns `true` if every flag in `other` is set.
    pub fn contains(self, other: ProcessState) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ProcessState {
    type Output = ProcessState;

    fn bitor(self, rhs: ProcessState) -> ProcessState {
        ProcessState(self.0 | rhs.0)
    }
}

impl BitOrAssign for ProcessState {
    fn bitor_assign(&mut self, rhs: ProcessState) {
        self.0 |= rhs.0;
    }
}

/// A node of the netlist graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name; reassigned by net-name recovery and pin sanitization.
    pub name: Ident,
    /// The node kind, fixed at creation.
    pub kind: NodeKind,
    /// Literal value of a `Constant` node.
    pub constant: Option<u32>,
    /// Owned connections in creation order.
    pub connections: Vec<ConnId>,
    /// Sequential elements merged into this node.
    pub state: ProcessState,
}

impl Node {
    /// Creates a node with no connections.
    pub fn new(name: Ident, kind: NodeKind) -> Self {
        Self {
            name,
            kind,
            constant: None,
            connections: Vec::new(),
            state: ProcessState::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classes() {
        assert!(NodeKind::Xor.is_combinational());
        assert!(!NodeKind::Constant.is_combinational());
        assert!(NodeKind::Latch.is_register());
        assert!(!NodeKind::TriStateBuffer.is_register());
        assert!(NodeKind::TriStateBuffer.is_sequential());
        assert!(NodeKind::PinNode.is_named());
        for kind in [
            NodeKind::Pin,
            NodeKind::PinNode,
            NodeKind::Dff,
            NodeKind::Latch,
            NodeKind::TriStateBuffer,
            NodeKind::Module,
            NodeKind::Constant,
        ] {
            assert!(kind.is_terminal(), "{kind} should be terminal");
        }
        assert!(!NodeKind::And.is_terminal());
    }

    #[test]
    fn operators() {
        assert_eq!(NodeKind::And.operator(), Some("&"));
        assert_eq!(NodeKind::Or.operator(), Some("#"));
        assert_eq!(NodeKind::Xor.operator(), Some("$"));
        assert_eq!(NodeKind::Not.operator(), None);
    }

    #[test]
    fn process_state_flags() {
        let mut state = ProcessState::NONE;
        assert!(state.is_none());
        state |= ProcessState::MERGED_TBUF;
        assert!(state.contains(ProcessState::MERGED_TBUF));
        assert!(!state.contains(ProcessState::MERGED_REGISTER));
        let both = state | ProcessState::MERGED_REGISTER;
        assert!(both.contains(ProcessState::MERGED_REGISTER));
        assert!(both.contains(ProcessState::MERGED_TBUF));
    }
}
