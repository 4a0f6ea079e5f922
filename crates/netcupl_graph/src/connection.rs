//! Connections: the ports of a node and the wires between them.

use crate::ids::{ConnId, NodeId};
use netcupl_common::Ident;

/// Direction of a connection, seen from inside its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Consumes a signal; at most one reference.
    Input,
    /// Drives a signal; any number of references.
    Output,
    /// Drives or consumes depending on context.
    Bidirectional,
}

impl Direction {
    /// Input or Bidirectional.
    pub fn is_input(self) -> bool {
        matches!(self, Direction::Input | Direction::Bidirectional)
    }

    /// Output or Bidirectional.
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output | Direction::Bidirectional)
    }
}

/// A port on a node.
///
/// `refs` holds the connections this one is wired to; every entry is
/// mirrored in the other connection's `refs`.
#[derive(Debug, Clone)]
pub struct Connection {
    /// The owning node.
    pub parent: NodeId,
    /// Signal direction.
    pub direction: Direction,
    /// Name, unique within the parent.
    pub name: Ident,
    /// Connections this one is wired to.
    pub refs: Vec<ConnId>,
}

impl Connection {
    /// Creates an unwired connection.
    pub fn new(parent: NodeId, name: Ident, direction: Direction) -> Self {
        Self {
            parent,
            direction,
            name,
            refs: Vec::new(),
        }
    }
}
