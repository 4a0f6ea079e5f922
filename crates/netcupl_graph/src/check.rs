//! Structural consistency checks.

use crate::connection::Direction;
use crate::graph::Graph;
use crate::ids::NodeId;
use netcupl_common::{ensure, CuplResult, InvariantViolation};

impl Graph {
    /// Verifies the wiring rules for every connection of `node`:
    ///
    /// - the connection's parent is `node`;
    /// - an Output references only Input/Bidirectional connections;
    /// - an Input has at most one reference, to an Output/Bidirectional;
    /// - every reference is mirrored.
    pub fn check_node(&self, node: NodeId) -> CuplResult<()> {
        for &c in &self.node(node).connections {
            let conn = self.conn(c);
            ensure(conn.parent == node, || InvariantViolation::ReferenceMismatch {
                connection: self.conn_path(c),
                message: format!("connection is listed on {}", self.node_name(node)),
            })?;

            if conn.direction == Direction::Input {
                ensure(conn.refs.len() <= 1, || InvariantViolation::Cardinality {
                    location: self.conn_path(c),
                    message: format!("input has {} drivers", conn.refs.len()),
                })?;
            }

            for &r in &conn.refs {
                let other = self.conn(r);
                let compatible = match conn.direction {
                    Direction::Output => other.direction.is_input(),
                    Direction::Input => other.direction.is_output(),
                    Direction::Bidirectional => true,
                };
                ensure(compatible, || InvariantViolation::ReferenceMismatch {
                    connection: self.conn_path(c),
                    message: format!("references {} of the same direction", self.conn_path(r)),
                })?;
                ensure(other.refs.contains(&c), || {
                    InvariantViolation::ReferenceMismatch {
                        connection: self.conn_path(c),
                        message: format!("{} does not reference it back", self.conn_path(r)),
                    }
                })?;
            }
        }
        Ok(())
    }

    /// Runs [`Graph::check_node`] on every pin, pin node, and cell.
    pub fn check_all(&self) -> CuplResult<()> {
        for &node in self
            .pins()
            .iter()
            .chain(self.pin_nodes())
            .chain(self.cells())
        {
            self.check_node(node)?;
        }
        Ok(())
    }
}
