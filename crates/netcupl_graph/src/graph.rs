//! The [`Graph`] container: arenas, owning collections, and wiring primitives.
//!
//! Every mutation goes through a method that keeps reference lists mirrored:
//! when input X gains output Y as a reference, Y gains X in the same call.
//! Passes that need a cheaper, asymmetric edit use [`Graph::conn_mut`]
//! directly and are expected to restore the invariant before calling
//! [`Graph::check_all`].

use crate::arena::Arena;
use crate::connection::{Connection, Direction};
use crate::ids::{ConnId, NodeId};
use crate::node::{Node, NodeKind};
use netcupl_common::{Ident, Interner};

/// Name of the input slot of a pin node created by a pass.
pub const PIN_IN: &str = "_PIN_IN";

/// Name of the output slot of a pin node created by a pass.
pub const PIN_OUT: &str = "_PIN_OUT";

/// The netlist graph of one module.
#[derive(Debug)]
pub struct Graph {
    interner: Interner,
    nodes: Arena<NodeId, Node>,
    conns: Arena<ConnId, Connection>,
    module: NodeId,
    cells: Vec<NodeId>,
    pins: Vec<NodeId>,
    pin_nodes: Vec<NodeId>,
    top: Vec<ConnId>,
    next_pin_node: u32,
    next_constant: u32,
}

impl Graph {
    /// Creates a graph holding only the module node.
    pub fn new(module_name: &str) -> Self {
        let interner = Interner::new();
        let mut nodes = Arena::new();
        let module = nodes.alloc(Node::new(
            interner.get_or_intern(module_name),
            NodeKind::Module,
        ));
        Self {
            interner,
            nodes,
            conns: Arena::new(),
            module,
            cells: Vec::new(),
            pins: Vec::new(),
            pin_nodes: Vec::new(),
            top: Vec::new(),
            next_pin_node: 0,
            next_constant: 0,
        }
    }

    /// Interns `s`.
    pub fn intern(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    /// Resolves an interned name.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// The module node.
    pub fn module(&self) -> NodeId {
        self.module
    }

    /// Name of the module.
    pub fn module_name(&self) -> &str {
        self.node_name(self.module)
    }

    /// Returns the node with the given handle.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Returns the node with the given handle, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Returns the connection with the given handle.
    pub fn conn(&self, id: ConnId) -> &Connection {
        &self.conns[id]
    }

    /// Returns the connection with the given handle, mutably.
    pub fn conn_mut(&mut self, id: ConnId) -> &mut Connection {
        &mut self.conns[id]
    }

    /// Current name of a node.
    pub fn node_name(&self, id: NodeId) -> &str {
        self.resolve(self.nodes[id].name)
    }

    /// Name of a connection.
    pub fn conn_name(&self, id: ConnId) -> &str {
        self.resolve(self.conns[id].name)
    }

    /// `node.connection`, for diagnostics.
    pub fn conn_path(&self, id: ConnId) -> String {
        let conn = &self.conns[id];
        format!("{}.{}", self.node_name(conn.parent), self.resolve(conn.name))
    }

    /// Renames a node.
    pub fn rename_node(&mut self, id: NodeId, name: &str) {
        let ident = self.intern(name);
        self.nodes[id].name = ident;
    }

    /// Renames a connection.
    pub fn rename_conn(&mut self, id: ConnId, name: Ident) {
        self.conns[id].name = name;
    }

    /// The parent node of a connection.
    pub fn parent(&self, id: ConnId) -> NodeId {
        self.conns[id].parent
    }

    /// Kind of the node owning a connection.
    pub fn parent_kind(&self, id: ConnId) -> NodeKind {
        self.nodes[self.conns[id].parent].kind
    }

    /// Allocates a node that belongs to no collection yet.
    pub fn add_node(&mut self, name: &str, kind: NodeKind) -> NodeId {
        let ident = self.intern(name);
        self.nodes.alloc(Node::new(ident, kind))
    }

    /// Allocates a node and appends it to the cell list.
    pub fn add_cell(&mut self, name: &str, kind: NodeKind) -> NodeId {
        let id = self.add_node(name, kind);
        self.cells.push(id);
        id
    }

    /// Adds a `CONST<n>` cell with a single `OUT` output carrying `value`.
    pub fn add_constant(&mut self, value: u32) -> (NodeId, ConnId) {
        let name = format!("CONST{}", self.next_constant);
        self.next_constant += 1;
        let id = self.add_cell(&name, NodeKind::Constant);
        self.nodes[id].constant = Some(value);
        let out = self.add_connection(id, "OUT", Direction::Output);
        (id, out)
    }

    /// Appends a new pin to the pin list.
    pub fn add_pin(&mut self, name: &str) -> NodeId {
        let id = self.add_node(name, NodeKind::Pin);
        self.pins.push(id);
        id
    }

    /// Appends a new pin node to the pin-node list.
    pub fn add_pin_node(&mut self, name: &str) -> NodeId {
        let id = self.add_node(name, NodeKind::PinNode);
        self.pin_nodes.push(id);
        id
    }

    /// Returns a fresh `PN<n>` name.
    pub fn generate_name(&mut self) -> String {
        self.next_pin_node += 1;
        format!("PN{}", self.next_pin_node)
    }

    /// Appends a new, unwired connection to `parent`.
    pub fn add_connection(&mut self, parent: NodeId, name: &str, direction: Direction) -> ConnId {
        let ident = self.intern(name);
        self.add_connection_ident(parent, ident, direction)
    }

    /// Like [`Graph::add_connection`] with an already interned name.
    pub fn add_connection_ident(
        &mut self,
        parent: NodeId,
        name: Ident,
        direction: Direction,
    ) -> ConnId {
        let id = self.conns.alloc(Connection::new(parent, name, direction));
        self.nodes[parent].connections.push(id);
        id
    }

    /// Cells of the module in insertion order.
    pub fn cells(&self) -> &[NodeId] {
        &self.cells
    }

    /// Pins in creation order.
    pub fn pins(&self) -> &[NodeId] {
        &self.pins
    }

    /// Live pin nodes in creation order.
    pub fn pin_nodes(&self) -> &[NodeId] {
        &self.pin_nodes
    }

    /// The top connection list as of the last [`Graph::rebuild_top`].
    pub fn top(&self) -> &[ConnId] {
        &self.top
    }

    /// Wires `input` to `output` on both sides.
    pub fn link(&mut self, input: ConnId, output: ConnId) {
        self.conns[input].refs.push(output);
        self.conns[output].refs.push(input);
    }

    /// Removes the reference pair between `a` and `b`, if any.
    pub fn unlink(&mut self, a: ConnId, b: ConnId) {
        self.conns[a].refs.retain(|&r| r != b);
        self.conns[b].refs.retain(|&r| r != a);
    }

    /// Drops every reference of `id`, and the mirrored entries.
    pub fn clear_refs(&mut self, id: ConnId) {
        let refs = std::mem::take(&mut self.conns[id].refs);
        for r in refs {
            self.conns[r].refs.retain(|&x| x != id);
        }
    }

    /// Moves a connection from its current parent to `parent`.
    pub fn reparent(&mut self, id: ConnId, parent: NodeId) {
        let old = self.conns[id].parent;
        self.nodes[old].connections.retain(|&c| c != id);
        self.conns[id].parent = parent;
        self.nodes[parent].connections.push(id);
    }

    /// Unwires a connection and removes it from its parent.
    pub fn detach(&mut self, id: ConnId) {
        self.clear_refs(id);
        let parent = self.conns[id].parent;
        self.nodes[parent].connections.retain(|&c| c != id);
    }

    /// Returns `true` if the connection is still owned by its parent.
    pub fn is_attached(&self, id: ConnId) -> bool {
        let parent = self.conns[id].parent;
        self.nodes[parent].connections.contains(&id)
    }

    /// First connection of `node` with direction Output.
    pub fn output_of(&self, node: NodeId) -> Option<ConnId> {
        self.nodes[node]
            .connections
            .iter()
            .copied()
            .find(|&c| self.conns[c].direction == Direction::Output)
    }

    /// First Output or Bidirectional connection of `node`.
    pub fn output_or_bidir_of(&self, node: NodeId) -> Option<ConnId> {
        self.nodes[node]
            .connections
            .iter()
            .copied()
            .find(|&c| self.conns[c].direction.is_output())
    }

    /// Connections of `node` with direction Input.
    pub fn inputs(&self, node: NodeId) -> Vec<ConnId> {
        self.nodes[node]
            .connections
            .iter()
            .copied()
            .filter(|&c| self.conns[c].direction == Direction::Input)
            .collect()
    }

    /// Input and Bidirectional connections of `node`.
    pub fn inputs_or_bidir(&self, node: NodeId) -> Vec<ConnId> {
        self.nodes[node]
            .connections
            .iter()
            .copied()
            .filter(|&c| self.conns[c].direction.is_input())
            .collect()
    }

    /// The connection driving `input`, if it is wired.
    pub fn driver(&self, input: ConnId) -> Option<ConnId> {
        self.conns[input].refs.first().copied()
    }

    /// Fan-out of `output`.
    pub fn fan_out(&self, output: ConnId) -> usize {
        self.conns[output].refs.len()
    }

    /// Removes a node from the cell list.
    pub fn remove_cell(&mut self, id: NodeId) {
        self.cells.retain(|&c| c != id);
    }

    /// Logically deletes a node: unwires and drops its connections, then
    /// removes it from the cell, pin, and pin-node lists.
    pub fn retire_node(&mut self, id: NodeId) {
        let conns = std::mem::take(&mut self.nodes[id].connections);
        for c in conns {
            self.clear_refs(c);
        }
        self.cells.retain(|&c| c != id);
        self.pins.retain(|&c| c != id);
        self.pin_nodes.retain(|&c| c != id);
    }

    /// Recomputes the top connection list.
    ///
    /// Pin nodes whose output has no consumer are retired first. The list then
    /// holds the wired input and bidirectional connections of every pin, every
    /// pin node, and every Dff/Latch/TBUF cell, in that order.
    pub fn rebuild_top(&mut self) {
        let dead: Vec<NodeId> = self
            .pin_nodes
            .iter()
            .copied()
            .filter(|&p| self.output_of(p).map_or(true, |o| self.conns[o].refs.is_empty()))
            .collect();
        for p in dead {
            log::debug!("dropping unreferenced pin node {}", self.node_name(p));
            self.retire_node(p);
        }

        let owners = self
            .pins
            .iter()
            .chain(self.pin_nodes.iter())
            .copied()
            .chain(
                self.cells
                    .iter()
                    .copied()
                    .filter(|&c| self.nodes[c].kind.is_sequential()),
            );
        let mut top = Vec::new();
        for node in owners {
            for &c in &self.nodes[node].connections {
                let conn = &self.conns[c];
                if conn.direction.is_input() && !conn.refs.is_empty() {
                    top.push(c);
                }
            }
        }
        self.top = top;
    }
}
