//! The netlist graph shared by the builder, the rewrite passes, and the code
//! generator.
//!
//! Nodes and connections live in two arenas and refer to each other by
//! [`NodeId`] and [`ConnId`] handles, which lets an input and the output it is
//! wired to point at each other without shared ownership. The [`Graph`]
//! container additionally tracks the cell list, the pins and pin nodes created
//! by the passes, and the top-level connection list that the code generator
//! walks.

#![warn(missing_docs)]

pub mod arena;
pub mod check;
pub mod connection;
pub mod graph;
pub mod ids;
pub mod loops;
pub mod node;

pub use arena::{Arena, ArenaId};
pub use connection::{Connection, Direction};
pub use graph::{Graph, PIN_IN, PIN_OUT};
pub use ids::{ConnId, NodeId};
pub use loops::find_combinational_loop;
pub use node::{Node, NodeKind, ProcessState};
