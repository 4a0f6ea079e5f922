//! Shared foundational types used across the netcupl compiler.
//!
//! This crate provides interned identifiers for node and connection names and
//! the error taxonomy shared by the netlist builder and the rewrite passes.

#![warn(missing_docs)]

pub mod error;
pub mod ident;

pub use error::{ensure, CompileError, CuplResult, FormatError, InvariantViolation};
pub use ident::{Ident, Interner};
