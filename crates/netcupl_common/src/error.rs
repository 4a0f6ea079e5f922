//! Error taxonomy for netlist ingestion and graph rewriting.
//!
//! Two kinds of failure abort a compilation:
//!
//! - [`FormatError`]: the input document is malformed or uses cell types,
//!   port names, or constants the compiler does not understand. These carry
//!   the position of the offending element.
//! - [`InvariantViolation`]: the netlist graph reached a state that breaks one
//!   of its structural rules, or the design uses a feature the target device
//!   cannot express. These identify the offending node or connection.
//!
//! Neither kind is recoverable; a graph left half-rewritten cannot be emitted.

/// The standard result type for compilation steps.
pub type CuplResult<T> = Result<T, CompileError>;

/// A structural problem in the input netlist document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The document is not valid JSON, or does not have the expected shape.
    #[error("invalid netlist JSON at line {line}, column {column}: {message}")]
    Syntax {
        /// 1-based line of the error.
        line: usize,
        /// 1-based column of the error.
        column: usize,
        /// Description from the JSON reader.
        message: String,
    },

    /// An element of the document has an unexpected shape.
    #[error("malformed netlist at {path}: {message}")]
    Malformed {
        /// Dotted path of the offending element.
        path: String,
        /// What was wrong with it.
        message: String,
    },

    /// A cell uses a type string outside the supported primitive set.
    #[error("unknown cell type '{cell_type}' at {path}")]
    UnknownCellType {
        /// Dotted path of the cell.
        path: String,
        /// The unrecognized type string.
        cell_type: String,
    },

    /// A flip-flop or latch uses a port name the target language has no
    /// control-signal suffix for.
    #[error("unknown port name '{port}' at {path}")]
    UnknownPort {
        /// Dotted path of the cell.
        path: String,
        /// The unrecognized port name.
        port: String,
    },

    /// A literal constant is bound to an output or bidirectional connection.
    #[error("constant value connected to non-input connection at {path}")]
    ConstantOnNonInput {
        /// Dotted path of the connection.
        path: String,
    },

    /// A literal constant is not an integer.
    #[error("unsupported constant literal '{literal}' at {path}")]
    BadConstant {
        /// Dotted path of the connection.
        path: String,
        /// The literal as written.
        literal: String,
    },

    /// A port declares a direction other than `input`, `output`, or `inout`.
    #[error("unsupported port direction '{direction}' at {path}")]
    UnsupportedDirection {
        /// Dotted path of the port.
        path: String,
        /// The direction as written.
        direction: String,
    },

    /// Two outputs drive the same bit.
    #[error("bit {bit} is driven by more than one output")]
    AmbiguousDriver {
        /// The bit-id with two drivers.
        bit: i64,
    },

    /// An input consumes a bit that nothing drives.
    #[error("bit {bit} consumed at {path} has no driver")]
    UndrivenBit {
        /// Dotted path of the consuming connection.
        path: String,
        /// The undriven bit-id.
        bit: i64,
    },

    /// The requested module is not defined in the document.
    #[error("module '{0}' not found in netlist")]
    ModuleNotFound(String),

    /// No module was requested and the document defines several.
    #[error("netlist defines {0} modules; select one by name")]
    AmbiguousModule(usize),

    /// The document defines no modules at all.
    #[error("netlist defines no modules")]
    NoModules,
}

/// A broken structural rule of the netlist graph, or a design feature the
/// target cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A reference is not mirrored, or points at a connection of the wrong
    /// direction.
    #[error("reference mismatch at {connection}: {message}")]
    ReferenceMismatch {
        /// `node.connection` where the mismatch was found.
        connection: String,
        /// Which rule was broken.
        message: String,
    },

    /// A connection or node has an unexpected number of references, inputs,
    /// or outputs.
    #[error("unexpected cardinality at {location}: {message}")]
    Cardinality {
        /// `node` or `node.connection` where the count was wrong.
        location: String,
        /// What was expected.
        message: String,
    },

    /// A second tri-state buffer was merged into a pin that already hosts one.
    #[error("node {node} already contains TBUF inputs")]
    DoubleTriStateMerge {
        /// The merge target.
        node: String,
    },

    /// A latch uses an asynchronous preset or clear that is not tied to 0.
    #[error("latch {latch} has an asynchronous {control} on '{port}' that is not tied to constant 0")]
    UnsupportedLatchControl {
        /// The latch cell.
        latch: String,
        /// `clear` or `preset`.
        control: &'static str,
        /// The control port name.
        port: String,
    },

    /// Combinational logic feeds back into itself without a named node.
    #[error("combinational loop through {nodes}")]
    CombinationalLoop {
        /// Comma-separated names of the nodes in the loop.
        nodes: String,
    },

    /// An expression nests deeper than the generator allows.
    #[error("expression driving {connection} nests deeper than {limit} levels")]
    ExpressionTooDeep {
        /// The equation being generated.
        connection: String,
        /// The nesting limit.
        limit: usize,
    },

    /// Any other broken rule.
    #[error("{0}")]
    Internal(String),
}

/// Any error that aborts a compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The input document could not be turned into a graph.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The graph broke one of its rules during rewriting.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl CompileError {
    /// Returns `true` for input-format errors.
    pub fn is_format(&self) -> bool {
        matches!(self, CompileError::Format(_))
    }

    /// Returns `true` for invariant violations.
    pub fn is_invariant(&self) -> bool {
        matches!(self, CompileError::Invariant(_))
    }
}

/// Returns `Err(violation())` unless `cond` holds.
pub fn ensure(cond: bool, violation: impl FnOnce() -> InvariantViolation) -> CuplResult<()> {
    if cond {
        Ok(())
    } else {
        Err(violation().into())
    }
}
