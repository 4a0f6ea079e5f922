//! Command failures and their process exit codes.

use netcupl_common::{CompileError, FormatError};
use netcupl_config::ConfigError;
use std::path::PathBuf;

/// Exit code for a missing argument or subcommand, and for I/O failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for an unknown flag or a malformed value.
pub const EXIT_INVALID_ARGUMENT: i32 = 2;
/// Exit code when an input file does not exist.
pub const EXIT_INPUT_NOT_FOUND: i32 = 5;
/// Exit code when the pin file does not exist.
pub const EXIT_PIN_FILE_NOT_FOUND: i32 = 6;
/// Exit code for a pin listed twice in the pin file.
pub const EXIT_DUPLICATE_PIN: i32 = 8;
/// Exit code for a failure inside the rewrite passes or code generator.
pub const EXIT_CODE_GENERATION: i32 = 9;
/// Exit code for a netlist that cannot be read.
pub const EXIT_INVALID_NETLIST: i32 = 10;
/// Exit code for a pin number that is not an integer.
pub const EXIT_PIN_NUMBER: i32 = 11;
/// Exit code when the module to compile cannot be determined.
pub const EXIT_MODULE: i32 = 12;

/// Anything that makes a subcommand fail.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A netlist or Verilog source does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The pin file does not exist.
    #[error("pin file not found: {}", .0.display())]
    PinFileNotFound(PathBuf),

    /// `netcupl.toml` or the pin file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Compilation failed.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Reading or writing a file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl CliError {
    /// The process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InputNotFound(_) => EXIT_INPUT_NOT_FOUND,
            CliError::PinFileNotFound(_) => EXIT_PIN_FILE_NOT_FOUND,
            CliError::Config(ConfigError::DuplicatePin(_)) => EXIT_DUPLICATE_PIN,
            CliError::Config(ConfigError::PinFile { .. }) => EXIT_PIN_NUMBER,
            CliError::Config(_) => EXIT_INVALID_ARGUMENT,
            CliError::Compile(CompileError::Format(
                FormatError::ModuleNotFound(_)
                | FormatError::AmbiguousModule(_)
                | FormatError::NoModules,
            )) => EXIT_MODULE,
            CliError::Compile(CompileError::Format(_)) => EXIT_INVALID_NETLIST,
            CliError::Compile(CompileError::Invariant(_)) => EXIT_CODE_GENERATION,
            CliError::Io { .. } => EXIT_FAILURE,
        }
    }
}
