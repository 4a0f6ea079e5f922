//! Error types for configuration and pin-file loading.

/// Errors that can occur when loading `netcupl.toml` or a pin file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading a file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A pin-file line has a pin number that is not a valid pin.
    #[error("pin file line {line}: {message}")]
    PinFile {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A pin name appears twice in one pin file.
    #[error("duplicate pin name '{0}'")]
    DuplicatePin(String),
}
