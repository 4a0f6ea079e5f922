//! Parsing and validation of `netcupl.toml` project configuration files and
//! WinCUPL pin files.
//!
//! This crate produces a strongly-typed [`ProjectConfig`] and the
//! [`PinTable`] consulted when PIN declarations are written.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod pins;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use pins::{load_pin_file, normalize_pin_name, parse_pin_file, PinTable};
pub use types::*;
