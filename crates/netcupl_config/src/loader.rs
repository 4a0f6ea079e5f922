//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::{Path, PathBuf};

/// File name looked up by [`find_config`].
pub const CONFIG_FILE_NAME: &str = "netcupl.toml";

/// Returns `<dir>/netcupl.toml` if it exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Reads, parses, and validates a configuration file.
pub fn load_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    log::debug!("loaded configuration from {}", path.display());
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that values can be written into a CUPL file verbatim.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.device.name.trim().is_empty() {
        return Err(ConfigError::MissingField("device.name".to_string()));
    }
    if config.device.name.contains(char::is_whitespace) {
        return Err(ConfigError::ValidationError(format!(
            "device name '{}' contains whitespace",
            config.device.name
        )));
    }
    for (key, value) in config.header.fields() {
        if value.contains(';') || value.contains(['\r', '\n']) {
            return Err(ConfigError::ValidationError(format!(
                "header field {key} must be a single line without ';'"
            )));
        }
    }
    if let Some(module) = &config.compile.module {
        if module.is_empty() {
            return Err(ConfigError::ValidationError(
                "compile.module must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_DEVICE;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.device.name, DEFAULT_DEVICE);
        assert_eq!(config.header.partno, "00");
        assert_eq!(config.header.revision, "01");
        assert_eq!(config.header.designer, "Engineer");
        assert!(config.header.date.is_empty());
        assert!(config.compile.pinnode_limit.is_none());
        assert!(config.pins.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[device]
name = "f1508ispplcc84"

[header]
name = "counter"
date = "Jan 2024"
company = "Acme"

[compile]
module = "top"
pinnode_limit = 4
pin_file = "counter.pin"

[pins]
clk = 83
q0 = 12
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.device.name, "f1508ispplcc84");
        assert_eq!(config.header.name, "counter");
        assert_eq!(config.header.company, "Acme");
        assert_eq!(config.header.assembly, "None");
        assert_eq!(config.compile.module.as_deref(), Some("top"));
        assert_eq!(config.compile.pinnode_limit, Some(4));
        assert_eq!(config.compile.pin_file.as_deref(), Some("counter.pin"));
        assert_eq!(config.pins["clk"], 83);
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let result = load_config_from_str("[compile]\nlimit = 3\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn empty_device_name() {
        let result = load_config_from_str("[device]\nname = \"\"\n");
        assert!(matches!(result, Err(ConfigError::MissingField(ref f)) if f == "device.name"));
    }

    #[test]
    fn semicolon_in_header() {
        let result = load_config_from_str("[header]\ndesigner = \"a;b\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn negative_pin_number_rejected() {
        let result = load_config_from_str("[pins]\nclk = -1\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config(dir.path()).is_none());
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[device]\nname = \"g22v10\"\n",
        )
        .unwrap();
        let path = find_config(dir.path()).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.device.name, "g22v10");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
