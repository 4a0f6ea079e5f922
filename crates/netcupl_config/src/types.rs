//! Configuration types deserialized from `netcupl.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The device name used when neither the configuration nor the command line
/// names one.
pub const DEFAULT_DEVICE: &str = "virtual";

/// The top-level project configuration parsed from `netcupl.toml`.
///
/// Every table is optional; an empty file yields [`ProjectConfig::default`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Target device.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Fields of the CUPL header block.
    #[serde(default)]
    pub header: HeaderConfig,
    /// Compilation settings.
    #[serde(default)]
    pub compile: CompileConfig,
    /// Pin numbers by signal name; 0 leaves the pin unassigned.
    #[serde(default)]
    pub pins: BTreeMap<String, u32>,
}

/// The programmable-logic device the design is compiled for.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// WinCUPL device mnemonic, e.g. `f1508ispplcc84` or `g22v10`.
    pub name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE.to_string(),
        }
    }
}

/// Values written into the CUPL header block.
///
/// An empty `name` is replaced by the module name when the file is written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// `Name` field.
    pub name: String,
    /// `Partno` field.
    pub partno: String,
    /// `Date` field.
    pub date: String,
    /// `Revision` field.
    pub revision: String,
    /// `Designer` field.
    pub designer: String,
    /// `Company` field.
    pub company: String,
    /// `Assembly` field.
    pub assembly: String,
    /// `Location` field.
    pub location: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            partno: "00".to_string(),
            date: String::new(),
            revision: "01".to_string(),
            designer: "Engineer".to_string(),
            company: "None".to_string(),
            assembly: "None".to_string(),
            location: String::new(),
        }
    }
}

impl HeaderConfig {
    /// The header fields in output order, paired with their CUPL keyword.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("Name", self.name.as_str()),
            ("Partno", self.partno.as_str()),
            ("Date", self.date.as_str()),
            ("Revision", self.revision.as_str()),
            ("Designer", self.designer.as_str()),
            ("Company", self.company.as_str()),
            ("Assembly", self.assembly.as_str()),
            ("Location", self.location.as_str()),
        ]
    }
}

/// Compilation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileConfig {
    /// Module to compile when the netlist defines several.
    pub module: Option<String>,
    /// Maximum number of buried pin nodes; unset disables expansion.
    pub pinnode_limit: Option<usize>,
    /// WinCUPL pin file, relative to the configuration file.
    pub pin_file: Option<String>,
}
