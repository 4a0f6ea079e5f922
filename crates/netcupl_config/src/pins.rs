//! Pin-number table and the WinCUPL pin file reader.
//!
//! A pin file has one pin per line, fields separated by `:`:
//!
//! ```text
//! dreset_n      : 1     : input  : TTL  :   :   : N
//! data[3]       : 17    : bidir  : TTL  :   :   : N
//! ```
//!
//! Only the first two fields are used. Bus members `name[ix]` are stored
//! as `nameix`, matching how multi-bit ports are named in the netlist.

use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::path::Path;

/// Pin numbers by signal name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinTable {
    pins: BTreeMap<String, u32>,
}

impl PinTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin number of `name`, or 0 when unassigned.
    pub fn get(&self, name: &str) -> u32 {
        self.pins.get(name).copied().unwrap_or(0)
    }

    /// Assigns a pin number, replacing any earlier assignment.
    pub fn insert(&mut self, name: impl Into<String>, number: u32) {
        self.pins.insert(name.into(), number);
    }

    /// Copies every entry of `other` into this table; `other` wins on
    /// conflicts.
    pub fn merge(&mut self, other: &PinTable) {
        for (name, number) in other.iter() {
            self.insert(name, number);
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Iterates over `(name, number)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.pins.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, u32>> for PinTable {
    fn from(pins: BTreeMap<String, u32>) -> Self {
        Self { pins }
    }
}

/// Reads a pin file from disk.
pub fn load_pin_file(path: &Path) -> Result<PinTable, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let table = parse_pin_file(&content)?;
    log::debug!("read {} pins from {}", table.len(), path.display());
    Ok(table)
}

/// Parses the text of a pin file.
///
/// Lines with fewer than two fields, or whose second field does not start
/// with a digit (column headers, comments), are skipped. A second field that
/// starts with a digit but is not a valid pin number is an error, as is a
/// name listed twice.
pub fn parse_pin_file(content: &str) -> Result<PinTable, ConfigError> {
    let mut table = PinTable::new();
    for (ix, line) in content.lines().enumerate() {
        let mut fields = line.split(':');
        let (Some(name), Some(number)) = (fields.next(), fields.next()) else {
            continue;
        };
        let name = name.trim();
        let number = number.trim();
        if name.is_empty() || !number.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let number: u32 = number.parse().map_err(|_| ConfigError::PinFile {
            line: ix + 1,
            message: format!("pin number '{number}' is not an integer"),
        })?;
        let name = normalize_pin_name(name);
        if table.pins.contains_key(&name) {
            return Err(ConfigError::DuplicatePin(name));
        }
        table.pins.insert(name, number);
    }
    Ok(table)
}

/// `bus[3]` → `bus3`; other names are returned unchanged.
pub fn normalize_pin_name(name: &str) -> String {
    if let Some((base, rest)) = name.split_once('[') {
        if let Some(index) = rest.strip_suffix(']') {
            if !base.is_empty() && !index.is_empty() && index.chars().all(|c| c.is_ascii_digit())
            {
                return format!("{base}{index}");
            }
        }
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIN_FILE: &str = "\
Pin Name       : Pin No. : Direction : Type\n\
---------------------------------------------\n\
dreset_n       : 1       : input     : TTL   :   :   : N\n\
data[3]        : 17      : bidir     : TTL   :   :   : N\n\
clk            : 83      : input     : TTL\n\
";

    #[test]
    fn parses_wincupl_pin_file() {
        let table = parse_pin_file(PIN_FILE).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("dreset_n"), 1);
        assert_eq!(table.get("data3"), 17);
        assert_eq!(table.get("clk"), 83);
        assert_eq!(table.get("unknown"), 0);
    }

    #[test]
    fn duplicate_name() {
        let err = parse_pin_file("a : 1\nb : 2\na : 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePin(ref n) if n == "a"));
    }

    #[test]
    fn bus_member_duplicates_plain_name() {
        let err = parse_pin_file("d3 : 1\nd[3] : 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePin(ref n) if n == "d3"));
    }

    #[test]
    fn bad_number() {
        let err = parse_pin_file("a : 1\nb : 12x\n").unwrap_err();
        assert!(matches!(err, ConfigError::PinFile { line: 2, .. }));
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_pin_name("bus[12]"), "bus12");
        assert_eq!(normalize_pin_name("bus[x]"), "bus[x]");
        assert_eq!(normalize_pin_name("plain"), "plain");
        assert_eq!(normalize_pin_name("[3]"), "[3]");
    }

    #[test]
    fn merge_prefers_other() {
        let mut base = PinTable::new();
        base.insert("clk", 1);
        base.insert("rst", 2);
        let mut overlay = PinTable::new();
        overlay.insert("clk", 83);
        base.merge(&overlay);
        assert_eq!(base.get("clk"), 83);
        assert_eq!(base.get("rst"), 2);
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.pin");
        std::fs::write(&path, PIN_FILE).unwrap();
        let table = load_pin_file(&path).unwrap();
        assert_eq!(table.get("clk"), 83);
    }
}
