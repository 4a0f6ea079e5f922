//! Yosys synthesis script generation.
//!
//! The script reduces a Verilog design to the gate and register cells the
//! netlist builder understands and writes the result as JSON.

use std::path::Path;

/// Liberty file describing the CUPL flip-flop cell.
pub const DFF_LIBERTY: &str = "cupl_dff.lib";

/// Techmap file mapping Yosys latches onto the CUPL latch cell.
pub const LATCH_TECHMAP: &str = "cupl_cells_latch.v";

/// Inputs of the script generator.
#[derive(Debug, Clone)]
pub struct YosysScript {
    /// Verilog sources, read in order.
    pub sources: Vec<String>,
    /// Directory holding [`DFF_LIBERTY`] and [`LATCH_TECHMAP`].
    pub lib_dir: String,
    /// Name of the JSON netlist the script writes.
    pub json: String,
}

impl YosysScript {
    /// A script for `sources` whose JSON output is named after `script_path`
    /// with a `.json` extension.
    pub fn new(sources: Vec<String>, lib_dir: impl Into<String>, script_path: &Path) -> Self {
        let stem = script_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "netlist".to_string());
        Self {
            sources,
            lib_dir: lib_dir.into(),
            json: format!("{stem}.json"),
        }
    }

    /// The script text, one command per line.
    pub fn render(&self) -> String {
        let lib = self.lib_dir.trim_end_matches('/');
        let mut lines: Vec<String> = self
            .sources
            .iter()
            .map(|s| format!("read_verilog {s}"))
            .collect();
        lines.extend(
            [
                "hierarchy".to_string(),
                "proc".to_string(),
                "flatten".to_string(),
                "tribuf -logic".to_string(),
                "opt".to_string(),
                format!("techmap -map +/techmap.v -map {lib}/{LATCH_TECHMAP}"),
                "opt".to_string(),
                format!("dfflibmap -prepare -liberty {lib}/{DFF_LIBERTY}"),
                "abc -g AND,XOR".to_string(),
                "clean".to_string(),
                format!("dfflibmap -liberty {lib}/{DFF_LIBERTY}"),
                "opt".to_string(),
                format!("write_json {}", self.json),
            ],
        );
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lines_in_order() {
        let script = YosysScript::new(
            vec!["counter.v".to_string(), "util.v".to_string()],
            "lib/",
            Path::new("build/counter.ys"),
        );
        assert_eq!(script.json, "counter.json");
        let text = script.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "read_verilog counter.v",
                "read_verilog util.v",
                "hierarchy",
                "proc",
                "flatten",
                "tribuf -logic",
                "opt",
                "techmap -map +/techmap.v -map lib/cupl_cells_latch.v",
                "opt",
                "dfflibmap -prepare -liberty lib/cupl_dff.lib",
                "abc -g AND,XOR",
                "clean",
                "dfflibmap -liberty lib/cupl_dff.lib",
                "opt",
                "write_json counter.json",
            ]
        );
    }
}
