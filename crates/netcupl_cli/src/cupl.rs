//! `netcupl cupl`: compile a Yosys JSON netlist to a CUPL file.

use std::fs;
use std::path::{Path, PathBuf};

use netcupl_config::{load_config, load_pin_file, PinTable, ProjectConfig};
use netcupl_synth::{CompileOptions, Compiler};

use crate::error::CliError;
use crate::{CuplArgs, GlobalArgs};

/// Runs the `cupl` subcommand.
pub fn run(args: &CuplArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let (config, config_dir) = load_project_config(global)?;

    if !args.input.is_file() {
        return Err(CliError::InputNotFound(args.input.clone()));
    }
    let options = resolve_options(args, &config, config_dir.as_deref())?;
    let module = args.module.as_deref().or(config.compile.module.as_deref());
    if global.verbose {
        eprintln!(
            "  Device {}, {} pin numbers, pin-node limit {}",
            options.device,
            options.pins.len(),
            options
                .pinnode_limit
                .map_or_else(|| "none".to_string(), |n| n.to_string())
        );
    }

    let json = fs::read_to_string(&args.input).map_err(|source| CliError::Io {
        path: args.input.clone(),
        source,
    })?;
    let mut compiler = Compiler::from_json(&json, module, options)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.pld", compiler.graph().module_name())));

    compiler.check_loops()?;
    compiler.generate_branching_nodes()?;
    if args.intermediate {
        write_file(&output.with_extension("it1"), &compiler.generate_code()?)?;
    }
    compiler.simplify_connections()?;
    if args.intermediate {
        write_file(&output.with_extension("it2"), &compiler.generate_code()?)?;
    }
    compiler.collapse_nodes()?;
    compiler.expand_combinational_pin_nodes()?;
    compiler.fix_pin_names();
    let text = compiler.generate_code()?;
    write_file(&output, &text)?;

    if !global.quiet {
        eprintln!(
            "  Compiled {} ({} pins, {} pin nodes)",
            compiler.graph().module_name(),
            compiler.graph().pins().len(),
            compiler.graph().pin_nodes().len()
        );
        eprintln!("     Wrote {}", output.display());
    }
    Ok(())
}

/// Loads `--config`, or `netcupl.toml` from the working directory when it
/// exists. Returns the directory relative paths in the file resolve against.
fn load_project_config(global: &GlobalArgs) -> Result<(ProjectConfig, Option<PathBuf>), CliError> {
    let path = match &global.config {
        Some(path) => Some(PathBuf::from(path)),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| netcupl_config::find_config(&dir)),
    };
    match path {
        Some(path) => {
            log::debug!("loading configuration from {}", path.display());
            let config = load_config(&path)?;
            let dir = path.parent().map(Path::to_path_buf);
            Ok((config, dir))
        }
        None => Ok((ProjectConfig::default(), None)),
    }
}

/// Merges command-line flags over the configuration file.
fn resolve_options(
    args: &CuplArgs,
    config: &ProjectConfig,
    config_dir: Option<&Path>,
) -> Result<CompileOptions, CliError> {
    let mut pins = PinTable::from(config.pins.clone());
    let pin_file = match (&args.pin_file, &config.compile.pin_file) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(path)) => Some(match config_dir {
            Some(dir) => dir.join(path),
            None => PathBuf::from(path),
        }),
        (None, None) => None,
    };
    if let Some(path) = pin_file {
        if !path.is_file() {
            return Err(CliError::PinFileNotFound(path));
        }
        let from_file = load_pin_file(&path)?;
        log::debug!("{} pin numbers read from {}", from_file.len(), path.display());
        pins.merge(&from_file);
    }

    Ok(CompileOptions {
        device: args.device.clone().unwrap_or_else(|| config.device.name.clone()),
        header: config.header.clone(),
        pins,
        pinnode_limit: args.pinnode_limit.or(config.compile.pinnode_limit),
    })
}

fn write_file(path: &Path, text: &str) -> Result<(), CliError> {
    fs::write(path, text).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_MODULE;
    use std::fs;
    use tempfile::TempDir;

    const SINGLE_AND: &str = r#"{"modules": {"top": {
        "ports": {
            "a": {"direction": "input", "bits": [2]},
            "b": {"direction": "input", "bits": [3]},
            "y": {"direction": "output", "bits": [4]}
        },
        "cells": {
            "g": {"type": "$_AND_", "port_directions": {"A": "input", "B": "input", "Y": "output"},
                  "connections": {"A": [2], "B": [3], "Y": [4]}}
        }
    }}}"#;

    fn args(input: PathBuf, output: PathBuf) -> CuplArgs {
        CuplArgs {
            input,
            output: Some(output),
            device: None,
            pin_file: None,
            module: None,
            pinnode_limit: None,
            intermediate: false,
        }
    }

    fn global(config: Option<&Path>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: config.map(|p| p.display().to_string()),
        }
    }

    #[test]
    fn compiles_to_output_file() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("and.json");
        fs::write(&input, SINGLE_AND).unwrap();
        let toml = tmp.path().join("netcupl.toml");
        fs::write(&toml, "[device]\nname = \"g16v8\"\n").unwrap();
        let output = tmp.path().join("and.pld");

        run(&args(input, output.clone()), &global(Some(&toml))).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("Device g16v8;\r\n"));
        assert!(text.ends_with("y = ( a & b );\r\n"));
    }

    #[test]
    fn intermediate_dumps_are_written() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("and.json");
        fs::write(&input, SINGLE_AND).unwrap();
        let toml = tmp.path().join("netcupl.toml");
        fs::write(&toml, "").unwrap();
        let output = tmp.path().join("and.pld");
        let mut a = args(input, output);
        a.intermediate = true;
        run(&a, &global(Some(&toml))).unwrap();
        assert!(tmp.path().join("and.it1").is_file());
        assert!(tmp.path().join("and.it2").is_file());
    }

    #[test]
    fn pin_file_from_config_is_relative_to_it() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("and.json");
        fs::write(&input, SINGLE_AND).unwrap();
        fs::write(tmp.path().join("and.pin"), "a : 2 : input\ny : 19 : output\n").unwrap();
        let toml = tmp.path().join("netcupl.toml");
        fs::write(&toml, "[compile]\npin_file = \"and.pin\"\n\n[pins]\nb = 3\n").unwrap();
        let output = tmp.path().join("and.pld");

        run(&args(input, output.clone()), &global(Some(&toml))).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("PIN  2  = a;\r\nPIN  3  = b;\r\nPIN  19  = y;\r\n"));
    }

    #[test]
    fn missing_pin_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("and.json");
        fs::write(&input, SINGLE_AND).unwrap();
        let toml = tmp.path().join("netcupl.toml");
        fs::write(&toml, "").unwrap();
        let mut a = args(input, tmp.path().join("and.pld"));
        a.pin_file = Some(tmp.path().join("missing.pin"));
        let err = run(&a, &global(Some(&toml))).unwrap_err();
        assert!(matches!(err, CliError::PinFileNotFound(_)));
    }

    #[test]
    fn missing_input_and_module_errors() {
        let tmp = TempDir::new().unwrap();
        let toml = tmp.path().join("netcupl.toml");
        fs::write(&toml, "").unwrap();
        let output = tmp.path().join("x.pld");

        let err = run(
            &args(tmp.path().join("none.json"), output.clone()),
            &global(Some(&toml)),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::InputNotFound(_)));

        let input = tmp.path().join("and.json");
        fs::write(&input, SINGLE_AND).unwrap();
        let mut a = args(input, output.clone());
        a.module = Some("other".to_string());
        let err = run(&a, &global(Some(&toml))).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_MODULE);
        assert!(!output.exists());
    }
}
