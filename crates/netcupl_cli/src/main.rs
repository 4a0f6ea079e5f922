//! netcupl CLI: compiles Yosys JSON netlists to WinCUPL source.
//!
//! Provides `netcupl cupl` to compile a netlist and `netcupl yosys` to
//! write the Yosys script that produces one.

#![warn(missing_docs)]

mod cupl;
mod error;
mod yosys;

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use error::{CliError, EXIT_FAILURE, EXIT_INVALID_ARGUMENT};

/// netcupl: Yosys netlist to CUPL compiler.
#[derive(Parser, Debug)]
#[command(name = "netcupl", version, about = "Yosys JSON to WinCUPL compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `netcupl.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a Yosys JSON netlist to a CUPL file.
    Cupl(CuplArgs),
    /// Write a Yosys script that synthesizes Verilog to a JSON netlist.
    Yosys(YosysArgs),
}

/// Arguments for the `netcupl cupl` subcommand.
#[derive(Parser, Debug)]
pub struct CuplArgs {
    /// Yosys JSON netlist.
    pub input: PathBuf,

    /// Output file (default: `<module>.pld`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target device, e.g. `f1508ispplcc84`.
    #[arg(short, long)]
    pub device: Option<String>,

    /// WinCUPL pin file with pin numbers.
    #[arg(short, long = "pin-file")]
    pub pin_file: Option<PathBuf>,

    /// Module to compile when the netlist has several.
    #[arg(short, long)]
    pub module: Option<String>,

    /// Maximum number of buried pin nodes.
    #[arg(long)]
    pub pinnode_limit: Option<usize>,

    /// Also write `.it1` and `.it2` dumps after the early passes.
    #[arg(short, long)]
    pub intermediate: bool,
}

/// Arguments for the `netcupl yosys` subcommand.
#[derive(Parser, Debug)]
pub struct YosysArgs {
    /// Verilog sources.
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Script file to write.
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON netlist the script writes (default: script name with `.json`).
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Directory holding `cupl_dff.lib` and `cupl_cells_latch.v`.
    #[arg(long, default_value = "yosys")]
    pub lib_dir: PathBuf,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a configuration file.
    pub config: Option<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = clap_exit_code(e.kind());
            let _ = e.print();
            process::exit(code);
        }
    };

    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result: Result<(), CliError> = match cli.command {
        Command::Cupl(ref args) => cupl::run(args, &global),
        Command::Yosys(ref args) => yosys::run(args, &global),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(e.exit_code());
    }
}

/// Exit code for an argument parsing failure.
fn clap_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        ErrorKind::MissingRequiredArgument
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => EXIT_FAILURE,
        _ => EXIT_INVALID_ARGUMENT,
    }
}

/// Default log filter from the verbosity flags; `RUST_LOG` overrides it.
fn log_filter(quiet: bool, verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(log_filter(quiet, verbose));
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_cupl_default() {
        let cli = Cli::parse_from(["netcupl", "cupl", "top.json"]);
        match cli.command {
            Command::Cupl(ref args) => {
                assert_eq!(args.input, PathBuf::from("top.json"));
                assert!(args.output.is_none());
                assert!(args.device.is_none());
                assert!(args.pin_file.is_none());
                assert!(args.module.is_none());
                assert!(args.pinnode_limit.is_none());
                assert!(!args.intermediate);
            }
            _ => panic!("expected Cupl command"),
        }
    }

    #[test]
    fn parse_cupl_with_args() {
        let cli = Cli::parse_from([
            "netcupl",
            "cupl",
            "top.json",
            "-o",
            "out.pld",
            "-d",
            "f1508ispplcc84",
            "-p",
            "top.pin",
            "-m",
            "counter",
            "--pinnode-limit",
            "0",
            "-i",
        ]);
        match cli.command {
            Command::Cupl(ref args) => {
                assert_eq!(args.output, Some(PathBuf::from("out.pld")));
                assert_eq!(args.device.as_deref(), Some("f1508ispplcc84"));
                assert_eq!(args.pin_file, Some(PathBuf::from("top.pin")));
                assert_eq!(args.module.as_deref(), Some("counter"));
                assert_eq!(args.pinnode_limit, Some(0));
                assert!(args.intermediate);
            }
            _ => panic!("expected Cupl command"),
        }
    }

    #[test]
    fn parse_yosys() {
        let cli = Cli::parse_from(["netcupl", "yosys", "a.v", "b.v", "-o", "top.ys"]);
        match cli.command {
            Command::Yosys(ref args) => {
                assert_eq!(args.sources, vec![PathBuf::from("a.v"), PathBuf::from("b.v")]);
                assert_eq!(args.output, PathBuf::from("top.ys"));
                assert!(args.json.is_none());
                assert_eq!(args.lib_dir, PathBuf::from("yosys"));
            }
            _ => panic!("expected Yosys command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "netcupl",
            "--quiet",
            "--config",
            "x/netcupl.toml",
            "cupl",
            "a.json",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("x/netcupl.toml"));
    }

    #[test]
    fn missing_arguments_exit_with_one() {
        let err = Cli::try_parse_from(["netcupl", "cupl"]).unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 1);
        let err = Cli::try_parse_from(["netcupl", "yosys", "a.v"]).unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 1);
    }

    #[test]
    fn invalid_arguments_exit_with_two() {
        let err = Cli::try_parse_from(["netcupl", "cupl", "a.json", "--bogus"]).unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 2);
        let err = Cli::try_parse_from(["netcupl", "cupl", "a.json", "--pinnode-limit", "x"])
            .unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 2);
    }

    #[test]
    fn log_filter_follows_flags() {
        assert_eq!(log_filter(false, true), "debug");
        assert_eq!(log_filter(true, false), "error");
        assert_eq!(log_filter(false, false), "warn");
    }
}
