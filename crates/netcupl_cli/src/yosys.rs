//! `netcupl yosys`: write the Yosys script that produces the JSON netlist.

use std::fs;

use netcupl_synth::YosysScript;

use crate::error::CliError;
use crate::{GlobalArgs, YosysArgs};

/// Runs the `yosys` subcommand.
pub fn run(args: &YosysArgs, global: &GlobalArgs) -> Result<(), CliError> {
    if let Some(missing) = args.sources.iter().find(|s| !s.is_file()) {
        return Err(CliError::InputNotFound(missing.clone()));
    }
    let sources = args
        .sources
        .iter()
        .map(|s| s.display().to_string())
        .collect();
    let mut script = YosysScript::new(sources, args.lib_dir.display().to_string(), &args.output);
    if let Some(json) = &args.json {
        script.json = json.display().to_string();
    }

    fs::write(&args.output, script.render()).map_err(|source| CliError::Io {
        path: args.output.clone(),
        source,
    })?;
    if !global.quiet {
        eprintln!("     Wrote {} (netlist: {})", args.output.display(), script.json);
    }
    Ok(())
}
