use crate::cli_args::ConfigArgs;
use crate::output::print_structured;
use crate::{load_config_for_command, overrides_from_selection};
use anyhow::{Context, Result};
use repoctx_core::{Config, Policy};

pub fn handle_config_command(args: ConfigArgs) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.repo.as_ref())
        .context("Failed to determine repository root")?;

    let overrides = overrides_from_selection(&args.selection)?;
    let config = load_config_for_command(&project_root, &args.project_config, overrides)?;
    // Surface bad globs, regexes and durations here rather than on the next generate.
    Policy::from_config(&config).context("Invalid selection rules")?;
    config.effective_timeout()?;

    print_structured(&config, &args.format)
}
