use crate::cli_args::GenerateArgs;
use crate::output;
use crate::{load_config_for_command, overrides_from_selection};
use anyhow::{Context, Result};
use repoctx_core::{self as core, Config, GitLister, Policy, Preamble, build_classifier};
use std::fs;

pub fn handle_generate_command(args: GenerateArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.repo.as_ref())
        .context("Failed to determine repository root")?;
    log::info!("Repository root determined: {}", project_root.display());

    let mut overrides = overrides_from_selection(&args.selection)?;
    overrides.output_file = args.output.clone();
    overrides.preamble_file = args.preamble.clone();
    let config = load_config_for_command(&project_root, &args.project_config, overrides)?;

    let policy = Policy::from_config(&config).context("Invalid selection rules")?;
    let timeout = config.effective_timeout()?;
    let preamble = Preamble::load(config.preamble_file.as_deref())
        .context("Failed to read preamble file")?;
    let output_path = config.effective_output_file();

    let lister = GitLister::new(timeout);
    let classifier = build_classifier(config.effective_classifier(), timeout);
    log::debug!(
        "Generating with classifier '{}' and timeout {:?}",
        config.effective_classifier(),
        timeout
    );

    let report = core::generate(
        &project_root,
        &policy,
        &lister,
        classifier.as_ref(),
        &preamble,
        &output_path,
    )
    .with_context(|| format!("Failed to generate {}", output_path.display()))?;

    let tokens = if args.tokens {
        let document = fs::read_to_string(&output_path)
            .with_context(|| format!("Failed to re-read {}", output_path.display()))?;
        Some(output::estimate_tokens(&document)?)
    } else {
        None
    };

    if !quiet {
        output::print_generation_summary(&report, tokens);
    }
    Ok(())
}
