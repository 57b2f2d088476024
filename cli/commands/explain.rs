use crate::cli_args::ExplainArgs;
use crate::output::{print_explain_table, print_structured};
use crate::{load_config_for_command, overrides_from_selection};
use anyhow::{Context, Result};
use repoctx_core::{Config, GitLister, Policy, explain_decisions};

pub fn handle_explain_command(args: ExplainArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.repo.as_ref())
        .context("Failed to determine repository root")?;
    log::info!("Repository root determined: {}", project_root.display());

    let overrides = overrides_from_selection(&args.selection)?;
    let config = load_config_for_command(&project_root, &args.project_config, overrides)?;
    let policy = Policy::from_config(&config).context("Invalid selection rules")?;
    let lister = GitLister::new(config.effective_timeout()?);

    log::debug!("Explain: evaluating tracked files...");
    let mut explanations = explain_decisions(&project_root, &policy, &lister)
        .context("Failed to evaluate tracked files")?;
    if args.included_only {
        explanations.retain(|e| e.included);
    }

    match args.format.as_deref() {
        Some(format) => print_structured(&explanations, format),
        None => {
            print_explain_table(&explanations, quiet);
            Ok(())
        }
    }
}
