mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::path::Path;
use std::process;

use cli_args::{Cli, Commands, ProjectConfigOpts, SelectionOpts};
use repoctx_core::{AppError, CategoryConfig, Category, ClassifierKind, Config};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Configuration(_)) => 1,
                Some(AppError::RepositoryAccess(_)) => 2,
                Some(AppError::Io(_)) => 3,
                Some(AppError::FileRead { .. }) => 3,
                Some(AppError::FileWrite { .. }) => 3,
                Some(_) => 1,
                None => 1,
            };
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(Commands::Generate(args)) => {
            log::debug!("Executing 'generate' command...");
            commands::generate::handle_generate_command(args, quiet)?;
        }
        Some(Commands::Explain(args)) => {
            log::debug!("Executing 'explain' command...");
            commands::explain::handle_explain_command(args, quiet)?;
        }
        Some(Commands::Config(args)) => {
            log::debug!("Executing 'config' command...");
            commands::config::handle_config_command(args)?;
        }
    }
    Ok(())
}

/// Turns the selection flags into the top configuration layer. Flags that were not
/// given stay `None` so the project config decides.
fn overrides_from_selection(selection: &SelectionOpts) -> Result<Config> {
    log::trace!("Building CLI override layer...");
    let mut overrides = Config::default();

    if !selection.include.is_empty() {
        overrides.include_files = Some(selection.include.clone());
    }
    if !selection.exclude.is_empty() {
        overrides.exclude_files = Some(selection.exclude.clone());
    }
    if selection.no_default_ignore {
        overrides.use_default_ignore = Some(false);
    }
    if selection.remove_comments {
        overrides.remove_comments = Some(true);
    }
    if selection.keep_comments {
        overrides.remove_comments = Some(false);
    }
    if let Some(kind) = &selection.classifier {
        overrides.classifier = Some(kind.parse::<ClassifierKind>()?);
    }
    if let Some(timeout) = &selection.timeout {
        overrides.command_timeout = Some(timeout.clone());
    }

    let mut set_enabled = |name: &str, enabled: bool| -> Result<()> {
        let category: Category = name.parse()?;
        overrides
            .categories
            .entry(category.as_str().to_string())
            .or_insert_with(CategoryConfig::default)
            .enabled = Some(enabled);
        Ok(())
    };
    if !selection.only.is_empty() {
        let only = selection
            .only
            .iter()
            .map(|name| name.parse::<Category>())
            .collect::<Result<Vec<_>, AppError>>()?;
        for category in Category::ALL {
            set_enabled(category.as_str(), only.contains(&category))?;
        }
    }
    for name in &selection.enable {
        set_enabled(name, true)?;
    }
    for name in &selection.disable {
        set_enabled(name, false)?;
    }

    log::trace!("CLI overrides: {:?}", overrides);
    Ok(overrides)
}

/// defaults < project config (+ .gptignore) < CLI overrides.
pub fn load_config_for_command(
    project_root: &Path,
    project_opts: &ProjectConfigOpts,
    overrides: Config,
) -> Result<Config> {
    let project = Config::load_project_layer(
        project_root,
        project_opts.config.as_ref(),
        project_opts.no_config,
    )
    .context("Failed to load project configuration")?;
    let config = Config::layered(project, overrides);
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}
