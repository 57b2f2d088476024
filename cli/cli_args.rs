use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        value_name = "REPO",
        help = "Repository root (default: $REPOCTX_ROOT or the current dir)."
    )]
    pub repo: Option<PathBuf>,

    #[arg(
        long,
        help = "Path of the config file (default: <REPO>/.repoctx.toml, .repoctx.yml or .repoctx.yaml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Project Setup"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Do not load any config file or .gptignore.",
        conflicts_with = "config",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,
}

/// Per-call overrides. They form the top configuration layer.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionOpts {
    #[arg(long, value_name = "PATTERN", action = clap::ArgAction::Append, help = "Always include paths matching this glob (beaten only by --exclude).", help_heading = "Selection")]
    pub include: Vec<String>,

    #[arg(long, value_name = "PATTERN", action = clap::ArgAction::Append, help = "Never include paths matching this glob.", help_heading = "Selection")]
    pub exclude: Vec<String>,

    #[arg(long, value_name = "CATEGORY", action = clap::ArgAction::Append, help = "Enable a category (backend, views, frontend, tests, configuration, database, documentation, other).", help_heading = "Selection")]
    pub enable: Vec<String>,

    #[arg(long, value_name = "CATEGORY", action = clap::ArgAction::Append, help = "Disable a category.", help_heading = "Selection")]
    pub disable: Vec<String>,

    #[arg(long, value_name = "CATEGORY", action = clap::ArgAction::Append, help = "Enable only the named categories and disable all others.", help_heading = "Selection")]
    pub only: Vec<String>,

    #[arg(
        long,
        help = "Disable the built-in ignore list (lockfiles, secrets, binaries, ...).",
        help_heading = "Selection"
    )]
    pub no_default_ignore: bool,

    #[arg(
        long,
        help = "Strip comments from included files.",
        overrides_with = "keep_comments",
        help_heading = "Content"
    )]
    pub remove_comments: bool,

    #[arg(
        long,
        help = "Keep comments [default].",
        overrides_with = "remove_comments",
        help_heading = "Content"
    )]
    pub keep_comments: bool,

    #[arg(long, value_name = "KIND", value_parser = ["inspect", "file"], help = "Text detection: in-process sniffing or the `file` utility [default: inspect].", help_heading = "Content")]
    pub classifier: Option<String>,

    #[arg(
        long,
        value_name = "DURATION",
        help = "Timeout for git and file invocations, e.g. '500ms', '30s' [default: 10s].",
        help_heading = "Content"
    )]
    pub timeout: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Concatenate the tracked text files of a git repository into one LLM context document.",
    long_about = "repoctx lists the files git tracks, filters them through exclude/include globs, \na built-in ignore list and per-category path rules, drops empty and binary files, \nand writes the rest into a single delimited document.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  repoctx generate -o context.txt\n  repoctx generate ../app --only backend --remove-comments\n  repoctx explain --disable tests\n  repoctx config -f yaml",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(visible_alias = "g", about = "Write the context document.")]
    Generate(GenerateArgs),

    #[command(
        visible_alias = "x",
        about = "Show the rule verdict for every tracked file."
    )]
    Explain(ExplainArgs),

    #[command(about = "Print the effective merged configuration.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub selection: SelectionOpts,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Output file (default: output.txt).",
        help_heading = "Output Control"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "File whose text replaces the default preamble.",
        help_heading = "Output Control"
    )]
    pub preamble: Option<PathBuf>,

    #[arg(
        long,
        help = "Report an estimated token count (cl100k) for the document.",
        help_heading = "Output Control"
    )]
    pub tokens: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub selection: SelectionOpts,

    #[arg(short = 'f', long, help = "Print structured output instead of a table.", value_name = "FORMAT", value_parser = ["json", "yaml"], help_heading = "Output Formatting")]
    pub format: Option<String>,

    #[arg(
        long,
        help = "Only list paths that would be included.",
        help_heading = "Output Formatting"
    )]
    pub included_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub selection: SelectionOpts,

    #[arg(short = 'f', long, help = "Set the output format.", value_name = "FORMAT", value_parser = ["toml", "json", "yaml"], default_value = "toml", help_heading = "Output Formatting")]
    pub format: String,
}
