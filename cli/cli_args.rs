use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceOpts {
    #[arg(
        long,
        global = true,
        help = "Workspace directory to scan (default: $LLM_BUNDLER_WORKSPACE or current dir).",
        help_heading = "Workspace",
        value_name = "PATH"
    )]
    pub workspace: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Config file to use instead of .llm-bundler/config.toml.",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Workspace"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Ignore workspace and user config files.",
        conflicts_with = "config",
        help_heading = "Workspace"
    )]
    pub no_config: bool,
}

/// Settings given on the command line; they win over every config file.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterOverrideOpts {
    #[arg(
        long,
        global = true,
        value_name = "KB",
        help = "Skip files larger than this many kilobytes [default: 100].",
        help_heading = "Filtering"
    )]
    pub max_file_size: Option<u32>,

    #[arg(
        long = "exclude",
        global = true,
        value_name = "PATTERN",
        action = clap::ArgAction::Append,
        help = "Exclude pattern; replaces the configured list (repeatable).",
        help_heading = "Filtering"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long,
        global = true,
        help = "Show hidden directories in the tree.",
        help_heading = "Filtering"
    )]
    pub include_hidden: bool,

    #[arg(
        long,
        global = true,
        value_name = "DEPTH",
        help = "Deepest directory level shown in the tree [default: 10].",
        help_heading = "Filtering"
    )]
    pub max_depth: Option<u32>,

    #[arg(
        long,
        global = true,
        help = "Respect .gitignore files when bundling.",
        help_heading = "Filtering"
    )]
    pub gitignore: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "llm-bundler",
    author,
    version,
    about = "Bundle a workspace into markdown for LLM chats.",
    long_about = "llm-bundler draws a filtered directory tree of a workspace for an LLM to pick files from, \nthen bundles the chosen files (or every eligible source file) into one markdown document.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  llm-bundler tree\n  llm-bundler select picked.txt\n  pbpaste | llm-bundler select\n  llm-bundler bundle --gitignore --stdout",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub workspace: WorkspaceOpts,

    #[command(flatten)]
    pub filters: FilterOverrideOpts,

    #[arg(
        long,
        global = true,
        help = "Also print the generated document to standard output."
    )]
    pub stdout: bool,

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
    #[command(
        visible_alias = "t",
        about = "Write the filtered directory tree to llm_tree.md."
    )]
    Tree,

    #[command(
        visible_alias = "b",
        about = "Bundle every eligible source file into llm_bundle.md."
    )]
    Bundle,

    #[command(
        visible_alias = "s",
        about = "Bundle the listed files into llm_partial_bundle.md."
    )]
    Select(SelectArgs),

    #[command(about = "Show or save the effective configuration.")]
    Config(ConfigArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    #[arg(
        value_name = "FILE",
        help = "File holding one relative path per line; '-' or absent reads stdin."
    )]
    pub file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(short = 'f', long, value_enum, default_value_t = ConfigFormat::Toml, help = "Output format.")]
    pub format: ConfigFormat,

    #[arg(
        long,
        help = "Write the effective configuration to the workspace config file."
    )]
    pub save: bool,

    #[arg(long, requires = "save", help = "Overwrite an existing config file.")]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_enum,
        value_name = "SHELL",
        help = "Shell to generate completions for [default: bash]"
    )]
    pub shell: Option<Shell>,
    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}
