mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use log;
use std::process;

use cli_args::{Cli, Commands, FilterOverrideOpts, WorkspaceOpts};
use llm_bundler_core::config::{
    ConfigSources, KEY_EXCLUDE_PATTERNS, KEY_INCLUDE_HIDDEN_FILES, KEY_MAX_DEPTH,
    KEY_MAX_FILE_SIZE, KEY_USE_GITIGNORE, user_config_path,
};
use llm_bundler_core::{
    AppError, LayeredConfigReader, MapConfigReader, Workspace, determine_workspace_root,
    resolve_config_sources,
};
use output::Reported;

/// Options shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub workspace: WorkspaceOpts,
    pub filters: FilterOverrideOpts,
    pub stdout: bool,
    pub quiet: bool,
}

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);
    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            // The notifier already showed this one; only the exit code is left.
            if let Some(Reported(core_err)) = e.downcast_ref::<Reported>() {
                log::debug!("Command failed after notifying: {}", core_err);
                exit_code_for(core_err)
            } else {
                let exit_code = e.downcast_ref::<AppError>().map_or(1, exit_code_for);
                // Usage and config errors print even under -q.
                if !quiet || exit_code == 1 || exit_code == 5 {
                    eprintln!("{} {:#}", "Error:".red().bold(), e);
                } else {
                    log::error!("Application failed: {:#}", e);
                }
                exit_code
            }
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

/// 1 config, 2 filesystem, 3 no workspace, 5 bad argument, 6 serialization.
fn exit_code_for(err: &AppError) -> i32 {
    match err {
        AppError::Config(_) | AppError::TomlParse(_) | AppError::TomlSerialize(_) => 1,
        AppError::Glob(_) => 1,
        AppError::Io(_) | AppError::FileRead { .. } | AppError::FileWrite { .. } => 2,
        AppError::MissingWorkspace(_) => 3,
        AppError::InvalidArgument(_) => 5,
        AppError::JsonSerialize(_) => 6,
        _ => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            // Default: skipped entries and unreadable directories only.
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            // Per-entry filter decisions.
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli) -> Result<()> {
    let Cli {
        command,
        workspace,
        filters,
        stdout,
        quiet,
        ..
    } = cli;
    let session = Session {
        workspace,
        filters,
        stdout,
        quiet,
    };

    match command {
        None => {
            Cli::command().print_help()?;
        }
        Some(Commands::Tree) => {
            log::debug!("Executing 'tree' command...");
            commands::generate::handle_tree_command(&session)?;
        }
        Some(Commands::Bundle) => {
            log::debug!("Executing 'bundle' command...");
            commands::generate::handle_bundle_command(&session)?;
        }
        Some(Commands::Select(args)) => {
            log::debug!("Executing 'select' command...");
            commands::generate::handle_select_command(&args, &session)?;
        }
        Some(Commands::Config(args)) => {
            log::debug!("Executing 'config' command...");
            commands::config::handle_config_command(&args, &session)?;
        }
        Some(Commands::Completion(args)) => {
            log::debug!("Executing 'completion' command...");
            commands::completion::handle_completion_command(&args, session.quiet)?;
        }
    }
    Ok(())
}

fn config_overrides(filters: &FilterOverrideOpts) -> MapConfigReader {
    let mut overrides = MapConfigReader::new();
    if let Some(kb) = filters.max_file_size {
        overrides.insert(KEY_MAX_FILE_SIZE, kb);
    }
    if !filters.exclude.is_empty() {
        overrides.insert(KEY_EXCLUDE_PATTERNS, filters.exclude.clone());
    }
    if filters.include_hidden {
        overrides.insert(KEY_INCLUDE_HIDDEN_FILES, true);
    }
    if let Some(depth) = filters.max_depth {
        overrides.insert(KEY_MAX_DEPTH, depth);
    }
    if filters.gitignore {
        overrides.insert(KEY_USE_GITIGNORE, true);
    }
    log::trace!("CLI overrides: {:?}", overrides);
    overrides
}

/// Resolve the workspace and stack its settings. A missing workspace is not an
/// error here; the command reports it.
pub fn load_workspace_for_command(
    opts: &WorkspaceOpts,
    filters: &FilterOverrideOpts,
) -> Result<(Workspace, LayeredConfigReader)> {
    let root = match determine_workspace_root(opts.workspace.as_ref()) {
        Ok(root) => Some(root),
        Err(e) => {
            log::debug!("No usable workspace: {}", e);
            None
        }
    };

    let sources = match &root {
        Some(root) => resolve_config_sources(root, opts.config.as_ref(), opts.no_config)
            .context("Failed to resolve configuration files")?,
        None if opts.no_config => ConfigSources::default(),
        None => ConfigSources {
            workspace_file: None,
            user_file: user_config_path().filter(|p| p.is_file()),
        },
    };

    let reader = sources
        .into_reader(config_overrides(filters))
        .context("Failed to load configuration")?;
    Ok((Workspace::new(root), reader))
}
