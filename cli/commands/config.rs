use crate::Session;
use crate::cli_args::{ConfigArgs, ConfigFormat};
use crate::load_workspace_for_command;
use crate::output::write_to_stdout;
use anyhow::{Context, Result};
use colored::*;
use llm_bundler_core::config::{CONFIG_FILENAME, WORKSPACE_CONFIG_DIR};
use llm_bundler_core::{AppError, BundlerConfig, determine_workspace_root};
use std::fs;

pub fn handle_config_command(args: &ConfigArgs, session: &Session) -> Result<()> {
    let (_, reader) = load_workspace_for_command(&session.workspace, &session.filters)?;
    let config = BundlerConfig::load(&reader).context("Failed to load effective configuration")?;

    if args.save {
        return save_config(&config, args.force, session);
    }

    let content = match args.format {
        ConfigFormat::Toml => config.to_toml_string()?,
        ConfigFormat::Json => config.to_json_string()?,
    };
    write_to_stdout(&content).context("Failed to write configuration to stdout")?;
    Ok(())
}

fn save_config(config: &BundlerConfig, force: bool, session: &Session) -> Result<()> {
    let root = determine_workspace_root(session.workspace.workspace.as_ref())
        .context("Cannot save configuration without a workspace")?;
    let config_dir = root.join(WORKSPACE_CONFIG_DIR);
    let save_path = config_dir.join(CONFIG_FILENAME);

    if save_path.exists() && !force {
        anyhow::bail!(AppError::InvalidArgument(format!(
            "Config file already exists at '{}'. Pass --force to overwrite.",
            save_path.display()
        )));
    }

    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create directory {}", config_dir.display()))?;
    fs::write(&save_path, config.to_toml_string()?).map_err(|e| AppError::FileWrite {
        path: save_path.clone(),
        source: e,
    })?;

    if !session.quiet {
        println!(
            "{} Configuration saved to: {}",
            "✅".green(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
