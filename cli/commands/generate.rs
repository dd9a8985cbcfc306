use crate::Session;
use crate::cli_args::SelectArgs;
use crate::load_workspace_for_command;
use crate::output::{Reported, TerminalNotifier, TerminalSink};
use anyhow::{Context, Result};
use llm_bundler_core::{Host, Workspace};
use log;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub fn handle_tree_command(session: &Session) -> Result<()> {
    run_with_host(session, |workspace, host| workspace.generate_tree(host))
}

pub fn handle_bundle_command(session: &Session) -> Result<()> {
    run_with_host(session, |workspace, host| workspace.bundle_all(host))
}

pub fn handle_select_command(args: &SelectArgs, session: &Session) -> Result<()> {
    let list_text = read_file_list(args.file.as_deref())?;
    log::debug!("Read {} bytes of file list", list_text.len());
    run_with_host(session, |workspace, host| {
        workspace.bundle_selected(host, &list_text)
    })
}

fn run_with_host<F>(session: &Session, invoke: F) -> Result<()>
where
    F: FnOnce(&Workspace, &Host) -> llm_bundler_core::Result<PathBuf>,
{
    let (workspace, reader) = load_workspace_for_command(&session.workspace, &session.filters)?;
    let sink = TerminalSink::new(session.quiet, session.stdout);
    let notifier = TerminalNotifier::new(session.quiet, session.stdout);
    let host = Host {
        config: &reader,
        sink: &sink,
        notifier: &notifier,
    };

    let output = invoke(&workspace, &host).map_err(Reported)?;
    log::info!("Document written to {}", output.display());
    Ok(())
}

fn read_file_list(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read file list from {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read file list from stdin")?;
            Ok(text)
        }
    }
}
