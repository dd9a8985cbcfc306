use crate::bundle::{Bundler, parse_file_list};
use crate::config::{
    BUNDLE_OUTPUT_FILENAME, BundlerConfig, PARTIAL_BUNDLE_OUTPUT_FILENAME, TREE_OUTPUT_FILENAME,
};
use crate::error::{AppError, Result};
use crate::host::Host;
use chrono::{DateTime, Utc};
use log;
use std::path::{Path, PathBuf};

pub const MISSING_WORKSPACE_MESSAGE: &str = "Please open a workspace first";
pub const EMPTY_SELECTION_MESSAGE: &str = "Please provide at least one file path";

/// Entry points for the user-facing commands. Every failure is reported through
/// the host notifier before it is returned.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    root: Option<PathBuf>,
    generated_at: Option<DateTime<Utc>>,
}

impl Workspace {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            generated_at: None,
        }
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn generate_tree(&self, host: &Host) -> Result<PathBuf> {
        let root = self.require_root(host)?;
        log::debug!("Generating tree for {}", root.display());

        let result = self.bundler(root, host).and_then(|bundler| {
            let markdown = bundler.generate_tree_markdown();
            let output = root.join(TREE_OUTPUT_FILENAME);
            host.sink.write_and_reveal(&output, &markdown)?;
            Ok(output)
        });

        match result {
            Ok(output) => {
                host.notifier.info("Project tree generated successfully");
                Ok(output)
            }
            Err(e) => {
                host.notifier.error(&format!("Error generating tree: {}", e));
                Err(e)
            }
        }
    }

    pub fn bundle_all(&self, host: &Host) -> Result<PathBuf> {
        let root = self.require_root(host)?;
        self.bundle(root, host, None)
    }

    /// Bundle the paths listed in `list_text`, one per line.
    pub fn bundle_selected(&self, host: &Host, list_text: &str) -> Result<PathBuf> {
        let root = self.require_root(host)?;
        let files = parse_file_list(list_text);
        if files.is_empty() {
            host.notifier.error(EMPTY_SELECTION_MESSAGE);
            return Err(AppError::InvalidArgument(EMPTY_SELECTION_MESSAGE.to_string()));
        }
        self.bundle(root, host, Some(files.as_slice()))
    }

    fn bundle(
        &self,
        root: &Path,
        host: &Host,
        specific_files: Option<&[String]>,
    ) -> Result<PathBuf> {
        let file_count =
            specific_files.map_or("all eligible".to_string(), |f| f.len().to_string());
        log::debug!("Bundling {} files in {}", file_count, root.display());

        let result = self.bundler(root, host).and_then(|bundler| {
            let markdown = bundler.generate_markdown(specific_files);
            let filename = if specific_files.is_some() {
                PARTIAL_BUNDLE_OUTPUT_FILENAME
            } else {
                BUNDLE_OUTPUT_FILENAME
            };
            let output = root.join(filename);
            host.sink.write_and_reveal(&output, &markdown)?;
            Ok(output)
        });

        match result {
            Ok(output) => {
                host.notifier.info(&format!(
                    "Code bundle created successfully ({} files)",
                    file_count
                ));
                Ok(output)
            }
            Err(e) => {
                host.notifier.error(&format!("Error: {}", e));
                Err(e)
            }
        }
    }

    fn require_root(&self, host: &Host) -> Result<&Path> {
        match self.root.as_deref() {
            Some(root) => Ok(root),
            None => {
                host.notifier.error(MISSING_WORKSPACE_MESSAGE);
                Err(AppError::MissingWorkspace(PathBuf::new()))
            }
        }
    }

    fn bundler(&self, root: &Path, host: &Host) -> Result<Bundler> {
        let config = BundlerConfig::load(host.config)?;
        let bundler = Bundler::new(root, config)?;
        Ok(match self.generated_at {
            Some(at) => bundler.with_timestamp(at),
            None => bundler,
        })
    }
}
