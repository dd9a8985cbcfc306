//! Capabilities the commands need from whatever hosts them.

use crate::config::ConfigReader;
use crate::error::{AppError, Result};
use log;
use std::fs;
use std::path::Path;

/// Persists a generated document and brings it to the user's attention.
pub trait DocumentSink {
    fn write_and_reveal(&self, path: &Path, contents: &str) -> Result<()>;
}

/// User-facing status messages.
pub trait Notifier {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Everything an invocation borrows from its host.
pub struct Host<'a> {
    pub config: &'a dyn ConfigReader,
    pub sink: &'a dyn DocumentSink,
    pub notifier: &'a dyn Notifier,
}

/// Writes documents to disk, replacing any existing file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDocumentSink;

impl DocumentSink for FileDocumentSink {
    fn write_and_reveal(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|e| AppError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}
