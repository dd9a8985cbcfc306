use colored::*;
use llm_bundler_core::{AppError, DocumentSink, FileDocumentSink, Notifier};
use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

/// Prints command notifications to the terminal.
pub struct TerminalNotifier {
    quiet: bool,
    /// Keep stdout free for a printed document.
    info_to_stderr: bool,
}

impl TerminalNotifier {
    pub fn new(quiet: bool, info_to_stderr: bool) -> Self {
        Self {
            quiet,
            info_to_stderr,
        }
    }
}

impl Notifier for TerminalNotifier {
    fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let line = format!("{} {}", "✅".green(), message.green());
        if self.info_to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "❌".red(), message.red().bold());
    }
}

/// Writes the document to disk, then points the user at it.
pub struct TerminalSink {
    quiet: bool,
    print_document: bool,
}

impl TerminalSink {
    pub fn new(quiet: bool, print_document: bool) -> Self {
        Self {
            quiet,
            print_document,
        }
    }
}

impl DocumentSink for TerminalSink {
    fn write_and_reveal(&self, path: &Path, contents: &str) -> llm_bundler_core::Result<()> {
        FileDocumentSink.write_and_reveal(path, contents)?;

        if self.print_document {
            write_to_stdout(contents)?;
        } else if !self.quiet {
            println!(
                "{} Written to: {}",
                "📄".blue(),
                path.display().to_string().blue()
            );
        }
        Ok(())
    }
}

pub fn write_to_stdout(content: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        handle.write_all(b"\n")?;
    }
    handle.flush()
}

/// A command failure the notifier has already shown.
#[derive(Debug)]
pub struct Reported(pub AppError);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for Reported {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_writes_file_before_revealing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm_tree.md");
        TerminalSink::new(true, false)
            .write_and_reveal(&path, "# Project Directory Tree\n")
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# Project Directory Tree\n"
        );
    }

    #[test]
    fn sink_reports_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("llm_bundle.md");
        let result = TerminalSink::new(true, false).write_and_reveal(&path, "x");
        assert!(matches!(result, Err(AppError::FileWrite { .. })));
    }

    #[test]
    fn reported_error_keeps_core_message() {
        let err = Reported(AppError::InvalidArgument("empty".to_string()));
        assert_eq!(err.to_string(), "Invalid Argument: empty");
        assert!(err.source().is_some());
    }
}
