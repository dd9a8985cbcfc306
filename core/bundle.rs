use crate::config::BundlerConfig;
use crate::error::Result;
use crate::filter::{FileFilter, base_name};
use crate::render::{format_timestamp, render_tree_document};
use crate::tree::{TreeBuilder, TreeNode};
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use log;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Extensions discovered by full-mode bundling.
pub const BUNDLE_EXTENSIONS: &[&str] = &[
    "js", "ts", "py", "java", "cpp", "h", "c", "cs", "php", "html", "css", "jsx", "tsx", "json",
    "md", "yml", "yaml", "xml",
];
pub const DEFAULT_LANGUAGE_TAG: &str = "text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Content(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSection {
    pub relative_path: String,
    pub language: String,
    pub body: SectionBody,
}

impl BundleSection {
    fn render_into(&self, out: &mut String) {
        match &self.body {
            SectionBody::Content(content) => {
                out.push_str(&format!(
                    "## 📄 {}\n```{}\n{}\n```\n\n",
                    self.relative_path, self.language, content
                ));
            }
            SectionBody::Error(message) => {
                out.push_str(&format!(
                    "## ❌ {}\n*Error reading file: {}*\n\n",
                    self.relative_path, message
                ));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleScope {
    AllEligible,
    /// Number of paths the caller asked for, present or not.
    Selected(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDocument {
    pub generated_at: DateTime<Utc>,
    pub scope: BundleScope,
    pub sections: Vec<BundleSection>,
}

impl BundleDocument {
    pub fn render(&self) -> String {
        let mut markdown = String::from("# Code Bundle for LLM Analysis\n\n");
        markdown.push_str(&format!(
            "**Generated:** {}\n",
            format_timestamp(&self.generated_at)
        ));
        let files_included = match self.scope {
            BundleScope::AllEligible => "All eligible files".to_string(),
            BundleScope::Selected(count) => count.to_string(),
        };
        markdown.push_str(&format!("**Files included:** {}\n\n", files_included));

        for section in &self.sections {
            section.render_into(&mut markdown);
        }
        markdown
    }

    pub fn error_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s.body, SectionBody::Error(_)))
            .count()
    }
}

/// Tree and bundle generation for one workspace and one config snapshot.
pub struct Bundler {
    root: PathBuf,
    config: BundlerConfig,
    filter: FileFilter,
    generated_at: DateTime<Utc>,
}

impl Bundler {
    pub fn new(root: &Path, config: BundlerConfig) -> Result<Self> {
        let filter = FileFilter::new(root, &config)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            filter,
            generated_at: Utc::now(),
        })
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &BundlerConfig {
        &self.config
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    pub fn workspace_name(&self) -> String {
        base_name(&self.root)
    }

    pub fn build_directory_tree(&self) -> Vec<TreeNode> {
        TreeBuilder::new(&self.filter, &self.config).build()
    }

    pub fn generate_tree_markdown(&self) -> String {
        let tree = self.build_directory_tree();
        render_tree_document(&self.workspace_name(), &tree, &self.generated_at)
    }

    /// Every file under the root with a bundled extension, in walk order.
    /// Subtrees that a substring pattern excludes wholesale are not entered.
    pub fn discover_files(&self) -> Vec<PathBuf> {
        let use_gitignore = self.config.use_gitignore;
        // Hidden entries stay visible; the hidden rule belongs to the tree only.
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .parents(use_gitignore)
            .ignore(use_gitignore)
            .git_ignore(use_gitignore)
            .git_global(use_gitignore)
            .git_exclude(use_gitignore)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let prune_filter = self.filter.clone();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            // Only substring-excluded directories are skipped; glob rules are per file.
            if entry.depth() == 0 || !is_dir {
                return true;
            }
            let relative_path = prune_filter.relative_path(entry.path());
            if prune_filter.prunes_subtree(&relative_path) {
                log::trace!("Pruning excluded directory: {}", relative_path);
                return false;
            }
            true
        });

        log::info!("Discovering files under: {}", self.root.display());
        let mut files = Vec::new();
        for result in builder.build() {
            match result {
                Ok(entry) => {
                    // Symlinks are resolved later by the size check.
                    let is_candidate = entry
                        .file_type()
                        .is_some_and(|ft| ft.is_file() || ft.is_symlink());
                    if is_candidate && has_bundle_extension(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => log::warn!("Error walking directory: {}", e),
            }
        }
        log::debug!("Discovered {} candidate files", files.len());
        files
    }

    /// Assemble bundle sections. With a non-empty `specific_files` list the paths
    /// are used as given, skipping every filter; otherwise all eligible files are
    /// discovered and filtered.
    pub fn build_bundle(&self, specific_files: Option<&[String]>) -> BundleDocument {
        self.build_bundle_with(specific_files, |path| fs::read(path))
    }

    fn build_bundle_with<F>(&self, specific_files: Option<&[String]>, read: F) -> BundleDocument
    where
        F: Fn(&Path) -> io::Result<Vec<u8>>,
    {
        let (scope, files) = match specific_files {
            // An empty selection is the same request as no selection.
            Some(paths) if !paths.is_empty() => {
                let resolved: Vec<PathBuf> = paths
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .map(|p| self.resolve_selected(p))
                    .collect();
                (BundleScope::Selected(paths.len()), resolved)
            }
            _ => (BundleScope::AllEligible, self.eligible_files()),
        };

        let mut sections = Vec::with_capacity(files.len());
        for path in files {
            // Missing paths vanish; present but unreadable ones become error sections.
            if !path.exists() {
                log::debug!("Skipping missing file: {}", path.display());
                continue;
            }
            sections.push(self.read_section(&path, &read));
        }

        let document = BundleDocument {
            generated_at: self.generated_at,
            scope,
            sections,
        };
        log::info!(
            "Bundled {} files ({} unreadable)",
            document.sections.len(),
            document.error_count()
        );
        document
    }

    pub fn generate_markdown(&self, specific_files: Option<&[String]>) -> String {
        self.build_bundle(specific_files).render()
    }

    fn eligible_files(&self) -> Vec<PathBuf> {
        self.discover_files()
            .into_iter()
            .filter(|path| match self.filter.should_include_file(path) {
                Ok(included) => included,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    false
                }
            })
            .collect()
    }

    fn resolve_selected(&self, selected: &str) -> PathBuf {
        let relative = selected.trim_start_matches(['/', '\\']);
        normalize_lexically(&self.root.join(relative))
    }

    fn read_section<F>(&self, path: &Path, read: &F) -> BundleSection
    where
        F: Fn(&Path) -> io::Result<Vec<u8>>,
    {
        let relative_path = self.filter.relative_path(path);
        let language = language_tag(path);
        let body = match read(path) {
            Ok(bytes) => {
                let content = match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        log::debug!("Decoding {} lossily: {}", path.display(), e);
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                SectionBody::Content(content)
            }
            Err(e) => {
                log::error!("Error reading {}: {}", path.display(), e);
                SectionBody::Error(e.to_string())
            }
        };
        BundleSection {
            relative_path,
            language,
            body,
        }
    }
}

pub fn has_bundle_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| BUNDLE_EXTENSIONS.contains(&ext))
}

/// Code fence tag for `path`: its extension, or `text` when it has none.
pub fn language_tag(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE_TAG.to_string())
}

/// Paths from a pasted list: one per line, blank lines and `#` or `//` comments dropped.
pub fn parse_file_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(String::from)
        .collect()
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
