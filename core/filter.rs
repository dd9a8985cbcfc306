use crate::config::{BundlerConfig, GENERATED_OUTPUT_FILENAMES};
use crate::error::{AppError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log;
use std::fs;
use std::path::{Component, Path, PathBuf};

const DIR_SUFFIX: &str = "/**";

/// Inclusion predicates for one workspace, compiled from a config snapshot.
///
/// Exclude patterns fall in two groups. A pattern whose stem (the pattern minus a
/// trailing `/**`) contains `*` is a wildcard pattern, compiled as written: each `*`
/// matches any run of characters, separators included, and every other character is
/// literal. It must match either the whole relative path or the whole base name.
/// Every other pattern excludes any relative path that contains its stem as a
/// substring.
#[derive(Debug, Clone)]
pub struct FileFilter {
    root: PathBuf,
    max_file_size_bytes: u64,
    include_hidden_files: bool,
    substrings: Vec<String>,
    globs: GlobSet,
}

impl FileFilter {
    pub fn new(root: &Path, config: &BundlerConfig) -> Result<Self> {
        let mut substrings = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in &config.exclude_patterns {
            let stem = pattern.strip_suffix(DIR_SUFFIX).unwrap_or(pattern);
            if stem.is_empty() {
                log::warn!("Ignoring exclude pattern \"{}\": it matches nothing", pattern);
                continue;
            }
            if stem.contains('*') {
                // Full pattern, not the stem: `src/*/**` must not match `src/a.ts`.
                add_glob(&mut builder, pattern)?;
            } else {
                log::trace!("Adding substring pattern: {}", stem);
                substrings.push(stem.to_string());
            }
        }

        let globs = builder.build().map_err(|e| {
            log::error!("Error building glob set: {}", e);
            AppError::Glob(e.to_string())
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            max_file_size_bytes: config.max_file_size_bytes(),
            include_hidden_files: config.include_hidden_files,
            substrings,
            globs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `/`-separated path of `path` relative to the workspace root.
    pub fn relative_path(&self, path: &Path) -> String {
        // Paths outside the root keep their full form.
        let relative = pathdiff::diff_paths(path, &self.root).unwrap_or_else(|| path.to_path_buf());
        slash_path(&relative)
    }

    pub fn is_excluded(&self, relative_path: &str, name: &str) -> bool {
        // Substring rules first; they cover the common defaults.
        if let Some(s) = self.substrings.iter().find(|s| relative_path.contains(s.as_str())) {
            log::trace!("Path {} excluded by substring pattern {}", relative_path, s);
            return true;
        }
        if self.globs.is_match(relative_path) || self.globs.is_match(name) {
            log::trace!("Path {} excluded by glob pattern", relative_path);
            return true;
        }
        false
    }

    /// True when every path below `relative_path` is excluded as well, so a walk
    /// may skip the subtree without changing which files pass.
    pub fn prunes_subtree(&self, relative_path: &str) -> bool {
        self.substrings
            .iter()
            .any(|s| relative_path.contains(s.as_str()))
    }

    /// Stat `path` and return its size when the file passes every file rule.
    /// Entries that are not regular files (after following links) never pass.
    pub fn included_file_size(&self, path: &Path) -> Result<Option<u64>> {
        let metadata = fs::metadata(path).map_err(|e| AppError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            return Ok(None);
        }
        if metadata.len() > self.max_file_size_bytes {
            log::trace!(
                "File {} exceeds size limit ({} > {} bytes)",
                path.display(),
                metadata.len(),
                self.max_file_size_bytes
            );
            return Ok(None);
        }

        // Only root-level outputs are ours. A nested llm_tree.md is ordinary content.
        let relative_path = self.relative_path(path);
        if GENERATED_OUTPUT_FILENAMES.contains(&relative_path.as_str()) {
            log::trace!("Skipping generated output file: {}", relative_path);
            return Ok(None);
        }
        if self.is_excluded(&relative_path, &base_name(path)) {
            return Ok(None);
        }
        Ok(Some(metadata.len()))
    }

    pub fn should_include_file(&self, path: &Path) -> Result<bool> {
        Ok(self.included_file_size(path)?.is_some())
    }

    pub fn should_include_directory(&self, path: &Path) -> bool {
        let name = base_name(path);
        if !self.include_hidden_files && name.starts_with('.') {
            log::trace!("Skipping hidden directory: {}", path.display());
            return false;
        }
        !self.is_excluded(&self.relative_path(path), &name)
    }
}

fn add_glob(builder: &mut GlobSetBuilder, pattern: &str) -> Result<()> {
    let glob_str = wildcard_glob(pattern);
    let glob = GlobBuilder::new(&glob_str)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .map_err(|e| {
            log::error!("Invalid glob pattern \"{}\": {}", pattern, e);
            AppError::Glob(format!(
                "Invalid exclude pattern \"{}\" (compiled as \"{}\"): {}",
                pattern, glob_str, e
            ))
        })?;
    log::trace!("Adding glob pattern: {} (from {})", glob_str, pattern);
    builder.add(glob);
    Ok(())
}

/// Glob text for an exclude pattern in which `*` is the only metacharacter.
/// Runs of `*` collapse to one, so globset never sees a `**` token.
fn wildcard_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    let mut literal = String::new();
    let mut after_star = false;
    for c in pattern.chars() {
        if c == '*' {
            glob.push_str(&globset::escape(&literal));
            literal.clear();
            if !after_star {
                glob.push('*');
            }
            after_star = true;
        } else {
            literal.push(c);
            after_star = false;
        }
    }
    glob.push_str(&globset::escape(&literal));
    glob
}

pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
