use crate::config::BundlerConfig;
use crate::filter::FileFilter;
use icu_collator::{Collator, CollatorOptions, Strength};
use log;
use std::cmp::Ordering;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// One filtered entry of the workspace, relative to its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Directory {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
        size: u64,
    },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory { name, .. } | TreeNode::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TreeNode::Directory { path, .. } | TreeNode::File { path, .. } => path,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, TreeNode::Directory { .. })
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Directory { children, .. } => children,
            TreeNode::File { .. } => &[],
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            TreeNode::File { size, .. } => Some(*size),
            TreeNode::Directory { .. } => None,
        }
    }
}

/// Root-locale, tertiary-strength name ordering: the ICU collation behind
/// JavaScript's `localeCompare`. Punctuation sorts before digits, digits before
/// letters, accents are secondary and lowercase precedes uppercase.
pub struct NameCollator {
    collator: Option<Collator>,
}

impl NameCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        let collator = match Collator::try_new(&Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                log::warn!("Collation data unavailable, sorting by code point: {}", e);
                None
            }
        };
        Self { collator }
    }

    /// Collation order, then code-point order so distinct names never tie.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b).then_with(|| a.cmp(b)),
            None => a.cmp(b),
        }
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TreeBuilder<'a> {
    filter: &'a FileFilter,
    max_depth: usize,
    collator: NameCollator,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(filter: &'a FileFilter, config: &BundlerConfig) -> Self {
        Self {
            filter,
            max_depth: config.max_depth,
            collator: NameCollator::new(),
        }
    }

    pub fn build(&self) -> Vec<TreeNode> {
        log::debug!("Building directory tree for {}", self.filter.root().display());
        self.build_directory_tree(self.filter.root(), 0)
    }

    /// Filtered, sorted children of `dir_path`. Levels deeper than `max_depth` are
    /// empty. Listing and stat failures drop the affected entry with a warning.
    pub fn build_directory_tree(&self, dir_path: &Path, depth: usize) -> Vec<TreeNode> {
        if depth > self.max_depth {
            log::trace!("Depth limit reached at {}", dir_path.display());
            return Vec::new();
        }

        let entries = match list_directory(dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Error reading directory {}: {}", dir_path.display(), e);
                return Vec::new();
            }
        };

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry_path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if entry.file_type().is_dir() {
                if self.filter.should_include_directory(entry_path) {
                    let children = self.build_directory_tree(entry_path, depth + 1);
                    items.push(TreeNode::Directory {
                        name,
                        path: self.filter.relative_path(entry_path),
                        children,
                    });
                }
                continue;
            }

            match self.filter.included_file_size(entry_path) {
                Ok(Some(size)) => items.push(TreeNode::File {
                    name,
                    path: self.filter.relative_path(entry_path),
                    size,
                }),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping {}: {}", entry_path.display(), e),
            }
        }

        items.sort_by(|a, b| compare_nodes(a, b, &self.collator));
        items
    }
}

fn list_directory(dir_path: &Path) -> Result<Vec<DirEntry>, walkdir::Error> {
    let mut entries = Vec::new();
    for result in WalkDir::new(dir_path).min_depth(1).max_depth(1) {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => log::warn!("Skipping unreadable entry in {}: {}", dir_path.display(), e),
        }
    }
    Ok(entries)
}

/// Directories first, then files; names in collation order within each group.
pub fn compare_nodes(a: &TreeNode, b: &TreeNode, collator: &NameCollator) -> Ordering {
    match (a.is_directory(), b.is_directory()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => collator.compare(a.name(), b.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(TreeNode::name).collect()
    }

    #[test]
    fn directories_first_then_locale_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("z.txt"), "z").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let config = BundlerConfig::default();
        let filter = FileFilter::new(dir.path(), &config).unwrap();
        let tree = TreeBuilder::new(&filter, &config).build();
        assert_eq!(names(&tree), vec!["a", "b", "a.txt", "z.txt"]);
    }

    #[test]
    fn max_depth_zero_keeps_only_top_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();

        let config = BundlerConfig {
            max_depth: 0,
            ..BundlerConfig::default()
        };
        let filter = FileFilter::new(dir.path(), &config).unwrap();
        let tree = TreeBuilder::new(&filter, &config).build();
        assert_eq!(names(&tree), vec!["src", "README.md"]);
        assert!(tree[0].children().is_empty());

        let config = BundlerConfig {
            max_depth: 1,
            ..BundlerConfig::default()
        };
        let filter = FileFilter::new(dir.path(), &config).unwrap();
        let tree = TreeBuilder::new(&filter, &config).build();
        assert_eq!(names(tree[0].children()), vec!["nested", "lib.rs"]);
        assert!(tree[0].children()[0].children().is_empty());
    }

    #[test]
    fn filtered_entries_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".github/workflows")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(dir.path().join("app.min.js"), "").unwrap();
        fs::write(dir.path().join("app.js"), "let a = 1;").unwrap();

        let config = BundlerConfig::default();
        let filter = FileFilter::new(dir.path(), &config).unwrap();
        let tree = TreeBuilder::new(&filter, &config).build();
        assert_eq!(names(&tree), vec!["app.js"]);
        assert_eq!(tree[0].size(), Some(10));
        assert_eq!(tree[0].path(), "app.js");
    }

    #[cfg(unix)]
    #[test]
    fn broken_links_do_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.rs"), dir.path().join("src/dangling.rs"))
            .unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();

        let config = BundlerConfig::default();
        let filter = FileFilter::new(dir.path(), &config).unwrap();
        let tree = TreeBuilder::new(&filter, &config).build();
        assert_eq!(names(tree[0].children()), vec!["main.rs"]);
        assert_eq!(tree[0].children()[0].path(), "src/main.rs");
    }

    #[test]
    fn unreadable_root_yields_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let config = BundlerConfig::default();
        let filter = FileFilter::new(dir.path(), &config).unwrap();
        let builder = TreeBuilder::new(&filter, &config);
        assert!(builder.build_directory_tree(&missing, 0).is_empty());
    }

    #[test]
    fn collation_ignores_case_first() {
        let collator = NameCollator::new();
        assert_eq!(collator.compare("apple", "Banana"), Ordering::Less);
        assert_eq!(collator.compare("Zeta", "alpha"), Ordering::Greater);
        assert_eq!(collator.compare("readme", "README"), Ordering::Less);
        assert_eq!(collator.compare("a.txt", "a.txt"), Ordering::Equal);
    }

    #[test]
    fn collation_orders_punctuation_digits_and_accents() {
        let collator = NameCollator::new();
        let mut names = vec![
            "test.py",
            "test_utils.py",
            "a-b",
            "a.b",
            "a_b",
            "_x",
            "1x",
            "résumé.md",
            "resume.md",
            "rz.md",
        ];
        names.sort_by(|a, b| collator.compare(a, b));
        assert_eq!(
            names,
            vec![
                "_x",
                "1x",
                "a_b",
                "a-b",
                "a.b",
                "resume.md",
                "résumé.md",
                "rz.md",
                "test_utils.py",
                "test.py",
            ]
        );
    }

    #[test]
    fn tree_siblings_follow_collation() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["test.py", "test_utils.py", "_init.py", "1st.py"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let config = BundlerConfig::default();
        let filter = FileFilter::new(dir.path(), &config).unwrap();
        let tree = TreeBuilder::new(&filter, &config).build();
        assert_eq!(names(&tree), vec!["_init.py", "1st.py", "test_utils.py", "test.py"]);
    }
}
