pub mod bundle;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod host;
pub mod render;
pub mod tree;

pub use bundle::{BundleDocument, BundleScope, BundleSection, Bundler, SectionBody, parse_file_list};
pub use commands::Workspace;
pub use config::{
    BundlerConfig, ConfigReader, ConfigSources, LayeredConfigReader, MapConfigReader,
    TomlConfigReader, determine_workspace_root, resolve_config_sources,
};
pub use error::{AppError, Result};
pub use filter::FileFilter;
pub use host::{DocumentSink, FileDocumentSink, Host, Notifier};
pub use render::{render_tree, render_tree_document};
pub use tree::{NameCollator, TreeBuilder, TreeNode};
