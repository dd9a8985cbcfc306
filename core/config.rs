use crate::error::{AppError, Result};
use log;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const WORKSPACE_CONFIG_DIR: &str = ".llm-bundler";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const USER_CONFIG_DIR: &str = "llm-bundler";
/// Settings namespace; a config file may nest its keys under this table.
pub const SETTINGS_SECTION: &str = "llm-code-bundler";
pub const WORKSPACE_ENV_VAR: &str = "LLM_BUNDLER_WORKSPACE";

pub const TREE_OUTPUT_FILENAME: &str = "llm_tree.md";
pub const BUNDLE_OUTPUT_FILENAME: &str = "llm_bundle.md";
pub const PARTIAL_BUNDLE_OUTPUT_FILENAME: &str = "llm_partial_bundle.md";
pub const GENERATED_OUTPUT_FILENAMES: &[&str] = &[
    TREE_OUTPUT_FILENAME,
    BUNDLE_OUTPUT_FILENAME,
    PARTIAL_BUNDLE_OUTPUT_FILENAME,
];

pub const KEY_MAX_FILE_SIZE: &str = "maxFileSize";
pub const KEY_EXCLUDE_PATTERNS: &str = "excludePatterns";
pub const KEY_INCLUDE_HIDDEN_FILES: &str = "includeHiddenFiles";
pub const KEY_MAX_DEPTH: &str = "maxDepth";
pub const KEY_USE_GITIGNORE: &str = "useGitignore";

pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "node_modules/**",
    ".git/**",
    "dist/**",
    "build/**",
    "*.min.*",
    "*.bundle.*",
];

/// Filtering configuration for one invocation. Loaded once, never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    /// Largest file to include, in KB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub include_hidden_files: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Honour .gitignore files during full-mode discovery.
    #[serde(default)]
    pub use_gitignore: bool,
}

fn default_max_file_size() -> u64 {
    100
}
fn default_max_depth() -> usize {
    10
}
pub fn default_exclude_patterns() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            exclude_patterns: default_exclude_patterns(),
            include_hidden_files: false,
            max_depth: default_max_depth(),
            use_gitignore: false,
        }
    }
}

/// Read-only key-value view over a settings store.
pub trait ConfigReader {
    fn get(&self, key: &str) -> Option<toml::Value>;
}

/// Settings parsed from a single TOML document.
#[derive(Debug, Clone, Default)]
pub struct TomlConfigReader {
    table: toml::Table,
}

impl TomlConfigReader {
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let mut table = content.parse::<toml::Table>().map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config '{}': {}. Check TOML syntax and structure.",
                origin, e
            ))
        })?;
        if let Some(toml::Value::Table(section)) = table.remove(SETTINGS_SECTION) {
            log::trace!("Using [{}] section of {}", SETTINGS_SECTION, origin);
            table = section;
        }
        Ok(Self { table })
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, &config_path.display().to_string())
    }
}

impl ConfigReader for TomlConfigReader {
    fn get(&self, key: &str) -> Option<toml::Value> {
        self.table.get(key).cloned()
    }
}

/// In-memory settings, used for command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct MapConfigReader {
    values: BTreeMap<String, toml::Value>,
}

impl MapConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<toml::Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigReader for MapConfigReader {
    fn get(&self, key: &str) -> Option<toml::Value> {
        self.values.get(key).cloned()
    }
}

/// Stack of readers; the first layer holding a key wins.
#[derive(Default)]
pub struct LayeredConfigReader {
    layers: Vec<Box<dyn ConfigReader>>,
}

impl LayeredConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, reader: impl ConfigReader + 'static) -> Self {
        self.layers.push(Box::new(reader));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ConfigReader for LayeredConfigReader {
    fn get(&self, key: &str) -> Option<toml::Value> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

fn read_key<T: DeserializeOwned>(reader: &dyn ConfigReader, key: &str, default: T) -> Result<T> {
    match reader.get(key) {
        Some(value) => T::deserialize(value).map_err(|e| {
            AppError::Config(format!("Invalid value for '{}': {}", key, e.message()))
        }),
        None => Ok(default),
    }
}

impl BundlerConfig {
    /// Snapshot the recognised keys from `reader`, falling back to defaults.
    pub fn load(reader: &dyn ConfigReader) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            max_file_size: read_key(reader, KEY_MAX_FILE_SIZE, defaults.max_file_size)?,
            exclude_patterns: read_key(reader, KEY_EXCLUDE_PATTERNS, defaults.exclude_patterns)?,
            include_hidden_files: read_key(
                reader,
                KEY_INCLUDE_HIDDEN_FILES,
                defaults.include_hidden_files,
            )?,
            max_depth: read_key(reader, KEY_MAX_DEPTH, defaults.max_depth)?,
            use_gitignore: read_key(reader, KEY_USE_GITIGNORE, defaults.use_gitignore)?,
        };
        config.validate()?;
        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(AppError::Config(format!(
                "'{}' must be a positive number of kilobytes",
                KEY_MAX_FILE_SIZE
            )));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size.saturating_mul(1024)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn determine_workspace_root(cli_workspace: Option<&PathBuf>) -> Result<PathBuf> {
    let path_str_opt = cli_workspace
        .map(|p| p.to_string_lossy().to_string())
        .or_else(|| env::var(WORKSPACE_ENV_VAR).ok().filter(|s| !s.is_empty()));

    let path_to_resolve = match path_str_opt {
        Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
        None => env::current_dir().map_err(AppError::Io)?,
    };

    match path_to_resolve.canonicalize() {
        Ok(root) if root.is_dir() => Ok(root),
        _ => Err(AppError::MissingWorkspace(path_to_resolve)),
    }
}

/// Config files that apply to one workspace, highest priority first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSources {
    pub workspace_file: Option<PathBuf>,
    pub user_file: Option<PathBuf>,
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join(CONFIG_FILENAME))
}

pub fn resolve_config_sources(
    workspace_root: &Path,
    cli_config_file: Option<&String>,
    cli_disable_config: bool,
) -> Result<ConfigSources> {
    if cli_disable_config {
        log::debug!("Config file loading disabled via CLI flag.");
        return Ok(ConfigSources::default());
    }

    let workspace_file = match cli_config_file {
        Some(p_str) => {
            let path = PathBuf::from(shellexpand::tilde(p_str).as_ref());
            let path = if path.is_absolute() {
                path
            } else {
                workspace_root.join(path)
            };
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "Specified config file not found at path: {}",
                    path.display()
                )));
            }
            log::debug!("Using specified config file path: {}", path.display());
            Some(path)
        }
        None => {
            let default_path = workspace_root
                .join(WORKSPACE_CONFIG_DIR)
                .join(CONFIG_FILENAME);
            if default_path.is_file() {
                log::debug!("Using workspace config file: {}", default_path.display());
                Some(default_path)
            } else {
                log::debug!(
                    "No workspace config file found at: {}",
                    default_path.display()
                );
                None
            }
        }
    };

    let user_file = user_config_path().filter(|p| p.is_file());
    if let Some(path) = &user_file {
        log::debug!("Using user config file: {}", path.display());
    }

    Ok(ConfigSources {
        workspace_file,
        user_file,
    })
}

impl ConfigSources {
    /// Stack `overrides` over the workspace file over the user file.
    pub fn into_reader(self, overrides: MapConfigReader) -> Result<LayeredConfigReader> {
        let mut reader = LayeredConfigReader::new();
        if !overrides.is_empty() {
            reader = reader.with_layer(overrides);
        }
        if let Some(path) = &self.workspace_file {
            reader = reader.with_layer(TomlConfigReader::load_from_path(path)?);
        }
        if let Some(path) = &self.user_file {
            reader = reader.with_layer(TomlConfigReader::load_from_path(path)?);
        }
        log::trace!("Configuration layers: {}", reader.len());
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_keys_are_absent() {
        let config = BundlerConfig::load(&MapConfigReader::new()).unwrap();
        assert_eq!(config, BundlerConfig::default());
        assert_eq!(config.max_file_size, 100);
        assert_eq!(config.max_depth, 10);
        assert!(!config.include_hidden_files);
        assert!(config.exclude_patterns.contains(&"*.min.*".to_string()));
    }

    #[test]
    fn toml_section_is_preferred_over_top_level() {
        let reader = TomlConfigReader::parse(
            "[llm-code-bundler]\nmaxFileSize = 5\nexcludePatterns = [\"target/**\"]\n",
            "inline",
        )
        .unwrap();
        let config = BundlerConfig::load(&reader).unwrap();
        assert_eq!(config.max_file_size, 5);
        assert_eq!(config.exclude_patterns, vec!["target/**".to_string()]);
        assert_eq!(config.max_depth, 10);
    }

    #[test]
    fn first_layer_wins() {
        let user = MapConfigReader::new()
            .with(KEY_MAX_DEPTH, 3)
            .with(KEY_INCLUDE_HIDDEN_FILES, true);
        let workspace = MapConfigReader::new().with(KEY_MAX_DEPTH, 1);
        let reader = LayeredConfigReader::new()
            .with_layer(workspace)
            .with_layer(user);
        let config = BundlerConfig::load(&reader).unwrap();
        assert_eq!(config.max_depth, 1);
        assert!(config.include_hidden_files);
    }

    #[test]
    fn wrong_types_and_zero_size_are_rejected() {
        let reader = MapConfigReader::new().with(KEY_MAX_DEPTH, "deep");
        assert!(matches!(
            BundlerConfig::load(&reader),
            Err(AppError::Config(_))
        ));

        let reader = MapConfigReader::new().with(KEY_MAX_FILE_SIZE, 0);
        assert!(matches!(
            BundlerConfig::load(&reader),
            Err(AppError::Config(_))
        ));

        let reader = MapConfigReader::new().with(KEY_MAX_FILE_SIZE, -4);
        assert!(BundlerConfig::load(&reader).is_err());
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        assert!(matches!(
            TomlConfigReader::parse("maxFileSize = ", "broken.toml"),
            Err(AppError::TomlParse(_))
        ));
    }

    #[test]
    fn missing_workspace_is_reported() {
        let missing = PathBuf::from("/definitely/not/a/workspace/here");
        assert!(matches!(
            determine_workspace_root(Some(&missing)),
            Err(AppError::MissingWorkspace(_))
        ));
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let name = "nope.toml".to_string();
        assert!(matches!(
            resolve_config_sources(dir.path(), Some(&name), false),
            Err(AppError::Config(_))
        ));
        let sources = resolve_config_sources(dir.path(), Some(&name), true).unwrap();
        assert_eq!(sources, ConfigSources::default());
    }

    #[test]
    fn workspace_file_is_discovered() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(WORKSPACE_CONFIG_DIR);
        fs::create_dir_all(&cfg_dir).unwrap();
        fs::write(cfg_dir.join(CONFIG_FILENAME), "maxDepth = 2\n").unwrap();

        let sources = resolve_config_sources(dir.path(), None, false).unwrap();
        assert_eq!(
            sources.workspace_file,
            Some(cfg_dir.join(CONFIG_FILENAME))
        );
        let reader = sources
            .into_reader(MapConfigReader::new().with(KEY_MAX_FILE_SIZE, 7))
            .unwrap();
        let config = BundlerConfig::load(&reader).unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.max_file_size, 7);
    }
}
