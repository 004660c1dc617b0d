//! Configuration management for ocrjudge using the prefer crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::ReviewerConfig;
use crate::models::VariantSource;
use crate::reconcile::PipelineConfig;
use crate::search::SearchConfig;
use crate::store::{discover_variant_sources, ConsolidatedStore, StoreError};

/// Default directory holding the variant stores.
pub const DEFAULT_TEXT_DIR: &str = "text";

/// Default consolidated store location.
pub const DEFAULT_OUTPUT: &str = "text_cleaned/cleaned_consolidated_docs.csv";

fn default_content_roots() -> BTreeMap<String, String> {
    [("pdf", "pdf"), ("img", "img"), ("text", "text")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Application settings, with every path resolved.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding `summary_{engine}_{lang}.csv` stores.
    pub text_dir: PathBuf,
    /// Consolidated store path.
    pub output: PathBuf,
    /// Variant stores to merge, in slot order. Empty means discover.
    pub variants: Vec<VariantSource>,
    /// Content category roots served by the content endpoint.
    pub content_roots: BTreeMap<String, PathBuf>,
    pub reviewer: ReviewerConfig,
    pub pipeline: PipelineConfig,
    pub search: SearchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_dir: PathBuf::from(DEFAULT_TEXT_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            variants: Vec::new(),
            content_roots: default_content_roots()
                .into_iter()
                .map(|(k, v)| (k, PathBuf::from(v)))
                .collect(),
            reviewer: ReviewerConfig::default(),
            pipeline: PipelineConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Settings {
    /// Settings rooted at a directory, with defaults everywhere else.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        let mut settings = Self::default();
        Config::default().apply_to_settings(&mut settings, base_dir);
        settings
    }

    /// Variant sources in slot order.
    ///
    /// Configured variants win; otherwise every store in `text_dir` is used,
    /// sorted by file name so slot order is stable between runs.
    pub fn variant_sources(&self) -> Result<Vec<VariantSource>, StoreError> {
        if !self.variants.is_empty() {
            return Ok(self.variants.clone());
        }
        discover_variant_sources(&self.text_dir)
    }

    pub fn consolidated_store(&self) -> ConsolidatedStore {
        ConsolidatedStore::new(&self.output)
    }

    /// Root directory for a content category.
    pub fn content_root(&self, category: &str) -> Option<&Path> {
        self.content_roots.get(category).map(PathBuf::as_path)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the variant stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_dir: Option<String>,
    /// Consolidated store path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Variant stores to merge, in slot order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantSource>,
    /// Content category roots.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, String>,
    /// Reviewer service configuration.
    #[serde(default)]
    pub reviewer: ReviewerConfig,
    /// Pipeline pacing and failure handling.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Search configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers ocrjudge config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("ocrjudge").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        let text_dir = self.text_dir.as_deref().unwrap_or(DEFAULT_TEXT_DIR);
        settings.text_dir = self.resolve_path(text_dir, base_dir);

        let output = self.output.as_deref().unwrap_or(DEFAULT_OUTPUT);
        settings.output = self.resolve_path(output, base_dir);

        settings.variants = self.variants.clone();

        let mut content = default_content_roots();
        content.extend(self.content.clone());
        settings.content_roots = content
            .into_iter()
            .map(|(category, dir)| {
                let path = self.resolve_path(&dir, base_dir);
                (category, path)
            })
            .collect();

        settings.reviewer = self.reviewer.clone().with_env_overrides();
        settings.pipeline = self.pipeline.clone();

        let mut search = self.search.clone().with_env_overrides();
        search.dictionary = search
            .dictionary
            .map(|d| self.resolve_path(&d.to_string_lossy(), base_dir));
        settings.search = search;
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
}

/// Load settings with explicit options.
///
/// An explicit config path that cannot be read or parsed is an error; a
/// discovered one that fails is logged and ignored.
pub async fn load_settings_with_options(options: LoadOptions) -> Result<(Settings, Config), String> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?,
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    // Environment variables take precedence over the config file
    if let Some(dir) = std::env::var("OCRJUDGE_TEXT_DIR").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using OCRJUDGE_TEXT_DIR from environment: {}", dir);
        settings.text_dir = config.resolve_path(&dir, &base_dir);
    }
    if let Some(output) = std::env::var("OCRJUDGE_OUTPUT").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using OCRJUDGE_OUTPUT from environment: {}", output);
        settings.output = config.resolve_path(&output, &base_dir);
    }

    Ok((settings, config))
}
