//! Configuration module for the retrieval engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CR_` and use double underscores
//! to separate nested levels:
//! - `CR_EMBEDDING__PROVIDER=voyage` sets `embedding.provider`
//! - `CR_SEARCH__TOP_K=20` sets `search.top_k`
//! - `CR_INDEXING__MAX_FILE_SIZE=50000` sets `indexing.max_file_size`

use crate::error::{IndexError, IndexResult};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// File selection and loading settings
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Query settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Content cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Provider name: "local", "openai" or "voyage"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for remote providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model override for remote providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Endpoint override for remote providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Vector dimensionality of the local TF-IDF model
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Request timeout for remote providers in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Maximum characters kept per document
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Substrings that exclude a path from indexing
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Extension allowlist; empty means every non-test file is indexed
    #[serde(default)]
    pub include_extensions: Vec<String>,

    /// Corpus root; filter rules only see the part of a path below it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Minimum cosine similarity for primary results
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Number of primary results requested per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Maximum number of file contents held in memory
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_provider() -> String {
    "local".to_string()
}
fn default_dimensions() -> usize {
    crate::vector::DEFAULT_LOCAL_DIMENSION
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_file_size() -> usize {
    100_000
}
fn default_exclude_patterns() -> Vec<String> {
    ["node_modules", ".git", "target", "dist", "build"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}
fn default_similarity_threshold() -> f32 {
    0.5
}
fn default_top_k() -> usize {
    10
}
fn default_cache_entries() -> usize {
    crate::storage::DEFAULT_CACHE_ENTRIES
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            embedding: EmbeddingConfig::default(),
            indexing: IndexingConfig::default(),
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: None,
            endpoint: None,
            dimensions: default_dimensions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            exclude_patterns: default_exclude_patterns(),
            include_extensions: Vec::new(),
            root: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_entries(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".coderank/settings.toml"));

        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file, still honouring `CR_` overrides
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed("CR_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Find the settings file by looking for a .coderank directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".coderank");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> IndexResult<()> {
        let threshold = self.search.similarity_threshold;
        if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
            return Err(IndexError::ConfigError {
                reason: format!("search.similarity_threshold must be in [0.0, 1.0], got {threshold}"),
            });
        }
        if self.search.top_k == 0 {
            return Err(IndexError::ConfigError {
                reason: "search.top_k must be at least 1".to_string(),
            });
        }
        if self.embedding.dimensions == 0 {
            return Err(IndexError::ConfigError {
                reason: "embedding.dimensions must be at least 1".to_string(),
            });
        }
        if self.indexing.max_file_size == 0 {
            return Err(IndexError::ConfigError {
                reason: "indexing.max_file_size must be at least 1".to_string(),
            });
        }
        if self.cache.max_entries == 0 {
            return Err(IndexError::ConfigError {
                reason: "cache.max_entries must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
