//! Configuration management
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{env}.toml, config/local.toml)
//! - Default values matching the stock ingestion setup

use crate::splitter::{LengthMeasure, SplitterConfig};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Document identifiers to ingest, resolved against `base_dir`
    /// unless absolute
    #[serde(default)]
    pub documents: Vec<String>,

    /// Directory that relative document identifiers resolve against
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Directory holding the on-disk vector store
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,

    /// Chunking configuration
    #[serde(default)]
    pub splitter: SplitterSettings,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitterSettings {
    /// Maximum chunk length, measured per `length`
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Trailing units repeated at the start of the next chunk
    #[serde(default)]
    pub chunk_overlap: usize,

    /// Length-counting function for the size bound
    #[serde(default)]
    pub length: LengthMeasure,

    /// Split separators, most-preferred first. None means the stock
    /// paragraph / line / word / character list.
    #[serde(default)]
    pub separators: Option<Vec<String>>,

    /// Treat separators as regex patterns instead of literals
    #[serde(default)]
    pub separator_is_regex: bool,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            length: LengthMeasure::default(),
            separators: None,
            separator_is_regex: false,
        }
    }
}

impl SplitterSettings {
    /// Build the splitter config, applying the stock separator list when
    /// none is configured.
    pub fn to_splitter_config(&self) -> SplitterConfig {
        let mut config = SplitterConfig::new(self.chunk_size, self.chunk_overlap)
            .with_length(self.length)
            .with_separator_is_regex(self.separator_is_regex);
        if let Some(ref separators) = self.separators {
            config = config.with_separators(separators.clone());
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: openai, local
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for hosted embedding services
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SPLITTER__CHUNK_SIZE=1024
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            base_dir: default_base_dir(),
            persist_dir: default_persist_dir(),
            splitter: SplitterSettings::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("pdfs")
}

fn default_persist_dir() -> PathBuf {
    PathBuf::from("memory")
}

fn default_chunk_size() -> usize {
    512
}

fn default_embedding_provider() -> String {
    "local".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_batch_size() -> usize {
    20
}
