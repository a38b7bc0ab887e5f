//! Pipeline Configuration Management
//!
//! Handles configuration from environment variables and TOML files,
//! with defaults matching a local single-machine run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Aggregation pipeline configuration
    pub pipeline: PipelineConfig,

    /// Search index loading configuration
    pub index: IndexConfig,

    /// Graph database connection
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Pipeline
        if let Ok(dir) = std::env::var("UMLS_OUTPUT_DIR") {
            config.pipeline.output_dir = PathBuf::from(dir);
        }
        if let Ok(workers) = std::env::var("UMLS_WORKERS") {
            config.pipeline.workers = parse_positive("UMLS_WORKERS", workers)?;
        }
        if let Ok(size) = std::env::var("UMLS_SHARD_SIZE") {
            config.pipeline.shard_size = parse_positive("UMLS_SHARD_SIZE", size)?;
        }

        // Languages from environment variable (comma-separated)
        if let Ok(languages) = std::env::var("UMLS_LANGUAGES") {
            config.pipeline.languages = languages
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Index
        if let Ok(name) = std::env::var("INDEX_NAME") {
            config.index.index_name = name;
        }

        // SurrealDB
        if let Ok(url) = std::env::var("SURREALDB_URL") {
            config.database.surrealdb_url = url;
        }
        if let Ok(user) = std::env::var("SURREALDB_USER") {
            config.database.surrealdb_user = user;
        }
        if let Ok(pass) = std::env::var("SURREALDB_PASS") {
            config.database.surrealdb_pass = pass;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if env_config.pipeline.output_dir != defaults.pipeline.output_dir {
            self.pipeline.output_dir = env_config.pipeline.output_dir;
        }
        if env_config.pipeline.workers != defaults.pipeline.workers {
            self.pipeline.workers = env_config.pipeline.workers;
        }
        if env_config.pipeline.shard_size != defaults.pipeline.shard_size {
            self.pipeline.shard_size = env_config.pipeline.shard_size;
        }
        if env_config.pipeline.languages != defaults.pipeline.languages {
            self.pipeline.languages = env_config.pipeline.languages;
        }
        if env_config.index.index_name != defaults.index.index_name {
            self.index.index_name = env_config.index.index_name;
        }
        if env_config.database.surrealdb_url != defaults.database.surrealdb_url {
            self.database.surrealdb_url = env_config.database.surrealdb_url;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        // Always use env for credentials
        if std::env::var("SURREALDB_USER").is_ok() {
            self.database.surrealdb_user = env_config.database.surrealdb_user;
        }
        if std::env::var("SURREALDB_PASS").is_ok() {
            self.database.surrealdb_pass = env_config.database.surrealdb_pass;
        }

        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.min_term_length > p.max_term_length {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.min_term_length".to_string(),
                value: format!("{} > max_term_length {}", p.min_term_length, p.max_term_length),
            });
        }
        if p.languages.is_empty() {
            return Err(ConfigError::MissingRequired("pipeline.languages".to_string()));
        }
        if p.shard_size == 0 || p.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.shard_size/workers".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Path of the concept table artifact
    pub fn concept_table_path(&self) -> PathBuf {
        self.pipeline.output_dir.join(&self.pipeline.concept_table)
    }

    /// Path of the relation table artifact
    pub fn relation_table_path(&self) -> PathBuf {
        self.pipeline.output_dir.join(&self.pipeline.relation_table)
    }
}

fn parse_positive(key: &str, value: String) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}

/// Aggregation pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Shortest raw term kept (characters)
    pub min_term_length: usize,

    /// Longest raw term kept (characters)
    pub max_term_length: usize,

    /// Supported language codes
    pub languages: Vec<String>,

    /// Lines per map task
    pub shard_size: usize,

    /// Concurrent map/reduce tasks
    pub workers: usize,

    /// Directory holding the output artifacts
    pub output_dir: PathBuf,

    /// File name of the concept table
    pub concept_table: String,

    /// File name of the relation table
    pub relation_table: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_term_length: 2,
            max_term_length: 30,
            languages: vec!["ENG".to_string(), "DUT".to_string()],
            shard_size: 50_000,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            output_dir: PathBuf::from("output"),
            concept_table: "concepts.txt".to_string(),
            relation_table: "relations.txt".to_string(),
        }
    }
}

/// Search index loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Target index name
    pub index_name: String,

    /// Documents per bulk request
    pub batch_size: usize,

    /// Relevance weight assigned to every document
    pub votes: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_name: "autocomplete".to_string(),
            batch_size: 50,
            votes: 10,
        }
    }
}

/// Graph database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SurrealDB WebSocket URL
    pub surrealdb_url: String,

    /// SurrealDB username
    pub surrealdb_user: String,

    /// SurrealDB password
    pub surrealdb_pass: String,

    /// SurrealDB namespace
    pub surrealdb_namespace: String,

    /// SurrealDB database name
    pub surrealdb_database: String,

    /// Relations per write transaction
    pub batch_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            surrealdb_url: "ws://localhost:8000".to_string(),
            surrealdb_user: "root".to_string(),
            surrealdb_pass: "root".to_string(),
            surrealdb_namespace: "umls".to_string(),
            surrealdb_database: "concepts".to_string(),
            batch_size: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
