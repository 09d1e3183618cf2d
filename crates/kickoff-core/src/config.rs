//! Kickoff Configuration Management
//!
//! Handles configuration from environment variables and TOML files,
//! with defaults that match the repository's data layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::DistanceMetric;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Index and metadata locations, query defaults
    pub retrieval: RetrievalConfig,

    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,

    /// Offline ingestion paths
    pub ingest: IngestConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overwrite every field whose variable `var` reports as set
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Retrieval
        if let Some(path) = var("KICKOFF_INDEX_PATH") {
            self.retrieval.index_path = PathBuf::from(path);
        }
        if let Some(path) = var("KICKOFF_METADATA_PATH") {
            self.retrieval.metadata_path = PathBuf::from(path);
        }
        if let Some(top_k) = var("KICKOFF_TOP_K") {
            self.retrieval.default_top_k =
                top_k.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "KICKOFF_TOP_K".to_string(),
                    value: top_k,
                })?;
        }
        if let Some(metric) = var("KICKOFF_METRIC") {
            self.retrieval.metric = metric.parse()?;
        }

        // Embedding
        if let Some(provider) = var("EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
        }
        if let Some(model) = var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(dimension) = var("EMBEDDING_DIMENSION") {
            self.embedding.dimension =
                Some(dimension.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "EMBEDDING_DIMENSION".to_string(),
                    value: dimension,
                })?);
        }
        if let Some(url) = var("OLLAMA_URL") {
            self.embedding.ollama_url = url;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.embedding.openai_api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.embedding.openai_base_url = Some(url);
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = var("LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }

        Ok(())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    ///
    /// Any variable that is set wins over the file, even when its value
    /// equals the built-in default.
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Reject values the retrieval path cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.default_top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.default_top_k".to_string(),
                value: "0".to_string(),
            });
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("embedding.model".to_string()));
        }
        if self.embedding.dimension == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "embedding.dimension".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Location of the vector index file
    pub index_path: PathBuf,

    /// Location of the metadata JSON file
    pub metadata_path: PathBuf,

    /// Number of results when the caller does not specify one
    pub default_top_k: usize,

    /// Metric used when building a new index
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("embeddings/football.index"),
            metadata_path: PathBuf::from("embeddings/metadata.json"),
            default_top_k: 5,
            metric: DistanceMetric::L2,
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider backend
    pub provider: EmbeddingProviderKind,

    /// Embedding model identifier
    pub model: String,

    /// Ollama server URL
    pub ollama_url: String,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for compatible APIs)
    pub openai_base_url: Option<String>,

    /// Vector dimension override for models without a known dimension
    pub dimension: Option<usize>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Texts per request when building an index
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Ollama,
            // MiniLM-L6-v2 as packaged by Ollama
            model: "all-minilm".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            openai_api_key: None,
            openai_base_url: None,
            dimension: None,
            timeout_secs: 30,
            batch_size: 32,
        }
    }
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Ollama,
    OpenAI,
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Offline ingestion paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory of per-season CSV files
    pub raw_dir: PathBuf,

    /// Concatenated CSV of all seasons
    pub combined_csv: PathBuf,

    /// Human-readable document dump
    pub documents_path: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            combined_csv: PathBuf::from("data/processed/epl_all_seasons.csv"),
            documents_path: PathBuf::from("data/processed/epl_documents.txt"),
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

    /// Directory for the debug-level `app.log` file, if any
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
            log_dir: None,
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.retrieval.default_top_k, 5);
        assert_eq!(config.retrieval.metric, DistanceMetric::L2);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
        assert_eq!(config.embedding.model, "all-minilm");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(
            "openai".parse::<EmbeddingProviderKind>().unwrap(),
            EmbeddingProviderKind::OpenAI
        );
        assert_eq!(
            "Ollama".parse::<EmbeddingProviderKind>().unwrap(),
            EmbeddingProviderKind::Ollama
        );
        assert!("invalid".parse::<EmbeddingProviderKind>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [retrieval]
            default_top_k = 10
            metric = "cosine"

            [embedding]
            provider = "openai"
            model = "text-embedding-3-small"
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.default_top_k, 10);
        assert_eq!(config.retrieval.metric, DistanceMetric::Cosine);
        assert_eq!(
            config.retrieval.index_path,
            PathBuf::from("embeddings/football.index")
        );
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAI);
        assert_eq!(config.embedding.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[retrieval]\nindex_path = \"/tmp/x.index\"\nmetadata_path = \"/tmp/x.json\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.retrieval.index_path, PathBuf::from("/tmp/x.index"));
        assert_eq!(config.retrieval.metadata_path, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn test_from_file_errors() {
        let missing = AppConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(missing, Err(ConfigError::FileReadError { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval\ndefault_top_k = ").unwrap();
        let broken = AppConfig::from_file(file.path());
        assert!(matches!(broken, Err(ConfigError::ParseError { .. })));
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_set_to_default_still_overrides_file() {
        let mut config = AppConfig::from_toml_str(
            r#"
            [retrieval]
            index_path = "/srv/other.index"
            default_top_k = 10
            metric = "cosine"

            [embedding]
            provider = "openai"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        config
            .apply_env(env(&[
                ("KICKOFF_INDEX_PATH", "embeddings/football.index"),
                ("KICKOFF_TOP_K", "5"),
                ("KICKOFF_METRIC", "l2"),
                ("EMBEDDING_PROVIDER", "ollama"),
                ("LOG_LEVEL", "info"),
            ]))
            .unwrap();

        assert_eq!(config.retrieval.default_top_k, 5);
        assert_eq!(config.retrieval.metric, DistanceMetric::L2);
        assert_eq!(
            config.retrieval.index_path,
            PathBuf::from("embeddings/football.index")
        );
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unset_env_keeps_file_values() {
        let mut config = AppConfig::from_toml_str("[retrieval]\ndefault_top_k = 10").unwrap();
        config
            .apply_env(env(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();

        assert_eq!(config.retrieval.default_top_k, 10);
        assert_eq!(config.embedding.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env(&[("KICKOFF_TOP_K", "many")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.default_top_k = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = AppConfig::default();
        config.embedding.model = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
