//! Kickoff Core - Shared types, errors and traits
//!
//! This crate defines the abstractions every other Kickoff crate builds on:
//! - The error taxonomy for the retrieval core
//! - Search result types (neighbors and matched documents)
//! - The embedding provider trait
//! - Distance metric selection
//! - Configuration management
//! - The positional metadata store
//!
//! Author: hephaex@gmail.com

pub mod config;
pub mod metadata;

pub use config::{
    AppConfig, ConfigError, EmbeddingConfig, EmbeddingProviderKind, IngestConfig, LoggingConfig,
    RetrievalConfig,
};
pub use metadata::MetadataStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Kickoff operations
#[derive(Error, Debug)]
pub enum KickoffError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding model and the index disagree on vector length
    #[error("Model {model} embeds to {provider} dimensions but the index holds {index}")]
    ModelIndexMismatch {
        model: String,
        provider: usize,
        index: usize,
    },

    #[error("Cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Corrupt metadata: {0}")]
    CorruptMetadata(String),

    #[error("Position {position} out of range for store of {len} records")]
    OutOfRange { position: usize, len: usize },

    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Index and metadata do not match: {0}")]
    IndexMetadataMismatch(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KickoffError {
    /// Whether the error means the process must not keep serving queries.
    ///
    /// Per-query failures (embedding errors, bad `k`, a query vector of the
    /// wrong length) leave the loaded state intact and return `false`.
    /// A model whose width differs from the loaded index is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::EmbeddingFailed(_) | Self::InvalidArgument(_) | Self::DimensionMismatch { .. }
        )
    }

    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ConfigError> for KickoffError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KickoffError>;

// ============================================================================
// Search Types
// ============================================================================

/// An embedding vector
pub type Embedding = Vec<f32>;

/// Distance metric an index is built with.
///
/// Every metric is expressed so that a smaller distance means more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean distance
    #[default]
    L2,
    /// One minus cosine similarity
    Cosine,
    /// Negated dot product
    InnerProduct,
}

impl DistanceMetric {
    /// Stable on-disk code for this metric
    pub fn code(self) -> u8 {
        match self {
            Self::L2 => 0,
            Self::Cosine => 1,
            Self::InnerProduct => 2,
        }
    }

    /// Inverse of [`DistanceMetric::code`]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::L2),
            1 => Some(Self::Cosine),
            2 => Some(Self::InnerProduct),
            _ => None,
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::L2 => write!(f, "l2"),
            Self::Cosine => write!(f, "cosine"),
            Self::InnerProduct => write!(f, "inner_product"),
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" | "euclidean" => Ok(Self::L2),
            "cosine" => Ok(Self::Cosine),
            "inner_product" | "ip" | "dot" => Ok(Self::InnerProduct),
            _ => Err(ConfigError::InvalidValue {
                key: "metric".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// One nearest-neighbor hit: a position in the index and its distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Distance to the query under the index metric
    pub distance: f32,

    /// Zero-based position in the index
    pub position: usize,
}

impl Neighbor {
    pub fn new(distance: f32, position: usize) -> Self {
        Self { distance, position }
    }
}

/// A metadata record joined to the search hit that selected it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedDocument {
    /// Position shared by the index vector and the metadata record
    pub position: usize,

    /// Distance to the query
    pub distance: f32,

    /// Full document text
    pub text: String,
}

impl AsRef<str> for MatchedDocument {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Maps text to a dense vector of fixed dimension
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn encode(&self, text: &str) -> Result<Embedding>;

    /// Embed several texts, preserving input order
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.encode(text).await?);
        }
        Ok(embeddings)
    }

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    /// Model identifier, for logging
    fn model_id(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
