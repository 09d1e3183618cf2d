//! Embedding providers for query and document text
//!
//! Supports Ollama and OpenAI-compatible embedding APIs.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kickoff_core::{
    Embedding, EmbeddingConfig, EmbeddingProvider, EmbeddingProviderKind, KickoffError, Result,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Known output dimension of an embedding model
pub fn known_dimension(model: &str) -> Option<usize> {
    match model {
        "all-minilm" | "all-minilm:l6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" => Some(1024),
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| KickoffError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

fn check_dimension(embedding: Embedding, expected: usize) -> Result<Embedding> {
    if embedding.len() != expected {
        return Err(KickoffError::EmbeddingFailed(format!(
            "provider returned {} values, expected {expected}",
            embedding.len()
        )));
    }
    Ok(embedding)
}

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = known_dimension(&model).unwrap_or(768);

        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
            dimension,
        }
    }

    /// Override the expected vector length
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let mut embedding = Self::new(config.ollama_url.clone(), config.model.clone());
        embedding.client = http_client(config.timeout_secs)?;
        if let Some(dimension) = config.dimension {
            embedding.dimension = dimension;
        }
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn encode(&self, text: &str) -> Result<Embedding> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                KickoffError::EmbeddingFailed(format!("Ollama embedding request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(KickoffError::EmbeddingFailed(format!(
                "Ollama embedding error ({status}): {error_text}"
            )));
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            KickoffError::EmbeddingFailed(format!("Failed to parse embedding response: {e}"))
        })?;

        check_dimension(result.embedding, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// OpenAI Embedding Client
// ============================================================================

/// OpenAI (or compatible) embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        let dimension = known_dimension(&model).unwrap_or(1536);

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model,
            dimension,
        }
    }

    /// Point at an OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the expected vector length
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| KickoffError::ConfigError("OpenAI API key required".to_string()))?;

        let mut embedding = Self::new(api_key.clone(), config.model.clone());
        embedding.client = http_client(config.timeout_secs)?;
        if let Some(base_url) = &config.openai_base_url {
            embedding = embedding.with_base_url(base_url.clone());
        }
        if let Some(dimension) = config.dimension {
            embedding.dimension = dimension;
        }
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn encode(&self, text: &str) -> Result<Embedding> {
        let results = self.encode_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| KickoffError::EmbeddingFailed("No embedding returned".to_string()))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OpenAiEmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| KickoffError::EmbeddingFailed(format!("Embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(KickoffError::EmbeddingFailed(format!(
                "OpenAI embedding error ({status}): {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            KickoffError::EmbeddingFailed(format!("Failed to parse embedding response: {e}"))
        })?;

        if result.data.len() != texts.len() {
            return Err(KickoffError::EmbeddingFailed(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                result.data.len()
            )));
        }

        // Sort by index and extract embeddings
        let mut embeddings = result.data;
        embeddings.sort_by_key(|e| e.index);

        embeddings
            .into_iter()
            .map(|e| check_dimension(e.embedding, self.dimension))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding provider from config
pub fn create_embedding_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::Ollama => Arc::new(OllamaEmbedding::from_config(config)?),
        EmbeddingProviderKind::OpenAI => Arc::new(OpenAiEmbedding::from_config(config)?),
    };

    tracing::info!(
        provider = ?config.provider,
        model = provider.model_id(),
        dimension = provider.dimension(),
        "Embedding provider ready"
    );
    Ok(provider)
}

// ============================================================================
// Tests
// ============================================================================
