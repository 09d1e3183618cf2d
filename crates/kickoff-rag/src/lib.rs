//! Kickoff RAG - Match retrieval and summary pipeline
//!
//! This crate wires the retrieval core together:
//! - `MatchRetriever` embeds a query, searches the vector index and joins
//!   the hits against the metadata store
//! - `Summarizer` renders the matched documents as a plain-text report
//! - `RagPipeline` chains the two for a single query call
//!
//! Author: hephaex@gmail.com

use kickoff_core::{AppConfig, Result};
use tracing::{Instrument, Span};

pub mod retriever;
pub mod summary;

pub use retriever::{MatchRetriever, DEFAULT_TOP_K};
pub use summary::{Field, MatchFields, Summarizer, NO_MATCHES};

// ============================================================================
// Pipeline
// ============================================================================

/// Query text in, match report out
pub struct RagPipeline {
    retriever: MatchRetriever,
    summarizer: Summarizer,
    span: Span,
}

impl RagPipeline {
    /// Create a pipeline around an existing retriever
    pub fn new(retriever: MatchRetriever) -> Self {
        Self {
            retriever,
            summarizer: Summarizer::new(),
            span: tracing::info_span!("rag_pipeline"),
        }
    }

    /// Load everything the pipeline needs from `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let span = tracing::info_span!("rag_pipeline");
        let retriever = span.in_scope(|| {
            tracing::info!("Initializing RAG pipeline...");
            MatchRetriever::from_config(config)
        })?;
        span.in_scope(|| tracing::info!(documents = retriever.len(), "RAG pipeline ready"));

        Ok(Self::new(retriever).with_span(span))
    }

    /// Emit this pipeline's events under `span`
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn retriever(&self) -> &MatchRetriever {
        &self.retriever
    }

    /// Retrieve `top_k` matches for `text` and summarize them
    pub async fn query(&self, text: &str, top_k: usize) -> Result<String> {
        self.query_inner(text, top_k)
            .instrument(self.span.clone())
            .await
    }

    async fn query_inner(&self, text: &str, top_k: usize) -> Result<String> {
        tracing::info!(query = text, "Searching for query");
        let matches = self.retriever.search(text, top_k).await?;

        tracing::info!(matches = matches.len(), "Generating summary...");
        let summary = self.summarizer.summarize(&matches);
        tracing::info!(length = summary.len(), "Summary generated");
        tracing::debug!(%summary, "Summary text");

        Ok(summary)
    }

    /// [`RagPipeline::query`] with the retriever's default `k`
    pub async fn query_default(&self, text: &str) -> Result<String> {
        self.query(text, self.retriever.default_top_k()).await
    }
}
