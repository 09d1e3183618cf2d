//! Query retrieval: embed, search, join
//!
//! `MatchRetriever` turns query text into an embedding, asks the vector
//! index for the nearest positions and joins each position against the
//! metadata store. Index and store are shared read-only, so one retriever
//! can serve concurrent callers.

use std::sync::Arc;

use kickoff_core::{
    AppConfig, EmbeddingProvider, KickoffError, MatchedDocument, MetadataStore, Result,
};
use kickoff_vector::{create_embedding_provider, FlatIndex, VectorIndex};
use tracing::{Instrument, Span};

/// Default number of results when none is configured
pub const DEFAULT_TOP_K: usize = 5;

/// Retriever over a paired vector index and metadata store
pub struct MatchRetriever {
    index: Arc<dyn VectorIndex>,
    store: Arc<MetadataStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    default_top_k: usize,
    span: Span,
}

impl MatchRetriever {
    /// Pair an index with its metadata and embedding provider.
    ///
    /// Fails fast if the index and store disagree on size, or if the
    /// provider produces vectors of a different length than the index holds.
    pub fn new(
        index: Arc<dyn VectorIndex>,
        store: Arc<MetadataStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if index.len() != store.len() {
            return Err(KickoffError::IndexMetadataMismatch(format!(
                "index holds {} vectors but metadata holds {} records",
                index.len(),
                store.len()
            )));
        }
        if embedder.dimension() != index.dimension() {
            return Err(KickoffError::ModelIndexMismatch {
                model: embedder.model_id().to_string(),
                provider: embedder.dimension(),
                index: index.dimension(),
            });
        }

        Ok(Self {
            index,
            store,
            embedder,
            default_top_k: DEFAULT_TOP_K,
            span: tracing::info_span!("retriever"),
        })
    }

    /// Load index, metadata and embedding provider named by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!("Loading vector index...");
        let index = FlatIndex::load(&config.retrieval.index_path)?;

        tracing::info!("Loading match metadata...");
        let store = MetadataStore::load(&config.retrieval.metadata_path)?;

        tracing::info!(model = %config.embedding.model, "Loading embedding model");
        let embedder = create_embedding_provider(&config.embedding)?;

        Ok(Self::new(Arc::new(index), Arc::new(store), embedder)?
            .with_default_top_k(config.retrieval.default_top_k))
    }

    /// Set the `k` used by [`MatchRetriever::search_default`]
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    /// Emit this retriever's events under `span`
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Number of searchable documents
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Up to `top_k` documents closest to `query`, nearest first
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<MatchedDocument>> {
        self.search_inner(query, top_k)
            .instrument(self.span.clone())
            .await
    }

    /// [`MatchRetriever::search`] with the configured default `k`
    pub async fn search_default(&self, query: &str) -> Result<Vec<MatchedDocument>> {
        self.search(query, self.default_top_k).await
    }

    async fn search_inner(&self, query: &str, top_k: usize) -> Result<Vec<MatchedDocument>> {
        if top_k == 0 {
            return Err(KickoffError::InvalidArgument(
                "top_k must be a positive integer".to_string(),
            ));
        }
        tracing::info!(top_k, query, "Searching matches");

        let embedding = self.embedder.encode(query).await.map_err(|e| match e {
            KickoffError::EmbeddingFailed(_) => e,
            other => KickoffError::EmbeddingFailed(other.to_string()),
        })?;

        let neighbors = self.index.search(&embedding, top_k)?;

        let matches = neighbors
            .into_iter()
            .map(|neighbor| {
                let text = self.store.get(neighbor.position).map_err(|_| {
                    KickoffError::IndexMetadataMismatch(format!(
                        "index returned position {} but metadata holds {} records",
                        neighbor.position,
                        self.store.len()
                    ))
                })?;
                tracing::debug!(
                    position = neighbor.position,
                    distance = neighbor.distance,
                    "Matched document"
                );
                Ok(MatchedDocument {
                    position: neighbor.position,
                    distance: neighbor.distance,
                    text: text.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(found = matches.len(), "Search finished");
        Ok(matches)
    }
}
