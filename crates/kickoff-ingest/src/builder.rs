//! Index build
//!
//! Embeds documents in batches and pairs the resulting index with a
//! metadata store holding the same documents in the same order.

use std::path::Path;
use std::sync::Arc;

use kickoff_core::{DistanceMetric, EmbeddingProvider, KickoffError, MetadataStore};
use kickoff_vector::{FlatIndex, VectorIndex};

use crate::Result;

/// Builds a vector index and its metadata from document text
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    metric: DistanceMetric,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            batch_size: 32,
            metric: DistanceMetric::L2,
        }
    }

    /// Texts sent per provider call (at least 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Embed `documents`; position `i` of both outputs is `documents[i]`
    pub async fn build(&self, documents: &[String]) -> Result<(FlatIndex, MetadataStore)> {
        if documents.is_empty() {
            return Err(KickoffError::EmptyCorpus.into());
        }

        tracing::info!(
            documents = documents.len(),
            model = self.embedder.model_id(),
            batch_size = self.batch_size,
            "Embedding documents"
        );

        let mut embeddings = Vec::with_capacity(documents.len());
        for chunk in documents.chunks(self.batch_size) {
            let batch = self.embedder.encode_batch(chunk).await?;
            if batch.len() != chunk.len() {
                return Err(KickoffError::EmbeddingFailed(format!(
                    "provider returned {} embeddings for a batch of {}",
                    batch.len(),
                    chunk.len()
                ))
                .into());
            }
            embeddings.extend(batch);
            tracing::debug!(done = embeddings.len(), total = documents.len(), "Batch embedded");
        }

        let index = FlatIndex::build(&embeddings, self.metric)?;
        if index.dimension() != self.embedder.dimension() {
            return Err(KickoffError::ModelIndexMismatch {
                model: self.embedder.model_id().to_string(),
                provider: self.embedder.dimension(),
                index: index.dimension(),
            }
            .into());
        }

        Ok((index, MetadataStore::from_records(documents.to_vec())))
    }

    /// Build and write both artifacts, returning the document count
    pub async fn build_and_save(
        &self,
        documents: &[String],
        index_path: impl AsRef<Path>,
        metadata_path: impl AsRef<Path>,
    ) -> Result<usize> {
        let (index, store) = self.build(documents).await?;
        index.save(index_path)?;
        store.save(metadata_path)?;
        Ok(index.len())
    }
}
