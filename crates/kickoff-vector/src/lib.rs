//! Kickoff Vector - Nearest-neighbor index and embedding providers
//!
//! Provides an exact in-memory index over document embeddings, its
//! on-disk format, and HTTP clients that turn query text into vectors.

use kickoff_core::{DistanceMetric, Neighbor, Result};

pub mod distance;
pub mod embedding;
pub mod flat;
pub mod persist;

pub use embedding::{create_embedding_provider, OllamaEmbedding, OpenAiEmbedding};
pub use flat::FlatIndex;

/// Read-only nearest-neighbor search over a fixed set of vectors
pub trait VectorIndex: Send + Sync {
    /// Up to `k` neighbors of `query`, by ascending distance
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Number of indexed vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of every indexed vector
    fn dimension(&self) -> usize;

    /// Metric fixed at build time
    fn metric(&self) -> DistanceMetric;
}
