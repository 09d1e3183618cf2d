//! Exact (brute-force) vector index
//!
//! Embeddings live in one row-major `N x D` matrix; row `i` is position `i`
//! for the lifetime of the index. Search scores every row and keeps the
//! `k` closest.

use std::cmp::Ordering;

use kickoff_core::{DistanceMetric, Embedding, KickoffError, Neighbor, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::distance::distance;
use crate::VectorIndex;

/// Immutable exact nearest-neighbor index
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    vectors: Array2<f32>,
    metric: DistanceMetric,
}

impl FlatIndex {
    /// Build an index from embeddings of uniform length
    pub fn build(embeddings: &[Embedding], metric: DistanceMetric) -> Result<Self> {
        let first = embeddings.first().ok_or(KickoffError::EmptyCorpus)?;
        let dimension = first.len();

        let mut data = Vec::with_capacity(embeddings.len() * dimension);
        for embedding in embeddings {
            if embedding.len() != dimension {
                return Err(KickoffError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            data.extend_from_slice(embedding);
        }

        let vectors = Array2::from_shape_vec((embeddings.len(), dimension), data)
            .map_err(|e| KickoffError::InvalidArgument(format!("bad embedding matrix: {e}")))?;

        Self::from_array(vectors, metric)
    }

    /// Wrap an existing `N x D` matrix
    pub fn from_array(vectors: Array2<f32>, metric: DistanceMetric) -> Result<Self> {
        if vectors.nrows() == 0 {
            return Err(KickoffError::EmptyCorpus);
        }
        if vectors.ncols() == 0 {
            return Err(KickoffError::InvalidArgument(
                "embeddings must have at least one component".to_string(),
            ));
        }
        if let Some(row) = vectors
            .outer_iter()
            .position(|row| row.iter().any(|v| !v.is_finite()))
        {
            return Err(KickoffError::InvalidArgument(format!(
                "embedding {row} contains non-finite values"
            )));
        }

        // Row-major storage keeps each position contiguous for save/load
        let vectors = if vectors.is_standard_layout() {
            vectors
        } else {
            vectors.as_standard_layout().to_owned()
        };

        Ok(Self { vectors, metric })
    }

    /// Embedding stored at `position`
    pub fn vector(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.vectors.nrows()).then(|| self.vectors.row(position))
    }

    /// All embeddings as an `N x D` view
    pub fn vectors(&self) -> ArrayView2<'_, f32> {
        self.vectors.view()
    }
}

fn by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.position.cmp(&b.position))
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(KickoffError::InvalidArgument(
                "k must be a positive integer".to_string(),
            ));
        }
        if query.len() != self.dimension() {
            return Err(KickoffError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(KickoffError::InvalidArgument(
                "query contains non-finite values".to_string(),
            ));
        }

        let query = ArrayView1::from(query);
        let mut hits: Vec<Neighbor> = self
            .vectors
            .outer_iter()
            .enumerate()
            .map(|(position, row)| Neighbor::new(distance(self.metric, row, query), position))
            .collect();

        // k > N degrades to returning everything
        let k = k.min(hits.len());
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_distance);
            hits.truncate(k);
        }
        hits.sort_unstable_by(by_distance);

        tracing::debug!(k, best = ?hits.first().map(|n| n.distance), "Index search");
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.vectors.nrows()
    }

    fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn corner_index() -> FlatIndex {
        FlatIndex::build(
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            DistanceMetric::L2,
        )
        .unwrap()
    }

    #[test]
    fn test_nearest_two_of_three() {
        let index = corner_index();
        let hits = index.search(&[0.9, 0.1], 2).unwrap();

        let positions: Vec<_> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 2]);
        assert!((hits[0].distance - 0.141_421).abs() < 1e-4);
        assert!((hits[1].distance - 0.905_539).abs() < 1e-4);
    }

    #[test]
    fn test_k_larger_than_corpus_returns_all() {
        let index = corner_index();
        let hits = index.search(&[0.9, 0.1], 10).unwrap();

        let positions: Vec<_> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 2, 1]);
    }

    #[test]
    fn test_zero_k_rejected() {
        let index = corner_index();
        assert!(matches!(
            index.search(&[0.0, 0.0], 0),
            Err(KickoffError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_query_dimension_checked() {
        let index = corner_index();
        match index.search(&[1.0, 0.0, 0.0], 1) {
            Err(KickoffError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            FlatIndex::build(&[], DistanceMetric::L2),
            Err(KickoffError::EmptyCorpus)
        ));
        assert!(matches!(
            FlatIndex::build(&[vec![1.0, 2.0], vec![1.0]], DistanceMetric::L2),
            Err(KickoffError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            FlatIndex::build(&[vec![], vec![]], DistanceMetric::L2),
            Err(KickoffError::InvalidArgument(_))
        ));
        assert!(matches!(
            FlatIndex::build(&[vec![f32::NAN, 1.0]], DistanceMetric::L2),
            Err(KickoffError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_ties_break_by_position() {
        let index = FlatIndex::build(
            &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            DistanceMetric::L2,
        )
        .unwrap();
        let hits = index.search(&[0.0, 1.0], 2).unwrap();
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 2);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let index = FlatIndex::build(
            &[vec![10.0, 0.0], vec![0.5, 0.5], vec![0.0, 3.0]],
            DistanceMetric::Cosine,
        )
        .unwrap();
        let hits = index.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].position, 0);
        assert!(hits[0].distance.abs() < 1e-6);
        assert_eq!(index.metric(), DistanceMetric::Cosine);
    }

    #[test]
    fn test_vector_lookup() {
        let index = corner_index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.vector(2).unwrap().to_vec(), vec![1.0, 1.0]);
        assert!(index.vector(3).is_none());
    }

    fn corpus() -> impl Strategy<Value = (Vec<Vec<f32>>, Vec<f32>)> {
        (1usize..6).prop_flat_map(|dim| {
            (
                prop::collection::vec(prop::collection::vec(-100.0f32..100.0, dim), 1..40),
                prop::collection::vec(-100.0f32..100.0, dim),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_search_count_and_order((embeddings, query) in corpus(), k in 1usize..60) {
            let index = FlatIndex::build(&embeddings, DistanceMetric::L2).unwrap();
            let hits = index.search(&query, k).unwrap();

            prop_assert_eq!(hits.len(), k.min(embeddings.len()));
            for pair in hits.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }

            // Nothing left out is closer than the furthest hit returned
            let worst = hits.last().unwrap().distance;
            let mut returned: Vec<_> = hits.iter().map(|n| n.position).collect();
            returned.sort_unstable();
            for position in 0..embeddings.len() {
                if returned.binary_search(&position).is_err() {
                    let d = distance(
                        DistanceMetric::L2,
                        index.vector(position).unwrap(),
                        ArrayView1::from(&query[..]),
                    );
                    prop_assert!(d >= worst);
                }
            }
        }
    }
}
