//! Distance functions
//!
//! All metrics return "smaller is closer" so a single ascending sort
//! ranks results for any of them.

use kickoff_core::DistanceMetric;
use ndarray::ArrayView1;

/// Distance between `a` and `b` under `metric`.
///
/// Both views must have the same length.
pub fn distance(metric: DistanceMetric, a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    match metric {
        DistanceMetric::L2 => euclidean(a, b),
        DistanceMetric::Cosine => cosine_distance(a, b),
        DistanceMetric::InnerProduct => -a.dot(&b),
    }
}

fn euclidean(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn cosine_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let denom = a.dot(&a).sqrt() * b.dot(&b).sqrt();
    if denom <= f32::EPSILON {
        // Zero vectors have no direction
        return 1.0;
    }
    1.0 - a.dot(&b) / denom
}
