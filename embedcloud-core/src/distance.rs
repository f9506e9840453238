//! Defines distance metrics for comparing embedding vectors.

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use crate::error::{EmbedCloudError, EmbedCloudResult};

/// Enum representing supported distance metrics.
///
/// Both metrics are expressed as *distances* (lower is closer) so the
/// neighborhood computations in the projection engine can treat them
/// uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance.
    Euclidean,
    /// Cosine distance, `1 - cosine similarity`, range [0, 2].
    Cosine,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Euclidean => write!(f, "euclidean"),
            DistanceMetric::Cosine => write!(f, "cosine"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = EmbedCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "cosine" => Ok(DistanceMetric::Cosine),
            other => Err(EmbedCloudError::Configuration(format!(
                "unknown distance metric '{}', expected one of: euclidean, cosine",
                other
            ))),
        }
    }
}

/// Calculates the distance between two vectors based on the specified metric.
///
/// Returns `EmbedCloudError::DimensionMismatch` if vectors have different lengths.
/// Cosine distance of a zero vector is defined as 1.0 (similarity 0).
pub fn calculate_distance(
    metric: DistanceMetric,
    v1: ArrayView1<f32>,
    v2: ArrayView1<f32>,
) -> EmbedCloudResult<f32> {
    if v1.len() != v2.len() {
        return Err(EmbedCloudError::DimensionMismatch {
            expected: v1.len(),
            actual: v2.len(),
        });
    }

    match metric {
        DistanceMetric::Euclidean => {
            let diff = &v1 - &v2;
            Ok(diff.dot(&diff).sqrt())
        }
        DistanceMetric::Cosine => {
            let dot_product = v1.dot(&v2);
            let norm_v1 = v1.dot(&v1).sqrt();
            let norm_v2 = v2.dot(&v2).sqrt();

            if norm_v1 == 0.0 || norm_v2 == 0.0 {
                Ok(1.0)
            } else {
                let sim = (dot_product / (norm_v1 * norm_v2)).clamp(-1.0, 1.0);
                Ok(1.0 - sim)
            }
        }
    }
}

/// Computes the full symmetric pairwise distance matrix for the rows of `x`.
///
/// Used by the nonlinear projection methods (t-SNE, UMAP) which need all
/// inter-point distances up front.
pub fn pairwise_distances(metric: DistanceMetric, x: ArrayView2<f32>) -> Array2<f32> {
    let n = x.nrows();
    let mut distances = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            // Rows of one matrix always share a dimension, so this cannot fail.
            let d = calculate_distance(metric, x.row(i), x.row(j)).unwrap_or(0.0);
            distances[[i, j]] = d;
            distances[[j, i]] = d;
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_cosine_distance() {
        let v1 = arr1(&[1.0, 2.0, 3.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);
        let v3 = arr1(&[-1.0, -2.0, -3.0]);
        let v4 = arr1(&[2.0, 4.0, 6.0]);
        let v5 = arr1(&[1.0, 0.0, 0.0]);
        let v6 = arr1(&[0.0, 1.0, 0.0]);
        let zero = arr1(&[0.0, 0.0, 0.0]);

        // Identical and parallel vectors: distance 0.
        assert!((calculate_distance(DistanceMetric::Cosine, v1.view(), v2.view()).unwrap() - 0.0).abs() < 1e-6);
        assert!((calculate_distance(DistanceMetric::Cosine, v1.view(), v4.view()).unwrap() - 0.0).abs() < 1e-6);
        // Opposite vectors: distance 2.
        assert!((calculate_distance(DistanceMetric::Cosine, v1.view(), v3.view()).unwrap() - 2.0).abs() < 1e-6);
        // Orthogonal vectors: distance 1.
        assert!((calculate_distance(DistanceMetric::Cosine, v5.view(), v6.view()).unwrap() - 1.0).abs() < 1e-6);
        // Zero vector case: distance defined as 1.
        assert!((calculate_distance(DistanceMetric::Cosine, v1.view(), zero.view()).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_euclidean_distance() {
        let v1 = arr1(&[1.0, 2.0, 3.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);
        let v3 = arr1(&[4.0, 6.0, 8.0]); // Diff: [3, 4, 5]
        let zero = arr1(&[0.0, 0.0, 0.0]);

        assert!((calculate_distance(DistanceMetric::Euclidean, v1.view(), v2.view()).unwrap() - 0.0).abs() < 1e-6);
        // sqrt(3^2 + 4^2 + 5^2) = sqrt(50)
        assert!((calculate_distance(DistanceMetric::Euclidean, v1.view(), v3.view()).unwrap() - 50.0f32.sqrt()).abs() < 1e-6);
        // sqrt(1^2 + 2^2 + 3^2) = sqrt(14)
        assert!((calculate_distance(DistanceMetric::Euclidean, v1.view(), zero.view()).unwrap() - 14.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch() {
        let v1 = arr1(&[1.0, 2.0]);
        let v2 = arr1(&[1.0, 2.0, 3.0]);

        assert!(matches!(
            calculate_distance(DistanceMetric::Cosine, v1.view(), v2.view()),
            Err(EmbedCloudError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert!(matches!(
            calculate_distance(DistanceMetric::Euclidean, v1.view(), v2.view()),
            Err(EmbedCloudError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_pairwise_matrix_is_symmetric_with_zero_diagonal() {
        let x = arr2(&[[0.0, 0.0], [3.0, 4.0], [6.0, 8.0]]);
        let d = pairwise_distances(DistanceMetric::Euclidean, x.view());
        assert_eq!(d.dim(), (3, 3));
        for i in 0..3 {
            assert_eq!(d[[i, i]], 0.0);
            for j in 0..3 {
                assert!((d[[i, j]] - d[[j, i]]).abs() < 1e-6);
            }
        }
        assert!((d[[0, 1]] - 5.0).abs() < 1e-6);
        assert!((d[[0, 2]] - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_metric_parse_and_display() {
        assert_eq!("euclidean".parse::<DistanceMetric>().unwrap(), DistanceMetric::Euclidean);
        assert_eq!("cosine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!(DistanceMetric::Euclidean.to_string(), "euclidean");
        assert!(matches!(
            "manhattan".parse::<DistanceMetric>(),
            Err(EmbedCloudError::Configuration(_))
        ));
    }
}
