//! The projection engine: reduces an N x D embedding matrix to N x 2
//! chart coordinates using one of five fixed method pipelines.

pub mod pca;
pub mod tsne;
pub mod umap;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::distance::DistanceMetric;
use crate::error::{EmbedCloudError, EmbedCloudResult};

/// Width of the intermediate PCA stage in the two-stage pipelines.
pub const PCA_STAGE_DIMS: usize = 64;

/// The supported projection methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionMethod {
    Pca,
    Umap,
    Tsne,
    /// PCA to 64 dimensions, then UMAP.
    PcaUmap,
    /// PCA to 64 dimensions, then t-SNE.
    PcaTsne,
}

impl ProjectionMethod {
    pub const ALL: [ProjectionMethod; 5] = [
        ProjectionMethod::Pca,
        ProjectionMethod::Umap,
        ProjectionMethod::Tsne,
        ProjectionMethod::PcaUmap,
        ProjectionMethod::PcaTsne,
    ];
}

impl fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectionMethod::Pca => "PCA",
            ProjectionMethod::Umap => "UMAP",
            ProjectionMethod::Tsne => "t-SNE",
            ProjectionMethod::PcaUmap => "PCA-UMAP",
            ProjectionMethod::PcaTsne => "PCA-t-SNE",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ProjectionMethod {
    type Err = EmbedCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PCA" => Ok(ProjectionMethod::Pca),
            "UMAP" => Ok(ProjectionMethod::Umap),
            "t-SNE" => Ok(ProjectionMethod::Tsne),
            "PCA-UMAP" => Ok(ProjectionMethod::PcaUmap),
            "PCA-t-SNE" => Ok(ProjectionMethod::PcaTsne),
            other => Err(EmbedCloudError::Configuration(format!(
                "unknown projection method '{}', expected one of: PCA, UMAP, t-SNE, PCA-UMAP, PCA-t-SNE",
                other
            ))),
        }
    }
}

/// Tunable parameters shared across the projection methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    pub metric: DistanceMetric,
    /// UMAP minimum-distance spread control.
    pub umap_min_dist: f32,
    /// Seed for the method RNGs. `None` uses entropy.
    pub seed: Option<u64>,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        ProjectionParams {
            metric: DistanceMetric::Euclidean,
            umap_min_dist: crate::config::DEFAULT_UMAP_MIN_DIST,
            seed: None,
        }
    }
}

/// Computes a 2D projection of `x`, one output row per input row.
pub fn compute_projection(
    x: ArrayView2<f32>,
    method: ProjectionMethod,
    params: &ProjectionParams,
) -> EmbedCloudResult<Array2<f32>> {
    if x.nrows() == 0 {
        return Err(EmbedCloudError::EmptyDataset);
    }
    info!(
        method = %method,
        metric = %params.metric,
        n = x.nrows(),
        dims = x.ncols(),
        "computing projection"
    );

    let projections = match method {
        ProjectionMethod::Pca => pca::fit_transform(x, 2, params.seed)?,
        ProjectionMethod::Umap => umap::fit_transform(x, params)?,
        ProjectionMethod::Tsne => tsne::fit_transform(x, params)?,
        ProjectionMethod::PcaUmap => {
            let reduced = pca_stage(x, params.seed)?;
            umap::fit_transform(reduced.view(), params)?
        }
        ProjectionMethod::PcaTsne => {
            let reduced = pca_stage(x, params.seed)?;
            tsne::fit_transform(reduced.view(), params)?
        }
    };

    debug_assert_eq!(projections.dim(), (x.nrows(), 2));
    Ok(projections)
}

/// The intermediate reduction of the two-stage pipelines. The stage width is
/// clamped to the input dimensionality for low-dimensional embeddings.
fn pca_stage(x: ArrayView2<f32>, seed: Option<u64>) -> EmbedCloudResult<Array2<f32>> {
    let stage_dims = PCA_STAGE_DIMS.min(x.ncols());
    pca::fit_transform(x, stage_dims, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::create_rng;
    use ndarray::Array2;
    use rand::Rng;

    fn random_embeddings(n: usize, d: usize, seed: u64) -> Array2<f32> {
        let mut rng = create_rng(Some(seed));
        Array2::from_shape_fn((n, d), |_| rng.gen_range(-1.0f32..1.0))
    }

    #[test]
    fn test_method_parse_exact_names() {
        assert_eq!("PCA".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::Pca);
        assert_eq!("UMAP".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::Umap);
        assert_eq!("t-SNE".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::Tsne);
        assert_eq!("PCA-UMAP".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::PcaUmap);
        assert_eq!("PCA-t-SNE".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::PcaTsne);
    }

    #[test]
    fn test_unknown_method_is_configuration_error() {
        // No silent fallback: a typo in the method name must surface.
        let err = "TriMap".parse::<ProjectionMethod>().unwrap_err();
        assert!(matches!(err, EmbedCloudError::Configuration(_)));
        assert!(err.to_string().contains("TriMap"));
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for method in ProjectionMethod::ALL {
            assert_eq!(method.to_string().parse::<ProjectionMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_all_methods_produce_n_by_2() {
        let x = random_embeddings(12, 8, 3);
        let params = ProjectionParams { seed: Some(3), ..Default::default() };
        for method in ProjectionMethod::ALL {
            let projections = compute_projection(x.view(), method, &params).unwrap();
            assert_eq!(projections.dim(), (12, 2), "shape mismatch for {}", method);
            assert!(projections.iter().all(|v| v.is_finite()), "non-finite output for {}", method);
        }
    }

    #[test]
    fn test_pca_handles_small_batches() {
        let x = random_embeddings(5, 8, 11);
        let params = ProjectionParams { seed: Some(11), ..Default::default() };
        let projections = compute_projection(x.view(), ProjectionMethod::Pca, &params).unwrap();
        assert_eq!(projections.dim(), (5, 2));
    }

    #[test]
    fn test_cosine_metric_supported_for_nonlinear_methods() {
        let x = random_embeddings(10, 6, 5);
        let params = ProjectionParams {
            metric: DistanceMetric::Cosine,
            seed: Some(5),
            ..Default::default()
        };
        for method in [ProjectionMethod::Umap, ProjectionMethod::Tsne] {
            let projections = compute_projection(x.view(), method, &params).unwrap();
            assert_eq!(projections.dim(), (10, 2));
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let x = Array2::<f32>::zeros((0, 4));
        let err =
            compute_projection(x.view(), ProjectionMethod::Pca, &ProjectionParams::default())
                .unwrap_err();
        assert!(matches!(err, EmbedCloudError::EmptyDataset));
    }
}
