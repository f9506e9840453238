//! Remote artifact path scheme and the tensor codec for embedding and
//! projection matrices.

use ndarray::Array2;

use crate::distance::DistanceMetric;
use crate::error::{EmbedCloudError, EmbedCloudResult};
use crate::projection::ProjectionMethod;

/// Team-files paths for the artifacts belonging to one (project, model,
/// method, metric) combination.
///
/// The info, cfg, and embeddings artifacts are produced upstream by the
/// embedding calculator; the projections artifact is owned by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub info: String,
    pub cfg: String,
    pub embeddings: String,
    pub projections: String,
}

impl ArtifactPaths {
    pub fn new(
        project_id: i64,
        save_name: &str,
        method: ProjectionMethod,
        metric: DistanceMetric,
    ) -> Self {
        let prefix = format!("embeddings/{}", project_id);
        ArtifactPaths {
            info: format!("{}/{}_info.json", prefix, save_name),
            cfg: format!("{}/{}_cfg.json", prefix, save_name),
            embeddings: format!("{}/{}_embeddings.bin", prefix, save_name),
            projections: format!("{}/{}_projections_{}_{}.bin", prefix, save_name, method, metric),
        }
    }
}

/// Encodes a matrix for storage.
pub fn encode_tensor(tensor: &Array2<f32>) -> EmbedCloudResult<Vec<u8>> {
    bincode::serialize(tensor)
        .map_err(|e| EmbedCloudError::Serialization(format!("failed to encode tensor: {}", e)))
}

/// Decodes a matrix from its stored representation.
pub fn decode_tensor(bytes: &[u8]) -> EmbedCloudResult<Array2<f32>> {
    bincode::deserialize(bytes)
        .map_err(|e| EmbedCloudError::Deserialization(format!("failed to decode tensor: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_path_scheme() {
        let paths = ArtifactPaths::new(
            7,
            "facebook_convnext-tiny-224",
            ProjectionMethod::Tsne,
            DistanceMetric::Cosine,
        );
        assert_eq!(paths.info, "embeddings/7/facebook_convnext-tiny-224_info.json");
        assert_eq!(paths.cfg, "embeddings/7/facebook_convnext-tiny-224_cfg.json");
        assert_eq!(paths.embeddings, "embeddings/7/facebook_convnext-tiny-224_embeddings.bin");
        assert_eq!(
            paths.projections,
            "embeddings/7/facebook_convnext-tiny-224_projections_t-SNE_cosine.bin"
        );
    }

    #[test]
    fn test_projections_path_varies_with_method_and_metric() {
        let a = ArtifactPaths::new(1, "m", ProjectionMethod::Pca, DistanceMetric::Euclidean);
        let b = ArtifactPaths::new(1, "m", ProjectionMethod::PcaUmap, DistanceMetric::Euclidean);
        let c = ArtifactPaths::new(1, "m", ProjectionMethod::Pca, DistanceMetric::Cosine);
        assert_ne!(a.projections, b.projections);
        assert_ne!(a.projections, c.projections);
        // The cache key does not cover the embedding artifacts themselves.
        assert_eq!(a.embeddings, b.embeddings);
    }

    #[test]
    fn test_tensor_codec() {
        let tensor = arr2(&[[1.0f32, -2.5], [0.0, 4.25], [1e-7, 3.0]]);
        let bytes = encode_tensor(&tensor).unwrap();
        let decoded = decode_tensor(&bytes).unwrap();
        assert_eq!(decoded, tensor);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_tensor(&[0xde, 0xad]),
            Err(EmbedCloudError::Deserialization(_))
        ));
    }
}
