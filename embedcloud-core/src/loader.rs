//! Loads the precomputed embedding artifacts for a project/model pair.

use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::artifacts::{decode_tensor, ArtifactPaths};
use crate::dataset::{EmbeddingDataset, InfoColumns};
use crate::error::{EmbedCloudError, EmbedCloudResult};
use crate::storage::{write_file, ObjectStore};

/// Downloads and decodes the info, cfg, and embeddings artifacts.
///
/// A missing info artifact means the embeddings were never calculated for
/// this project/model pair; that is fatal (`MissingArtifact`), no retry.
/// Downloaded artifacts are mirrored under `local_root`.
pub async fn load_dataset(
    store: &dyn ObjectStore,
    paths: &ArtifactPaths,
    local_root: &Path,
) -> EmbedCloudResult<(EmbeddingDataset, Value)> {
    if !store.exists(&paths.info).await? {
        return Err(EmbedCloudError::MissingArtifact(paths.info.clone()));
    }

    let info_bytes = fetch(store, &paths.info, local_root).await?;
    let cfg_bytes = fetch(store, &paths.cfg, local_root).await?;
    let embedding_bytes = fetch(store, &paths.embeddings, local_root).await?;

    let columns: InfoColumns = serde_json::from_slice(&info_bytes).map_err(|e| {
        EmbedCloudError::Deserialization(format!("invalid info artifact {}: {}", paths.info, e))
    })?;
    let cfg: Value = serde_json::from_slice(&cfg_bytes).map_err(|e| {
        EmbedCloudError::Deserialization(format!("invalid cfg artifact {}: {}", paths.cfg, e))
    })?;
    let embeddings = decode_tensor(&embedding_bytes)?;

    let records = columns.into_records()?;
    let dataset = EmbeddingDataset::new(records, embeddings)?;
    info!(
        n = dataset.len(),
        dims = dataset.dimensions(),
        "embeddings loaded"
    );
    Ok((dataset, cfg))
}

async fn fetch(
    store: &dyn ObjectStore,
    path: &str,
    local_root: &Path,
) -> EmbedCloudResult<Vec<u8>> {
    let bytes = store.download(path).await?;
    write_file(&local_root.join(path), &bytes).await?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::encode_tensor;
    use crate::distance::DistanceMetric;
    use crate::projection::ProjectionMethod;
    use crate::storage::LocalObjectStore;
    use ndarray::arr2;
    use tempfile::tempdir;

    fn test_paths() -> ArtifactPaths {
        ArtifactPaths::new(5, "model", ProjectionMethod::Umap, DistanceMetric::Euclidean)
    }

    async fn seed_artifacts(store: &LocalObjectStore, paths: &ArtifactPaths, rows: usize) {
        let info = serde_json::json!({
            "image_id": (0..rows as i64).collect::<Vec<_>>(),
            "object_id": (0..rows as i64).collect::<Vec<_>>(),
            "object_cls": (0..rows).map(|_| "cat").collect::<Vec<_>>(),
        });
        store
            .upload(&paths.info, info.to_string().as_bytes())
            .await
            .unwrap();
        store.upload(&paths.cfg, br#"{"model":"test"}"#).await.unwrap();
        let embeddings = arr2(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let embeddings = embeddings.slice(ndarray::s![..rows.min(3), ..]).to_owned();
        store
            .upload(&paths.embeddings, &encode_tensor(&embeddings).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_dataset() {
        let remote = tempdir().unwrap();
        let local = tempdir().unwrap();
        let store = LocalObjectStore::new(remote.path());
        let paths = test_paths();
        seed_artifacts(&store, &paths, 3).await;

        let (dataset, cfg) = load_dataset(&store, &paths, local.path()).await.unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.dimensions(), 2);
        assert_eq!(cfg["model"], "test");
        // Artifacts are mirrored locally.
        assert!(local.path().join(&paths.info).is_file());
        assert!(local.path().join(&paths.embeddings).is_file());
    }

    #[tokio::test]
    async fn test_missing_info_is_fatal() {
        let remote = tempdir().unwrap();
        let local = tempdir().unwrap();
        let store = LocalObjectStore::new(remote.path());
        let paths = test_paths();

        let err = load_dataset(&store, &paths, local.path()).await.unwrap_err();
        assert!(matches!(err, EmbedCloudError::MissingArtifact(p) if p == paths.info));
    }

    #[tokio::test]
    async fn test_length_mismatch_is_fatal() {
        let remote = tempdir().unwrap();
        let local = tempdir().unwrap();
        let store = LocalObjectStore::new(remote.path());
        let paths = test_paths();
        // Two records, three embedding rows.
        seed_artifacts(&store, &paths, 2).await;
        let embeddings = arr2(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        store
            .upload(&paths.embeddings, &encode_tensor(&embeddings).unwrap())
            .await
            .unwrap();

        let err = load_dataset(&store, &paths, local.path()).await.unwrap_err();
        assert!(matches!(err, EmbedCloudError::LengthMismatch { records: 2, rows: 3 }));
    }
}
