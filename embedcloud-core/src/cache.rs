//! Remote cache for projection artifacts.
//!
//! One artifact per (project, model, method, metric) key; the only
//! invalidation is the explicit force flag. The key does not cover the
//! embedding content, so re-embedded projects must be recomputed with the
//! force flag (see DESIGN.md).

use ndarray::Array2;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::artifacts::{decode_tensor, encode_tensor, ArtifactPaths};
use crate::error::EmbedCloudResult;
use crate::storage::{write_file, ObjectStore};

/// Whether a projection came from the remote cache or was freshly computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionSource {
    Cache,
    Computed,
}

/// Cache-or-compute policy over an [`ObjectStore`], mirroring downloaded and
/// computed artifacts under a local directory.
pub struct ProjectionCache {
    store: Arc<dyn ObjectStore>,
    local_root: PathBuf,
}

impl ProjectionCache {
    pub fn new(store: Arc<dyn ObjectStore>, local_root: impl Into<PathBuf>) -> Self {
        ProjectionCache { store, local_root: local_root.into() }
    }

    /// Returns the cached projection for the key embodied in
    /// `paths.projections`, or computes, persists, and uploads a fresh one.
    ///
    /// With `force` set the remote artifact is ignored and overwritten.
    pub async fn load_or_compute<F>(
        &self,
        paths: &ArtifactPaths,
        force: bool,
        compute: F,
    ) -> EmbedCloudResult<(Array2<f32>, ProjectionSource)>
    where
        F: FnOnce() -> EmbedCloudResult<Array2<f32>>,
    {
        let remote = &paths.projections;
        if !force && self.store.exists(remote).await? {
            info!(path = %remote, "reusing cached projections");
            let bytes = self.store.download(remote).await?;
            write_file(&self.local_root.join(remote), &bytes).await?;
            let projections = decode_tensor(&bytes)?;
            return Ok((projections, ProjectionSource::Cache));
        }

        if force {
            debug!(path = %remote, "force flag set, recomputing projections");
        } else {
            debug!(path = %remote, "no cached projections, computing");
        }
        let projections = compute()?;
        let bytes = encode_tensor(&projections)?;
        write_file(&self.local_root.join(remote), &bytes).await?;
        info!(path = %remote, bytes = bytes.len(), "uploading projections");
        self.store.upload(remote, &bytes).await?;
        Ok((projections, ProjectionSource::Computed))
    }
}
