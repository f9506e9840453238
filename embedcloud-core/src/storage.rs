//! Object-store abstraction over team-scoped remote file storage.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EmbedCloudError, EmbedCloudResult};

/// Minimal object-store interface: existence check, download, upload.
///
/// The server crate provides an HTTP-backed implementation against the
/// team-files API; `LocalObjectStore` backs tests and local runs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, path: &str) -> EmbedCloudResult<bool>;
    async fn download(&self, path: &str) -> EmbedCloudResult<Vec<u8>>;
    async fn upload(&self, path: &str, data: &[u8]) -> EmbedCloudResult<()>;
}

/// Filesystem-backed object store rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalObjectStore { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn exists(&self, path: &str) -> EmbedCloudResult<bool> {
        let full = self.resolve(path);
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(EmbedCloudError::IoError { path: full, source: e }),
        }
    }

    async fn download(&self, path: &str) -> EmbedCloudResult<Vec<u8>> {
        let full = self.resolve(path);
        debug!(path = %full.display(), "downloading from local store");
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EmbedCloudError::MissingArtifact(path.to_string()))
            }
            Err(e) => Err(EmbedCloudError::IoError { path: full, source: e }),
        }
    }

    async fn upload(&self, path: &str, data: &[u8]) -> EmbedCloudResult<()> {
        let full = self.resolve(path);
        debug!(path = %full.display(), bytes = data.len(), "uploading to local store");
        write_file(&full, data).await
    }
}

/// Writes `data` to `path`, creating parent directories as needed.
pub async fn write_file(path: &Path, data: &[u8]) -> EmbedCloudResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| EmbedCloudError::IoError { path: parent.to_path_buf(), source: e })?;
    }
    tokio::fs::write(path, data)
        .await
        .map_err(|e| EmbedCloudError::IoError { path: path.to_path_buf(), source: e })
}
