//! Client for the data-platform API: team files (object storage), project
//! metadata, images, and annotations.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use embedcloud_core::{EmbedCloudError, EmbedCloudResult, ObjectStore};

#[derive(Debug, Clone, Deserialize)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassColor {
    pub name: String,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub obj_classes: Vec<ClassColor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageInfo {
    pub id: i64,
    pub name: String,
    pub preview_url: String,
}

/// The non-file-storage surface of the platform API. Annotation JSON is
/// treated as opaque.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn get_project(&self, project_id: i64) -> EmbedCloudResult<ProjectInfo>;
    async fn get_image(&self, image_id: i64) -> EmbedCloudResult<ImageInfo>;
    async fn download_annotation(&self, image_id: i64) -> EmbedCloudResult<Value>;
}

/// HTTP client for the platform API, scoped to one team for file storage.
pub struct TeamFilesClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    team_id: i64,
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

impl TeamFilesClient {
    /// Connects to the platform and fixes the team scope. With `team_id`
    /// unset, the first team visible to the token is used.
    pub async fn connect(
        base_url: impl Into<String>,
        token: impl Into<String>,
        team_id: Option<i64>,
    ) -> EmbedCloudResult<Self> {
        let mut client = TeamFilesClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            team_id: 0,
        };
        let team_id = match team_id {
            Some(id) => id,
            None => {
                let teams: Vec<TeamInfo> = client.get_json("teams").await?;
                let first = teams.into_iter().next().ok_or_else(|| {
                    EmbedCloudError::ApiError("no teams visible to this token".to_string())
                })?;
                info!(team_id = first.id, team = %first.name, "resolved default team");
                first.id
            }
        };
        client.team_id = team_id;
        Ok(client)
    }

    pub fn team_id(&self) -> i64 {
        self.team_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> EmbedCloudResult<T> {
        let url = self.url(path);
        debug!(url = %url, "platform GET");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EmbedCloudError::ApiError(format!("GET {} failed: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedCloudError::ApiError(format!(
                "GET {} returned {}: {}",
                url, status, body
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| EmbedCloudError::ApiError(format!("invalid response from {}: {}", url, e)))
    }
}

#[async_trait]
impl PlatformApi for TeamFilesClient {
    async fn get_project(&self, project_id: i64) -> EmbedCloudResult<ProjectInfo> {
        self.get_json(&format!("projects/{}", project_id)).await
    }

    async fn get_image(&self, image_id: i64) -> EmbedCloudResult<ImageInfo> {
        self.get_json(&format!("images/{}", image_id)).await
    }

    async fn download_annotation(&self, image_id: i64) -> EmbedCloudResult<Value> {
        self.get_json(&format!("annotations/{}", image_id)).await
    }
}

#[async_trait]
impl ObjectStore for TeamFilesClient {
    async fn exists(&self, path: &str) -> EmbedCloudResult<bool> {
        let response: ExistsResponse = self
            .get_json(&format!("teams/{}/files/exists?path={}", self.team_id, path))
            .await?;
        Ok(response.exists)
    }

    async fn download(&self, path: &str) -> EmbedCloudResult<Vec<u8>> {
        let url = self.url(&format!("teams/{}/files/download?path={}", self.team_id, path));
        debug!(url = %url, "team files download");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EmbedCloudError::StorageError(format!("download {} failed: {}", path, e)))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(EmbedCloudError::MissingArtifact(path.to_string()));
        }
        if !status.is_success() {
            return Err(EmbedCloudError::StorageError(format!(
                "download {} returned {}",
                path, status
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EmbedCloudError::StorageError(format!("download {} failed: {}", path, e)))?;
        Ok(bytes.to_vec())
    }

    async fn upload(&self, path: &str, data: &[u8]) -> EmbedCloudResult<()> {
        let url = self.url(&format!("teams/{}/files/upload?path={}", self.team_id, path));
        debug!(url = %url, bytes = data.len(), "team files upload");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| EmbedCloudError::StorageError(format!("upload {} failed: {}", path, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmbedCloudError::StorageError(format!(
                "upload {} returned {}",
                path, status
            )));
        }
        Ok(())
    }
}
