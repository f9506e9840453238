use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use embedcloud_core::EmbedCloudError;

/// Server-specific error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Core error: {0}")]
    CoreError(#[from] EmbedCloudError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Implement IntoResponse for ServerError to automatically convert errors into HTTP responses.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ServerError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, format!("Bad request: {}", reason))
            }
            ServerError::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {}", what)),
            ServerError::CoreError(core_err) => match core_err {
                EmbedCloudError::Configuration(msg) => {
                    (StatusCode::BAD_REQUEST, format!("Configuration error: {}", msg))
                }
                EmbedCloudError::DimensionMismatch { expected, actual } => (
                    StatusCode::BAD_REQUEST,
                    format!("Dimension mismatch: expected {}, got {}", expected, actual),
                ),
                EmbedCloudError::LengthMismatch { records, rows } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!(
                        "Record/embedding length mismatch: {} records, {} rows",
                        records, rows
                    ),
                ),
                EmbedCloudError::EmptyDataset => {
                    (StatusCode::BAD_REQUEST, "Dataset is empty".to_string())
                }
                EmbedCloudError::MissingArtifact(path) => {
                    (StatusCode::NOT_FOUND, format!("Artifact not found: {}", path))
                }
                EmbedCloudError::IoError { path, source } => {
                    error!(path=?path, error=%source, "Core I/O error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error (I/O)".to_string())
                }
                EmbedCloudError::Serialization(msg) | EmbedCloudError::Deserialization(msg) => {
                    error!(error=%msg, "Core serialization/deserialization error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error (Serialization)".to_string(),
                    )
                }
                EmbedCloudError::StorageError(msg) => {
                    error!(error=%msg, "Core storage error");
                    (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {}", msg))
                }
                EmbedCloudError::ApiError(msg) => {
                    error!(error=%msg, "Platform API error");
                    (StatusCode::BAD_GATEWAY, format!("Platform API error: {}", msg))
                }
                EmbedCloudError::Internal(msg) => {
                    error!(error=%msg, "Core internal error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
            },
            ServerError::Internal(msg) => {
                error!(error=%msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        // Log the error before returning response
        error!("Responding with status {}: {}", status, error_message);

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

// Define a Result type alias for handler functions
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_maps_to_404() {
        let err = ServerError::CoreError(EmbedCloudError::MissingArtifact("x".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_configuration_maps_to_400() {
        let err = ServerError::CoreError(EmbedCloudError::Configuration("bad".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_maps_to_502() {
        let err = ServerError::CoreError(EmbedCloudError::ApiError("down".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
