use thiserror::Error;
use std::path::PathBuf;

/// The main result type for embedcloud-core operations.
pub type EmbedCloudResult<T> = Result<T, EmbedCloudError>;

/// Enum representing possible errors within the embedcloud-core library.
#[derive(Error, Debug)]
pub enum EmbedCloudError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Record/embedding length mismatch: {records} records, {rows} embedding rows")]
    LengthMismatch { records: usize, rows: usize },

    #[error("Dataset is empty, cannot compute projections")]
    EmptyDataset,

    #[error("Required artifact not found in remote storage: {0}")]
    MissingArtifact(String),

    #[error("I/O error accessing path {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Platform API error: {0}")]
    ApiError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for EmbedCloudError {
    fn from(err: std::io::Error) -> Self {
        EmbedCloudError::IoError {
            path: PathBuf::from("<unknown_io_source>"),
            source: err,
        }
    }
}
