pub mod artifacts;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod loader;
pub mod projection;
pub mod series;
pub mod storage;
pub mod utils;

// Re-export key types/traits for easier use
pub use artifacts::ArtifactPaths;
pub use cache::{ProjectionCache, ProjectionSource};
pub use config::VisualizerConfig;
pub use dataset::{EmbeddingDataset, EmbeddingRecord};
pub use distance::DistanceMetric;
pub use error::{EmbedCloudError, EmbedCloudResult};
pub use projection::{compute_projection, ProjectionMethod, ProjectionParams};
pub use series::SeriesGroup;
pub use storage::{LocalObjectStore, ObjectStore};
