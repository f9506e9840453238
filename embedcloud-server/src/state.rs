use std::sync::Arc;

use embedcloud_core::{EmbeddingRecord, SeriesGroup};

use crate::platform::PlatformApi;

/// Holds the shared state accessible by all request handlers.
///
/// The dataset and series are built once at startup and read-only
/// afterwards, so plain `Arc`s suffice; the click handler is the only
/// re-entrant path and it never mutates.
#[derive(Clone)]
pub struct AppState {
    /// Chart title, `{save_name} {method} projections`.
    pub title: String,
    pub series: Arc<Vec<SeriesGroup>>,
    /// Dataset records, index-aligned with the projection rows.
    pub records: Arc<Vec<EmbeddingRecord>>,
    pub platform: Arc<dyn PlatformApi>,
}

impl AppState {
    pub fn new(
        title: String,
        series: Vec<SeriesGroup>,
        records: Vec<EmbeddingRecord>,
        platform: Arc<dyn PlatformApi>,
    ) -> Self {
        AppState {
            title,
            series: Arc::new(series),
            records: Arc::new(records),
            platform,
        }
    }
}
