//! Defines the data structures used for API request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use embedcloud_core::series::SeriesPoint;
use embedcloud_core::SeriesGroup;

// --- Request Bodies ---

/// Request body for resolving a clicked chart point.
#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub series_name: String,
    pub data_index: usize,
}

// --- Response Bodies ---

/// One chart series as rendered by the frontend.
#[derive(Debug, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<SeriesPoint>,
}

/// Response body for the scatter chart.
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub title: String,
    pub series: Vec<ChartSeries>,
    /// One hex color per series, index-aligned with `series`.
    pub colors: Vec<String>,
}

impl ChartResponse {
    pub fn from_series(title: String, series: &[SeriesGroup]) -> Self {
        ChartResponse {
            title,
            series: series
                .iter()
                .map(|group| ChartSeries { name: group.name.clone(), data: group.data.clone() })
                .collect(),
            colors: series.iter().map(|group| group.color.clone()).collect(),
        }
    }
}

/// Response body for the image-preview pane.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub image_id: i64,
    pub image_name: String,
    pub preview_url: String,
    pub object_class: Option<String>,
    /// Annotation JSON, filtered to the clicked object when one is known.
    pub annotation: Value,
}
