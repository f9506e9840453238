//! Groups projected points into chart series by object class, keeping a
//! reverse index back into the dataset for click lookups.

use ndarray::ArrayView2;
use serde::Serialize;
use std::collections::HashMap;

use crate::dataset::{EmbeddingDataset, IMAGE_SERIES};
use crate::error::{EmbedCloudError, EmbedCloudResult};

/// Chart color for the whole-image series.
pub const IMAGE_COLOR: &str = "#222222";

/// Fallback colors for classes without a project-meta color, cycled in order.
const FALLBACK_PALETTE: [&str; 10] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231",
    "#911eb4", "#46f0f0", "#f032e6", "#bcf60c", "#008080",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: f32,
    pub y: f32,
}

/// One chart series: all points of one object class.
///
/// `global_idxs[i]` is the dataset row behind `data[i]`.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesGroup {
    pub name: String,
    pub data: Vec<SeriesPoint>,
    pub global_idxs: Vec<usize>,
    pub color: String,
}

/// Builds the chart series from a dataset and its 2D projections.
///
/// `class_colors` maps class names to hex colors (from project metadata);
/// classes without an entry draw from a fixed fallback palette. Series
/// appear in first-seen record order.
pub fn build_series(
    dataset: &EmbeddingDataset,
    projections: ArrayView2<f32>,
    class_colors: &HashMap<String, String>,
) -> EmbedCloudResult<Vec<SeriesGroup>> {
    if projections.nrows() != dataset.len() {
        return Err(EmbedCloudError::LengthMismatch {
            records: dataset.len(),
            rows: projections.nrows(),
        });
    }
    if projections.ncols() != 2 {
        return Err(EmbedCloudError::DimensionMismatch {
            expected: 2,
            actual: projections.ncols(),
        });
    }

    let mut series: Vec<SeriesGroup> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (i, record) in dataset.records().iter().enumerate() {
        let label = record.class_label();
        let slot = *by_name.entry(label.to_string()).or_insert_with(|| {
            series.push(SeriesGroup {
                name: label.to_string(),
                data: Vec::new(),
                global_idxs: Vec::new(),
                color: String::new(),
            });
            series.len() - 1
        });
        // Chart x axis carries the second projection component.
        series[slot].data.push(SeriesPoint {
            x: projections[[i, 1]],
            y: projections[[i, 0]],
        });
        series[slot].global_idxs.push(i);
    }

    let mut fallback = FALLBACK_PALETTE.iter().cycle();
    for group in &mut series {
        group.color = if group.name == IMAGE_SERIES {
            IMAGE_COLOR.to_string()
        } else if let Some(color) = class_colors.get(&group.name) {
            color.clone()
        } else {
            fallback.next().map(|c| c.to_string()).unwrap_or_else(|| IMAGE_COLOR.to_string())
        };
    }

    Ok(series)
}

/// Resolves a clicked chart point back to its dataset row.
pub fn resolve_click(series: &[SeriesGroup], series_name: &str, data_index: usize) -> Option<usize> {
    series
        .iter()
        .find(|group| group.name == series_name)
        .and_then(|group| group.global_idxs.get(data_index).copied())
}

/// Formats an RGB triple as a `#rrggbb` hex color.
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}
