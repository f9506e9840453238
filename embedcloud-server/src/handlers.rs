//! API request handlers for the chart and click endpoints.

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::{debug, info};

use embedcloud_core::series::resolve_click;

use crate::error::{ServerError, ServerResult};
use crate::models::{ChartResponse, ClickRequest, PreviewResponse};
use crate::state::AppState;

/// Handler for `GET /chart`.
pub async fn get_chart(State(state): State<AppState>) -> ServerResult<Json<ChartResponse>> {
    debug!(series = state.series.len(), "serving chart");
    Ok(Json(ChartResponse::from_series(state.title.clone(), &state.series)))
}

/// Handler for `POST /chart/click`.
///
/// Resolves the clicked point back to its dataset row, then fetches the
/// image metadata and its annotation. When the row is a single object
/// rather than a whole image, the annotation is filtered down to that
/// object.
pub async fn chart_click(
    State(state): State<AppState>,
    Json(payload): Json<ClickRequest>,
) -> ServerResult<Json<PreviewResponse>> {
    let row = resolve_click(&state.series, &payload.series_name, payload.data_index)
        .ok_or_else(|| {
            ServerError::NotFound(format!(
                "no point at index {} in series '{}'",
                payload.data_index, payload.series_name
            ))
        })?;
    let record = &state.records[row];
    info!(
        row,
        image_id = record.image_id,
        object_id = ?record.object_id,
        "resolving chart click"
    );

    let image = state.platform.get_image(record.image_id).await?;
    let mut annotation = state.platform.download_annotation(record.image_id).await?;
    if let Some(object_id) = record.object_id {
        filter_annotation_objects(&mut annotation, object_id);
    }

    Ok(Json(PreviewResponse {
        image_id: image.id,
        image_name: image.name,
        preview_url: image.preview_url,
        object_class: record.object_class.clone(),
        annotation,
    }))
}

/// Keeps only the object with the given id in the annotation's `objects`
/// array. Annotations without that array pass through untouched.
fn filter_annotation_objects(annotation: &mut Value, object_id: i64) {
    if let Some(objects) = annotation.get_mut("objects").and_then(Value::as_array_mut) {
        objects.retain(|obj| obj.get("id").and_then(Value::as_i64) == Some(object_id));
    }
}
