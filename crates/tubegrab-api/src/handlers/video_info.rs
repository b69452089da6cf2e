//! Video info handler.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};
use tubegrab_models::VideoSummary;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VideoInfoRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Resolve a video into its summary and selectable formats.
///
/// POST /api/video-info
pub async fn video_info(
    State(state): State<AppState>,
    payload: Result<Json<VideoInfoRequest>, JsonRejection>,
) -> ApiResult<Json<VideoSummary>> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    })?;

    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))?;

    if !state.extractor.validate_url(&url) {
        warn!(url = %url, "Rejected non-YouTube URL");
        return Err(ApiError::bad_request("Invalid YouTube URL")
            .with_details(format!("Not a recognized YouTube URL: {}", url)));
    }

    let start = Instant::now();
    let result = state.extractor.resolve(&url).await;
    metrics::record_resolve(
        state.extractor.resolver_id(),
        "info",
        start.elapsed().as_secs_f64(),
        result.as_ref().err().map(|e| e.kind()),
    );

    let mut summary = result?;
    let available = summary.formats.len();
    summary.truncate_formats(state.config.max_formats);

    info!(
        title = %summary.title,
        available,
        returned = summary.formats.len(),
        "Video info resolved"
    );

    Ok(Json(summary))
}
