use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use yt_extractor::VideoRecord;
use ytdl_rust::{DownloadLinks, VideoDetailsResponse};

#[axum::debug_handler]
pub async fn video_details(
    State(app_state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoDetailsResponse>, ApiError> {
    tracing::debug!("Get /api/video/{video_id}");
    let info = app_state
        .api
        .get_video_info(&video_id)
        .await
        .map_err(ApiError::extractor("Failed to get video details"))?;

    Ok(Json(VideoDetailsResponse {
        video_url: VideoRecord::watch_url(&video_id),
        links: DownloadLinks::new(&app_state.config.base_url, &video_id),
        details: info.details,
    }))
}
