use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use ytdl_rust::{ApiVideo, DownloadLinks, SearchResponse};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[axum::debug_handler]
pub async fn search(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or(ApiError::MissingParameter("q"))?;
    tracing::debug!("Search videos: {query}");

    let videos = app_state
        .api
        .search_videos(&query)
        .await
        .map_err(ApiError::extractor("Failed to search YouTube"))?;

    if videos.is_empty() {
        return Err(ApiError::NotFound {
            error: "No videos found",
            message: format!("YouTube returned no videos for \"{query}\""),
        });
    }

    let results = videos
        .into_iter()
        .map(|video| ApiVideo {
            links: DownloadLinks::new(&app_state.config.base_url, &video.video_id),
            video,
        })
        .collect();

    Ok(Json(SearchResponse { query, results }))
}
