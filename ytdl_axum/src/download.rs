use crate::error::ApiError;
use crate::AppState;
use axum::body::StreamBody;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use yt_extractor::{select_format, MediaRendition, VideoInfo};
use ytdl_rust::DownloadFormat;

static NOT_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("valid filename regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid spaces regex"));

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub format: Option<String>,
}

impl DownloadQuery {
    fn parse(self) -> Result<(String, DownloadFormat), ApiError> {
        let video_id = self
            .video_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ApiError::MissingParameter("videoId"))?;
        let format = match self.format {
            None => DownloadFormat::default(),
            Some(f) => f.parse().map_err(ApiError::InvalidParameter)?,
        };
        Ok((video_id, format))
    }
}

/// Keeps letters, digits and underscores, spaces become `_`
pub fn sanitize_filename(title: &str) -> String {
    let kept = NOT_WORD_RE.replace_all(title, "");
    let name = SPACES_RE.replace_all(kept.trim(), "_");
    if name.is_empty() {
        "video".to_string()
    } else {
        name.into_owned()
    }
}

async fn best_rendition(
    app_state: &AppState,
    video_id: &str,
    format: DownloadFormat,
    context: &'static str,
) -> Result<(VideoInfo, MediaRendition), ApiError> {
    let info = app_state
        .api
        .get_video_info(video_id)
        .await
        .map_err(ApiError::extractor(context))?;
    let rendition = select_format(&info.renditions, format.kind())
        .map_err(ApiError::extractor(context))?
        .clone();
    Ok((info, rendition))
}

/// Redirects to the url of the best rendition
#[axum::debug_handler]
pub async fn download(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let (video_id, format) = query.parse()?;
    let (_, rendition) =
        best_rendition(&app_state, &video_id, format, "Failed to get video URL").await?;

    tracing::info!(
        "Redirecting to: {}...",
        rendition.url.chars().take(100).collect::<String>()
    );
    Ok((StatusCode::FOUND, [(header::LOCATION, rendition.url)]).into_response())
}

/// Streams the best rendition as an attachment
#[axum::debug_handler]
pub async fn direct_download(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let (video_id, format) = query.parse()?;
    stream_media(&app_state, &video_id, format).await
}

/// `/download/:videoId`, always mp4
#[axum::debug_handler]
pub async fn legacy_download(
    State(app_state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Response, ApiError> {
    stream_media(&app_state, &video_id, DownloadFormat::Mp4).await
}

async fn stream_media(
    app_state: &AppState,
    video_id: &str,
    format: DownloadFormat,
) -> Result<Response, ApiError> {
    let context = "Failed to stream media";
    let (info, rendition) = best_rendition(app_state, video_id, format, context).await?;
    let filename = format!(
        "{}.{}",
        sanitize_filename(&info.details.title),
        format.extension()
    );
    tracing::debug!("Streaming {rendition} as {filename}");

    let stream = app_state
        .api
        .stream_rendition(&rendition)
        .await
        .map_err(ApiError::extractor(context))?;

    let mut response = (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        StreamBody::new(stream),
    )
        .into_response();
    if let Some(len) = rendition.content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("A video: with punctuation!"), "A_video_with_punctuation");
        assert_eq!(sanitize_filename("  Rick   Astley - Never  "), "Rick_Astley_Never");
        assert_eq!(sanitize_filename("日本語"), "video");
        assert_eq!(sanitize_filename("\"quoted\"/path"), "quotedpath");
    }
}
