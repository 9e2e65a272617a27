mod config;
mod download;
mod error;
mod search;
#[cfg(test)]
mod test;
mod templates;
mod video;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::templates::index::{Endpoint, IndexTemplate};
use crate::templates::HtmlTemplate;
use axum::extract::State;
use axum::http::{HeaderValue, Method, Uri};
use axum::response::IntoResponse;
use axum::{routing::get, Router, Server};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use yt_extractor::{ClientConfig, VideoRecord, YoutubeApi, YtClient};
use ytdl_rust::{ApiVideo, DownloadLinks, SearchResponse};

pub struct AppState {
    pub api: Arc<dyn YoutubeApi>,
    pub config: ServerConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ytdl_axum=debug,yt_extractor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let client = YtClient::new(ClientConfig {
        timeout: config.request_timeout,
        ..ClientConfig::default()
    })?;
    let addr = config.addr()?;

    let app_state = Arc::new(AppState {
        api: Arc::new(client),
        config,
    });

    tracing::info!("Starting server on http://{addr}");
    tracing::info!(
        "API endpoint: {}/api/search?q=yourquery",
        app_state.config.base_url
    );

    Server::bind(&addr)
        .serve(router(app_state).into_make_service())
        .await?;
    Ok(())
}

pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config);
    Router::new()
        .route("/", get(index))
        .route("/api/search", get(search::search))
        .route("/api/download", get(download::download))
        .route("/api/direct-download", get(download::direct_download))
        .route("/api/video/:video_id", get(video::video_details))
        .route("/download/:video_id", get(download::legacy_download))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }
    let origins = config
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(err) => {
                tracing::warn!("Ignoring CORS origin {o}: {err}");
                None
            }
        })
        .collect::<Vec<_>>();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
}

async fn index(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::info!("Get /");
    let base_url = app_state.config.base_url.clone();

    let example = VideoRecord {
        title: "Example Video".to_string(),
        video_id: "VIDEO_ID".to_string(),
        channel_name: "Example Channel".to_string(),
        channel_id: None,
        thumbnail_url: "https://i.ytimg.com/vi/VIDEO_ID/hqdefault.jpg".to_string(),
        view_count_text: "1M views".to_string(),
        published_text: "2 years ago".to_string(),
        description: "This is an example video description".to_string(),
        duration_text: "3:32".to_string(),
        video_url: VideoRecord::watch_url("VIDEO_ID"),
    };
    let example_response = serde_json::to_string_pretty(&SearchResponse {
        query: "example search".to_string(),
        results: vec![ApiVideo {
            links: DownloadLinks::new(&base_url, &example.video_id),
            video: example,
        }],
    })
    .unwrap_or_default();

    HtmlTemplate(IndexTemplate {
        endpoints: vec![
            Endpoint {
                title: "Search for videos",
                usages: vec!["GET /api/search?q=your+search+query".to_string()],
                description: "Search for YouTube videos based on a query",
            },
            Endpoint {
                title: "Download via URL Redirection",
                usages: ["mp4", "mp3"]
                    .iter()
                    .map(|f| format!("GET /api/download?videoId=VIDEO_ID&format={f}"))
                    .collect(),
                description: "Redirects to the media file on YouTube's servers",
            },
            Endpoint {
                title: "Direct Download (Streaming)",
                usages: ["mp4", "mp3"]
                    .iter()
                    .map(|f| format!("GET /api/direct-download?videoId=VIDEO_ID&format={f}"))
                    .chain(std::iter::once("GET /download/VIDEO_ID".to_string()))
                    .collect(),
                description: "Streams the file with a proper filename",
            },
            Endpoint {
                title: "Video details",
                usages: vec!["GET /api/video/VIDEO_ID".to_string()],
                description: "Title, description, views and channel of a video",
            },
        ],
        base_url,
        example_response,
    })
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        error: "Route not found",
        message: format!("No route for {}", uri.path()),
    }
}
