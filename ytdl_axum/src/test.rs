#[cfg(test)]
use super::*;
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tower::ServiceExt;
use yt_extractor::{ByteStream, ErrorExtractor, MediaRendition, VideoDetails, VideoInfo};

// Fake youtube

#[derive(Default)]
struct FakeApi {
    videos: Vec<VideoRecord>,
    renditions: Vec<MediaRendition>,
    broken_page: bool,
}

#[async_trait]
impl YoutubeApi for FakeApi {
    async fn search_videos(&self, query: &str) -> Result<Vec<VideoRecord>, ErrorExtractor> {
        if self.broken_page {
            return Err(ErrorExtractor::Extraction(format!(
                "marker not found for {query}"
            )));
        }
        Ok(self.videos.clone())
    }

    async fn get_video_info(&self, video_id: &str) -> Result<VideoInfo, ErrorExtractor> {
        if self.broken_page {
            return Err(ErrorExtractor::Unavailable("Video unavailable".to_string()));
        }
        Ok(VideoInfo {
            details: VideoDetails {
                video_id: video_id.to_string(),
                title: "My video: part 1!".to_string(),
                description: "desc".to_string(),
                view_count: "42".to_string(),
                length_seconds: "60".to_string(),
                channel_id: "UC123".to_string(),
                channel_name: "Channel".to_string(),
                thumbnail_url: "https://i.ytimg.com/vi/x/maxresdefault.jpg".to_string(),
            },
            renditions: self.renditions.clone(),
        })
    }

    async fn stream_rendition(
        &self,
        rendition: &MediaRendition,
    ) -> Result<ByteStream, ErrorExtractor> {
        let chunks: Vec<Result<Bytes, ErrorExtractor>> = vec![
            Ok(Bytes::from(format!("itag={};", rendition.itag))),
            Ok(Bytes::from_static(b"bytes")),
        ];
        Ok(stream::iter(chunks).boxed())
    }
}

fn video(id: &str) -> VideoRecord {
    VideoRecord {
        title: format!("Video {id}"),
        video_id: id.to_string(),
        channel_name: "Channel".to_string(),
        channel_id: Some("UC123".to_string()),
        thumbnail_url: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
        view_count_text: "No view data".to_string(),
        published_text: "No date data".to_string(),
        description: "No description available".to_string(),
        duration_text: "Live".to_string(),
        video_url: VideoRecord::watch_url(id),
    }
}

fn rendition(
    itag: u32,
    quality: Option<&str>,
    bitrate: Option<u32>,
    video: bool,
    audio: bool,
) -> MediaRendition {
    MediaRendition {
        url: format!("https://rr1.googlevideo.com/videoplayback?itag={itag}"),
        itag,
        has_video: video,
        has_audio: audio,
        quality_label: quality.map(str::to_string),
        audio_bitrate: bitrate,
        container: "mp4".to_string(),
        mime_type: "video/mp4".to_string(),
        content_length: None,
    }
}

fn app(api: FakeApi) -> Router {
    router(Arc::new(AppState {
        api: Arc::new(api),
        config: ServerConfig {
            base_url: "http://yt.test".to_string(),
            ..ServerConfig::default()
        },
    }))
}

fn full_api() -> FakeApi {
    FakeApi {
        videos: vec![video("a1"), video("b2")],
        renditions: vec![
            rendition(18, Some("360p"), Some(96), true, true),
            rendition(22, Some("720p"), Some(192), true, true),
            rendition(137, Some("1080p"), None, true, false),
            rendition(140, None, Some(128), false, true),
            rendition(251, None, Some(160), false, true),
        ],
        broken_page: false,
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, headers, body)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// Search

#[tokio::test]
async fn test_search() {
    let (status, json) = get_json(app(full_api()), "/api/search?q=rust%20lang").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "rust lang");
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    assert_eq!(json["results"][0]["videoId"], "a1");
    assert_eq!(
        json["results"][1]["directMp3"],
        "http://yt.test/api/direct-download?videoId=b2&format=mp3"
    );
}

#[tokio::test]
async fn test_search_missing_query() {
    for uri in ["/api/search", "/api/search?q=", "/api/search?q=%20"] {
        let (status, json) = get_json(app(full_api()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("\"q\""));
        assert_eq!(json["message"], "Missing required query parameter q");
    }
}

#[tokio::test]
async fn test_search_no_results() {
    let (status, json) = get_json(app(FakeApi::default()), "/api/search?q=nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "No videos found");
    assert!(json["message"].as_str().unwrap().contains("nothing"));
}

#[tokio::test]
async fn test_search_extraction_error() {
    let api = FakeApi {
        broken_page: true,
        ..FakeApi::default()
    };
    let (status, json) = get_json(app(api), "/api/search?q=x").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to search YouTube");
    assert!(json["message"].as_str().unwrap().contains("marker not found"));
}

// Download

#[tokio::test]
async fn test_download_redirects_to_best_video() {
    let (status, headers, _) = get(app(full_api()), "/api/download?videoId=a1&format=mp4").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        headers[header::LOCATION],
        "https://rr1.googlevideo.com/videoplayback?itag=22"
    );
}

#[tokio::test]
async fn test_download_defaults_to_mp4() {
    let (status, headers, _) = get(app(full_api()), "/api/download?videoId=a1").await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(headers[header::LOCATION].to_str().unwrap().ends_with("itag=22"));
}

#[tokio::test]
async fn test_download_mp3() {
    let (status, headers, _) = get(app(full_api()), "/api/download?videoId=a1&format=mp3").await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(headers[header::LOCATION].to_str().unwrap().ends_with("itag=251"));
}

#[tokio::test]
async fn test_download_missing_id() {
    let (status, json) = get_json(app(full_api()), "/api/download?format=mp3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("videoId"));
}

#[tokio::test]
async fn test_download_unknown_format() {
    let (status, json) = get_json(app(full_api()), "/api/download?videoId=a1&format=flac").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("flac"));
}

#[tokio::test]
async fn test_download_no_format() {
    let api = FakeApi {
        renditions: vec![rendition(140, None, Some(128), false, true)],
        ..FakeApi::default()
    };
    let (status, json) = get_json(app(api), "/api/download?videoId=a1&format=mp4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "No video and audio format found");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_download_resolver_error() {
    let api = FakeApi {
        broken_page: true,
        ..FakeApi::default()
    };
    let (status, json) = get_json(app(api), "/api/download?videoId=a1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to get video URL");
}

#[tokio::test]
async fn test_direct_download_streams() {
    let (status, headers, body) =
        get(app(full_api()), "/api/direct-download?videoId=a1&format=mp3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"My_video_part_1.mp3\""
    );
    assert_eq!(&body[..], b"itag=251;bytes");
}

#[tokio::test]
async fn test_legacy_download() {
    let (status, headers, body) = get(app(full_api()), "/download/a1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(&body[..], b"itag=22;bytes");
}

// Others

#[tokio::test]
async fn test_video_details() {
    let (status, json) = get_json(app(full_api()), "/api/video/a1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["videoId"], "a1");
    assert_eq!(json["channelName"], "Channel");
    assert_eq!(json["videoUrl"], "https://www.youtube.com/watch?v=a1");
    assert_eq!(
        json["downloadMp4"],
        "http://yt.test/api/download?videoId=a1&format=mp4"
    );
}

#[tokio::test]
async fn test_index_page() {
    let (status, _, body) = get(app(full_api()), "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Search for videos"));
    assert!(html.contains("q=your+search+query"));
    assert!(html.contains("yt.test"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, json) = get_json(app(full_api()), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Route not found");
    assert_eq!(json["message"], "No route for /nope");
}

#[tokio::test]
async fn test_every_error_has_a_message() {
    let uris = [
        "/api/search",
        "/api/download?format=mp3",
        "/api/direct-download?videoId=a1&format=ogg",
        "/nope",
    ];
    for uri in uris {
        let (status, json) = get_json(app(FakeApi::default()), uri).await;
        assert!(status.is_client_error(), "{uri} -> {status}");
        assert!(json["error"].is_string(), "{uri} -> {json}");
        assert!(json["message"].is_string(), "{uri} -> {json}");
    }
}
