use serde::ser::Error;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// One playable video entry of a search page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub title: String,
    pub video_id: String,
    pub channel_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub thumbnail_url: String,
    pub view_count_text: String,
    pub published_text: String,
    pub description: String,
    pub duration_text: String,
    pub video_url: String,
}

impl VideoRecord {
    pub fn watch_url(video_id: &str) -> String {
        format!("{WATCH_URL}{video_id}")
    }
}

impl PartialEq for VideoRecord {
    fn eq(&self, other: &Self) -> bool {
        self.video_id == other.video_id
    }
}

impl Eq for VideoRecord {}

impl std::fmt::Display for VideoRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(str_fmt) => write!(f, "{str_fmt}"),
            Err(e) => Err(std::fmt::Error::custom(e)),
        }
    }
}

/// What the caller wants to download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    VideoAndAudio,
    AudioOnly,
}

impl MediaKind {
    pub fn accepts(self, rendition: &MediaRendition) -> bool {
        match self {
            MediaKind::VideoAndAudio => rendition.has_video && rendition.has_audio,
            MediaKind::AudioOnly => rendition.has_audio && !rendition.has_video,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::VideoAndAudio => write!(f, "video and audio"),
            MediaKind::AudioOnly => write!(f, "audio only"),
        }
    }
}

/// One encoded stream of a video (see `streamingData` of the player response)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRendition {
    pub url: String,
    pub itag: u32,
    pub has_video: bool,
    pub has_audio: bool,
    pub quality_label: Option<String>,
    /// In kbps
    pub audio_bitrate: Option<u32>,
    pub container: String,
    pub mime_type: String,
    pub content_length: Option<u64>,
}

impl std::fmt::Display for MediaRendition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let quality = match &self.quality_label {
            None => String::new(),
            Some(q) => format!("quality: {q}, "),
        };
        let bitrate = match self.audio_bitrate {
            None => String::new(),
            Some(b) => format!("audio_bitrate: {b}, "),
        };
        write!(
            f,
            "{{ itag: {}, \
            container: {}, \
            video: {}, \
            audio: {}, \
            {}{}url: {} }}",
            self.itag, self.container, self.has_video, self.has_audio, quality, bitrate, self.url
        )
    }
}

/// Metadata of a watch page (`videoDetails` of the player response)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub view_count: String,
    pub length_seconds: String,
    pub channel_id: String,
    pub channel_name: String,
    pub thumbnail_url: String,
}

/// Everything the resolver knows about one video
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub details: VideoDetails,
    pub renditions: Vec<MediaRendition>,
}
