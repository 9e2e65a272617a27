use serde::{Deserialize, Serialize};
use yt_extractor::{MediaKind, VideoDetails, VideoRecord};

/// Body of `GET /api/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ApiVideo>,
}

/// A search result with its download links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiVideo {
    #[serde(flatten)]
    pub video: VideoRecord,
    #[serde(flatten)]
    pub links: DownloadLinks,
}

/// Body of `GET /api/video/:videoId`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailsResponse {
    #[serde(flatten)]
    pub details: VideoDetails,
    pub video_url: String,
    #[serde(flatten)]
    pub links: DownloadLinks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLinks {
    pub download_mp4: String,
    pub download_mp3: String,
    pub direct_mp4: String,
    pub direct_mp3: String,
}

impl DownloadLinks {
    /// `base_url` is the public address of the server, without trailing slash
    pub fn new(base_url: &str, video_id: &str) -> Self {
        let id = urlencoding::encode(video_id);
        let link = |endpoint: &str, format: DownloadFormat| {
            format!("{base_url}/api/{endpoint}?videoId={id}&format={format}")
        };
        Self {
            download_mp4: link("download", DownloadFormat::Mp4),
            download_mp3: link("download", DownloadFormat::Mp3),
            direct_mp4: link("direct-download", DownloadFormat::Mp4),
            direct_mp3: link("direct-download", DownloadFormat::Mp3),
        }
    }
}

/// JSON body of every error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// The `format` query parameter of the download endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    #[default]
    Mp4,
    Mp3,
}

impl DownloadFormat {
    pub fn kind(self) -> MediaKind {
        match self {
            DownloadFormat::Mp4 => MediaKind::VideoAndAudio,
            DownloadFormat::Mp3 => MediaKind::AudioOnly,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "mp4",
            DownloadFormat::Mp3 => "mp3",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "video/mp4",
            DownloadFormat::Mp3 => "audio/mpeg",
        }
    }
}

impl std::fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for DownloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(DownloadFormat::Mp4),
            "mp3" => Ok(DownloadFormat::Mp3),
            other => Err(format!("Unknown format '{other}', expected mp4 or mp3")),
        }
    }
}
