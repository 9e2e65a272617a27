use crate::cipher::{decipher, CipherFunction};
use crate::youtube_info::*;

use once_cell::sync::Lazy;
use phf::{phf_map, phf_set, Map, Set};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use Step::{Index, Key, Last};

#[derive(Debug, Error)]
pub enum ErrorExtractor {
    /// The page does not have the expected shape (marker or delimiter missing)
    #[error("Error extracting : {0}")]
    Extraction(String),
    /// The embedded data is not JSON or lacks an expected step
    #[error("Error parsing : {0}")]
    Schema(String),
    #[error("No {0} format found")]
    NoFormatFound(MediaKind),
    #[error("Video unavailable : {0}")]
    Unavailable(String),
    #[error("Error deciphering : {0}")]
    Cipher(String),
    #[error("Error with the reqwest : {0}")]
    Reqwest(#[from] reqwest::Error),
}

pub(crate) const SEARCH_DATA_MARKER: &str = "var ytInitialData = ";
pub(crate) const PLAYER_RESPONSE_MARKER: &str = "var ytInitialPlayerResponse = ";
const SCRIPT_END: &str = "</script>";

// See : https://gist.github.com/sidneys/7095afe4da4ae58694d128b1034e01e2
// or : https://tyrrrz.me/blog/reverse-engineering-youtube/
// m4a  : 139 | 140 | 141 | 256 | 258 | 325 | 328
// webm : 171 | 172 | 249 | 250 | 251
static AUDIO_ITAGS: Set<u32> = phf_set! {
    // mp4
    139u32,
    140u32,
    141u32,
    256u32,
    258u32,
    325u32,
    328u32,
    // webm
    171u32,
    172u32,
    249u32,
    250u32,
    251u32,
};

// Audio bitrate (kbps) of the itags that carry audio
static ITAG_AUDIO_BITRATES: Map<u32, u32> = phf_map! {
    17u32 => 24,
    18u32 => 96,
    22u32 => 192,
    36u32 => 38,
    43u32 => 128,
    139u32 => 48,
    140u32 => 128,
    141u32 => 256,
    171u32 => 128,
    172u32 => 192,
    249u32 => 48,
    250u32 => 64,
    251u32 => 160,
    256u32 => 192,
    258u32 => 384,
};

static JS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""jsUrl"\s*:\s*"([^"]+)""#).expect("valid jsUrl regex"));

/// Reads the JSON assigned to `var` in a `<script>` of the webpage.
///
/// The payload runs from the end of the marker to the next `</script>`. Only the
/// leading JSON value is parsed, so a trailing `;` (or any statement after it)
/// is ignored.
pub(crate) fn get_var(webpage: &str, var: &str) -> Result<Value, ErrorExtractor> {
    let start = webpage
        .find(var)
        .ok_or_else(|| ErrorExtractor::Extraction(format!("marker not found : {}", var.trim())))?
        + var.len();
    let end = webpage[start..].find(SCRIPT_END).ok_or_else(|| {
        ErrorExtractor::Extraction(format!("No {SCRIPT_END} found after {}", var.trim()))
    })?;

    let payload = &webpage[start..start + end];
    match serde_json::Deserializer::from_str(payload)
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(v)) => Ok(v),
        Some(Err(why)) => Err(ErrorExtractor::Schema(format!(
            "Error parsing {} to JSON : {why}",
            var.trim()
        ))),
        None => Err(ErrorExtractor::Schema(format!("Empty {}", var.trim()))),
    }
}

/// One named step through YouTube's JSON
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Key(&'static str),
    Index(usize),
    Last,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Step::Key(k) => write!(f, "'{k}'"),
            Step::Index(i) => write!(f, "[{i}]"),
            Step::Last => write!(f, "[last]"),
        }
    }
}

impl Step {
    fn apply<'a>(&self, v: &'a Value) -> Option<&'a Value> {
        match self {
            Step::Key(k) => v.get(k),
            Step::Index(i) => v.get(i),
            Step::Last => v.as_array()?.last(),
        }
    }
}

const SEARCH_ITEMS_PATH: &[Step] = &[
    Key("contents"),
    Key("twoColumnSearchResultsRenderer"),
    Key("primaryContents"),
    Key("sectionListRenderer"),
    Key("contents"),
    Index(0),
    Key("itemSectionRenderer"),
    Key("contents"),
];

/// Follows `path` from `root`, the error names the first missing step
pub(crate) fn descend<'a>(root: &'a Value, path: &[Step]) -> Result<&'a Value, ErrorExtractor> {
    path.iter().try_fold(root, |v, step| {
        step.apply(v)
            .ok_or_else(|| ErrorExtractor::Schema(format!("Missing {step}")))
    })
}

fn lookup<'a>(root: &'a Value, path: &[Step]) -> Option<&'a Value> {
    path.iter().try_fold(root, |v, step| step.apply(v))
}

#[derive(Debug, Clone, Copy)]
enum Read {
    /// A plain string
    Text,
    /// The concatenation of `runs[].text`
    Runs,
}

/// How to project one field of a `videoRenderer`
struct Field {
    path: &'static [Step],
    read: Read,
    /// `None` : the item is dropped when the field is missing
    default: Option<&'static str>,
}

impl Field {
    fn read(&self, renderer: &Value) -> Option<String> {
        let found = lookup(renderer, self.path).and_then(|v| match self.read {
            Read::Text => v.as_str().map(str::to_string),
            Read::Runs => v.get("runs")?.as_array().map(|runs| {
                runs.iter()
                    .filter_map(|r| r.get("text")?.as_str())
                    .collect::<String>()
            }),
        });
        found
            .filter(|s| !s.is_empty())
            .or_else(|| self.default.map(str::to_string))
    }

    fn read_or_default(&self, renderer: &Value) -> String {
        self.read(renderer).unwrap_or_default()
    }
}

const VIDEO_ID: Field = Field {
    path: &[Key("videoId")],
    read: Read::Text,
    default: None,
};
const TITLE: Field = Field {
    path: &[Key("title"), Key("runs"), Index(0), Key("text")],
    read: Read::Text,
    default: None,
};
const CHANNEL_NAME: Field = Field {
    path: &[Key("ownerText"), Key("runs"), Index(0), Key("text")],
    read: Read::Text,
    default: Some("Unknown channel"),
};
const THUMBNAIL: Field = Field {
    path: &[Key("thumbnail"), Key("thumbnails"), Last, Key("url")],
    read: Read::Text,
    default: Some(""),
};
const VIEW_COUNT: Field = Field {
    path: &[Key("viewCountText"), Key("simpleText")],
    read: Read::Text,
    default: Some("No view data"),
};
const PUBLISHED: Field = Field {
    path: &[Key("publishedTimeText"), Key("simpleText")],
    read: Read::Text,
    default: Some("No date data"),
};
const DESCRIPTION: Field = Field {
    path: &[Key("detailedMetadataSnippets"), Index(0), Key("snippetText")],
    read: Read::Runs,
    default: Some("No description available"),
};
const DURATION: Field = Field {
    path: &[Key("lengthText"), Key("simpleText")],
    read: Read::Text,
    default: Some("Live"),
};
const CHANNEL_ID: &[Step] = &[
    Key("ownerText"),
    Key("runs"),
    Index(0),
    Key("navigationEndpoint"),
    Key("browseEndpoint"),
    Key("browseId"),
];

/// Turns the HTML of a search page into its video records, in page order
pub fn extract_search_results(webpage: &str) -> Result<Vec<VideoRecord>, ErrorExtractor> {
    let yt_initial_data = get_var(webpage, SEARCH_DATA_MARKER)?;
    let items = descend(&yt_initial_data, SEARCH_ITEMS_PATH)?
        .as_array()
        .ok_or_else(|| ErrorExtractor::Schema("Search items are not an array".to_string()))?;

    Ok(items.iter().filter_map(get_video_record).collect())
}

fn get_video_record(item: &Value) -> Option<VideoRecord> {
    let renderer = item.get("videoRenderer")?;

    let Some(video_id) = VIDEO_ID.read(renderer) else {
        log::debug!("No videoId in {}", renderer);
        return None;
    };
    let Some(title) = TITLE.read(renderer) else {
        log::debug!("No title for {}", VideoRecord::watch_url(&video_id));
        return None;
    };

    if lookup(renderer, DURATION.path).is_none() {
        log::debug!("Live video : {}", VideoRecord::watch_url(&video_id));
    }

    Some(VideoRecord {
        video_url: VideoRecord::watch_url(&video_id),
        channel_name: CHANNEL_NAME.read_or_default(renderer),
        channel_id: lookup(renderer, CHANNEL_ID)
            .and_then(Value::as_str)
            .map(str::to_string),
        thumbnail_url: THUMBNAIL.read_or_default(renderer),
        view_count_text: VIEW_COUNT.read_or_default(renderer),
        published_text: PUBLISHED.read_or_default(renderer),
        description: DESCRIPTION.read_or_default(renderer),
        duration_text: DURATION.read_or_default(renderer),
        title,
        video_id,
    })
}

/// Url of the player javascript referenced by a watch page
pub(crate) fn get_js_url(webpage: &str) -> Result<String, ErrorExtractor> {
    JS_URL_RE
        .captures(webpage)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace("\\/", "/"))
        .ok_or_else(|| ErrorExtractor::Extraction("No jsUrl found".to_string()))
}

/// True when some format needs the player javascript to get its url
pub(crate) fn needs_cipher(player_response: &Value) -> bool {
    ["formats", "adaptiveFormats"].iter().any(|key| {
        player_response
            .get("streamingData")
            .and_then(|sd| sd.get(key))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().any(|f| f.get("signatureCipher").is_some()))
            .unwrap_or(false)
    })
}

/// Reads a `ytInitialPlayerResponse` into the video details and its renditions.
///
/// Formats with a `signatureCipher` are only kept when `cipher_fun` can sign them.
pub(crate) fn parse_player_response(
    player_response: &Value,
    cipher_fun: Option<&[CipherFunction]>,
) -> Result<VideoInfo, ErrorExtractor> {
    check_playability(player_response)?;

    let vd = descend(player_response, &[Key("videoDetails")])?;
    let text = |key: &'static str| -> String {
        vd.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let details = VideoDetails {
        video_id: text("videoId"),
        title: text("title"),
        description: text("shortDescription"),
        view_count: text("viewCount"),
        length_seconds: text("lengthSeconds"),
        channel_id: text("channelId"),
        channel_name: text("author"),
        thumbnail_url: lookup(vd, &[Key("thumbnail"), Key("thumbnails"), Last, Key("url")])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };

    let renditions = match player_response.get("streamingData") {
        None => {
            log::warn!("No streamingData for {}", details.video_id);
            Vec::new()
        }
        Some(sd) => ["formats", "adaptiveFormats"]
            .iter()
            .filter_map(|key| match sd.get(key).and_then(Value::as_array) {
                None => {
                    log::info!("No {key} in streamingData");
                    None
                }
                Some(arr) => Some(arr),
            })
            .flatten()
            .filter_map(|f| get_rendition(f, cipher_fun))
            .collect(),
    };

    Ok(VideoInfo {
        details,
        renditions,
    })
}

fn check_playability(player_response: &Value) -> Result<(), ErrorExtractor> {
    let status = match player_response.get("playabilityStatus") {
        None => return Ok(()),
        Some(s) => s,
    };
    match status.get("status").and_then(Value::as_str) {
        None | Some("OK") => Ok(()),
        Some(other) => Err(ErrorExtractor::Unavailable(
            status
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or(other)
                .to_string(),
        )),
    }
}

fn get_rendition(v: &Value, cipher_fun: Option<&[CipherFunction]>) -> Option<MediaRendition> {
    let itag = match v.get("itag").and_then(Value::as_u64) {
        None => {
            log::warn!("No itag in value : {}", v);
            return None;
        }
        Some(i) => i as u32,
    };

    let url = match get_url(v, cipher_fun) {
        Ok(url) => url,
        Err(why) => {
            log::warn!("Skipping itag {itag} : {why}");
            return None;
        }
    };

    let mime_type = v
        .get("mimeType")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let (has_video, has_audio) = if mime_type.is_empty() {
        let audio_only = AUDIO_ITAGS.contains(&itag);
        (!audio_only, audio_only || ITAG_AUDIO_BITRATES.contains_key(&itag))
    } else {
        (
            mime_type.starts_with("video/"),
            mime_type.starts_with("audio/")
                || v.get("audioQuality").is_some()
                || v.get("audioChannels").is_some(),
        )
    };

    let audio_bitrate = if !has_audio {
        None
    } else if let Some(b) = ITAG_AUDIO_BITRATES.get(&itag) {
        Some(*b)
    } else if !has_video {
        v.get("bitrate")
            .and_then(Value::as_u64)
            .map(|b| (b / 1000) as u32)
    } else {
        None
    };

    let container = mime_type
        .split(';')
        .next()
        .and_then(|m| m.split('/').nth(1))
        .unwrap_or_default()
        .to_string();

    Some(MediaRendition {
        url,
        itag,
        has_video,
        has_audio,
        quality_label: v
            .get("qualityLabel")
            .and_then(Value::as_str)
            .map(str::to_string),
        audio_bitrate,
        container,
        mime_type,
        content_length: v
            .get("contentLength")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok()),
    })
}

fn get_url(v: &Value, cipher_fun: Option<&[CipherFunction]>) -> Result<String, ErrorExtractor> {
    if let Some(url) = v.get("url").and_then(Value::as_str) {
        return Ok(url.to_string());
    }

    let sc = v
        .get("signatureCipher")
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorExtractor::Cipher("No signatureCipher nor url".to_string()))?;
    let cipher_fun = cipher_fun
        .ok_or_else(|| ErrorExtractor::Cipher("No cipher function".to_string()))?;

    let params = sc
        .split('&')
        .filter_map(|e| e.split_once('='))
        .map(|(k, v)| {
            let decoded = urlencoding::decode(v)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| v.to_string());
            (k, decoded)
        })
        .collect::<HashMap<&str, String>>();

    let url = params
        .get("url")
        .ok_or_else(|| ErrorExtractor::Cipher("No url in signatureCipher".to_string()))?;
    let sig = params
        .get("s")
        .ok_or_else(|| ErrorExtractor::Cipher("No s ('sig') in signatureCipher".to_string()))?;
    let sp = params.get("sp").map(String::as_str).unwrap_or("sig");

    let signed = decipher(sig, cipher_fun);
    Ok(format!("{url}&{sp}={}", urlencoding::encode(&signed)))
}
