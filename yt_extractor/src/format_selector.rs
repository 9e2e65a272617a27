use crate::youtube_extractor::ErrorExtractor;
use crate::youtube_info::{MediaKind, MediaRendition};

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;

static QUALITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)p").expect("valid quality regex"));

/// Numeric part of a quality label : "1080p60" -> 1080, unknown -> 0
fn quality_value(quality_label: Option<&str>) -> u32 {
    quality_label
        .and_then(|q| QUALITY_RE.captures(q))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Picks the best rendition of `kind`.
///
/// Audio is ranked by bitrate, video by the height in its quality label. Equal
/// ranks keep the input order. No other kind is ever substituted : when nothing
/// matches the caller gets [`ErrorExtractor::NoFormatFound`] and may ask again
/// with another kind.
pub fn select_format(
    renditions: &[MediaRendition],
    kind: MediaKind,
) -> Result<&MediaRendition, ErrorExtractor> {
    let mut candidates = renditions
        .iter()
        .filter(|r| !r.url.is_empty() && kind.accepts(r))
        .collect::<Vec<_>>();

    match kind {
        // `None` is lower than any bitrate so it ends up last
        MediaKind::AudioOnly => candidates.sort_by_key(|r| Reverse(r.audio_bitrate)),
        MediaKind::VideoAndAudio => {
            candidates.sort_by_key(|r| Reverse(quality_value(r.quality_label.as_deref())))
        }
    }

    candidates
        .into_iter()
        .next()
        .ok_or(ErrorExtractor::NoFormatFound(kind))
}
