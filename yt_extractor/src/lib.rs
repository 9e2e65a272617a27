//! Search YouTube and pick download links without the API (see documentation)
//!
//! Two pure pieces do the work : [`extract_search_results`] turns the HTML of a
//! results page into [`VideoRecord`]s and [`select_format`] picks the best
//! [`MediaRendition`] of a video. [`YtClient`] does the fetching around them.

mod cipher;
mod client;
mod format_selector;
mod youtube_extractor;
pub mod youtube_info;

pub use client::{ByteStream, ClientConfig, YoutubeApi, YtClient};
pub use format_selector::select_format;
pub use youtube_extractor::{extract_search_results, ErrorExtractor};
pub use youtube_info::*;

/// To search for videos :
/// ```
/// use yt_extractor::search_videos;
/// use yt_extractor::youtube_info::VideoRecord;
///
/// // Async is just here to show it must be in an async block
/// async {
///     let v: Vec<VideoRecord> = search_videos("Diggy diggy hole").await?;
///     # Ok::<(), yt_extractor::ErrorExtractor>(())
/// };
/// ```
/// See [`crate::youtube_info::VideoRecord`]
pub async fn search_videos(search: &str) -> Result<Vec<VideoRecord>, ErrorExtractor> {
    YtClient::new(ClientConfig::default())?
        .search_videos(search)
        .await
}

/// To get the best audio of a video :
/// ```
/// use yt_extractor::{get_best_format, MediaKind, MediaRendition};
///
/// // Async is just here to show it must be in an async block
/// async {
///     let audio: MediaRendition = get_best_format("ytWz0qVvBZ0", MediaKind::AudioOnly).await.unwrap(); // Video link is : https://www.youtube.com/watch?v=ytWz0qVvBZ0
/// };
/// ```
/// See [`crate::youtube_info::MediaRendition`]
pub async fn get_best_format(id: &str, kind: MediaKind) -> Result<MediaRendition, ErrorExtractor> {
    let info = YtClient::new(ClientConfig::default())?
        .get_video_info(id)
        .await?;
    select_format(&info.renditions, kind).cloned()
}
