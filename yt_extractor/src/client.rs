use crate::cipher::get_cipher_fun;
use crate::youtube_extractor::*;
use crate::youtube_info::*;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;

pub type ByteStream = BoxStream<'static, Result<Bytes, ErrorExtractor>>;

/// Everything the HTTP layer needs from YouTube
#[async_trait]
pub trait YoutubeApi: Send + Sync {
    async fn search_videos(&self, query: &str) -> Result<Vec<VideoRecord>, ErrorExtractor>;

    async fn get_video_info(&self, video_id: &str) -> Result<VideoInfo, ErrorExtractor>;

    /// Bytes of a rendition, as they arrive
    async fn stream_rendition(
        &self,
        rendition: &MediaRendition,
    ) -> Result<ByteStream, ErrorExtractor>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub accept_language: String,
    /// Connect timeout, and total timeout of page fetches. Media streams have no total limit
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Scrapes youtube.com with a browser-like client
#[derive(Debug, Clone)]
pub struct YtClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl YtClient {
    pub fn new(config: ClientConfig) -> Result<Self, ErrorExtractor> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        if let Ok(lang) = HeaderValue::from_str(&config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    async fn get_webpage(&self, url: &str) -> Result<String, ErrorExtractor> {
        log::debug!("GET {url}");
        Ok(self
            .http
            .get(url)
            .timeout(self.config.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    /// HTML of the results page of `query`
    pub async fn search_page(&self, query: &str) -> Result<String, ErrorExtractor> {
        let url = format!(
            "{}/results?search_query={}",
            self.config.base_url,
            urlencoding::encode(query)
        );
        self.get_webpage(&url).await
    }

    /// HTML of the watch page of `video_id`
    pub async fn watch_page(&self, video_id: &str) -> Result<String, ErrorExtractor> {
        let url = format!(
            "{}/watch?v={}&bpctr=9999999999&has_verified=1",
            self.config.base_url,
            urlencoding::encode(video_id)
        );
        self.get_webpage(&url).await
    }

    async fn player_js(&self, watch_page: &str) -> Result<String, ErrorExtractor> {
        let js_url = get_js_url(watch_page)?;
        let js_url = if js_url.starts_with('/') {
            format!("{}{js_url}", self.config.base_url)
        } else {
            js_url
        };
        self.get_webpage(&js_url).await
    }
}

#[async_trait]
impl YoutubeApi for YtClient {
    async fn search_videos(&self, query: &str) -> Result<Vec<VideoRecord>, ErrorExtractor> {
        let webpage = self.search_page(query).await?;
        extract_search_results(&webpage)
    }

    async fn get_video_info(&self, video_id: &str) -> Result<VideoInfo, ErrorExtractor> {
        let webpage = self.watch_page(video_id).await?;
        let player_response = get_var(&webpage, PLAYER_RESPONSE_MARKER)?;

        let cipher_fun = if needs_cipher(&player_response) {
            // See also : https://killerplayer.com/decode-cipher-signature-youtube/
            match self.player_js(&webpage).await {
                Ok(js_code) => match get_cipher_fun(&js_code) {
                    Ok(fun) => Some(fun),
                    Err(why) => {
                        log::warn!("{why}");
                        None
                    }
                },
                Err(why) => {
                    log::warn!("Cannot get the player javascript of {video_id} : {why}");
                    None
                }
            }
        } else {
            None
        };

        parse_player_response(&player_response, cipher_fun.as_deref())
    }

    async fn stream_rendition(
        &self,
        rendition: &MediaRendition,
    ) -> Result<ByteStream, ErrorExtractor> {
        let response = self
            .http
            .get(&rendition.url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes_stream().map_err(ErrorExtractor::from).boxed())
    }
}
