//! Resolver backed by a Piped API instance.
//!
//! Piped returns audio and video streams as separate arrays without the
//! identifiers this service hands out, so results come back in the split
//! shape: the best audio stream plus every video stream in API order.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use tubegrab_models::display::container_from_mime;
use tubegrab_models::extract_youtube_id;

use crate::error::{ExtractError, ExtractResult};
use crate::raw::{RawResolution, RawStreams, RawVideoDetails, SplitStream};
use crate::resolver::StreamResolver;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStreams {
    #[serde(default)]
    title: String,
    thumbnail_url: Option<String>,
    #[serde(default)]
    duration: i64,
    uploader: Option<String>,
    #[serde(default)]
    views: i64,
    #[serde(default)]
    audio_streams: Vec<PipedStream>,
    #[serde(default)]
    video_streams: Vec<PipedStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipedStream {
    #[serde(default)]
    url: String,
    quality: Option<String>,
    mime_type: Option<String>,
    /// bits per second
    bitrate: Option<i64>,
    content_length: Option<i64>,
    #[serde(default)]
    video_only: bool,
}

#[derive(Debug, Deserialize)]
struct PipedError {
    error: Option<String>,
    message: Option<String>,
}

/// Resolver that queries a Piped instance over HTTP.
pub struct PipedResolver {
    client: reqwest::Client,
    base_url: String,
}

impl PipedResolver {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, url: &str) -> ExtractResult<RawResolution> {
        let video_id =
            extract_youtube_id(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        let endpoint = format!("{}/streams/{}", self.base_url, video_id);
        debug!(endpoint = %endpoint, "Querying Piped");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| ExtractError::unavailable(format!("Piped request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let diagnostic = error_message(&body).unwrap_or_else(|| status.to_string());
            warn!(video_id = %video_id, status = %status, diagnostic = %diagnostic, "Piped resolution failed");
            return Err(ExtractError::from_status(status.as_u16(), diagnostic));
        }

        // Some instances report failures with a 200 and an error body.
        if let Some(diagnostic) = error_message(&body) {
            warn!(video_id = %video_id, diagnostic = %diagnostic, "Piped returned an error body");
            return Err(ExtractError::classify(diagnostic));
        }

        let streams: PipedStreams = serde_json::from_str(&body)?;
        Ok(into_resolution(streams))
    }
}

#[async_trait]
impl StreamResolver for PipedResolver {
    fn id(&self) -> &'static str {
        "piped"
    }

    async fn fetch_info(&self, url: &str) -> ExtractResult<RawVideoDetails> {
        Ok(self.fetch(url).await?.details)
    }

    async fn fetch_streams(&self, url: &str) -> ExtractResult<RawStreams> {
        Ok(self.fetch(url).await?.streams)
    }

    async fn resolve_raw(&self, url: &str) -> ExtractResult<RawResolution> {
        self.fetch(url).await
    }
}

fn error_message(body: &str) -> Option<String> {
    let error: PipedError = serde_json::from_str(body).ok()?;
    match (error.error, error.message) {
        (Some(e), Some(m)) if !m.is_empty() => Some(format!("{}: {}", e, m)),
        (Some(e), _) => Some(e),
        (None, Some(m)) => Some(m),
        (None, None) => None,
    }
}

fn into_resolution(streams: PipedStreams) -> RawResolution {
    let details = RawVideoDetails {
        title: streams.title,
        thumbnails: streams.thumbnail_url.into_iter().collect(),
        length_secs: u64::try_from(streams.duration).unwrap_or(0),
        author: streams.uploader.unwrap_or_default(),
        view_count: u64::try_from(streams.views).unwrap_or(0),
    };

    let audio = streams
        .audio_streams
        .into_iter()
        .filter(|s| !s.url.is_empty())
        .max_by_key(|s| s.bitrate.unwrap_or(0))
        .map(|s| split_stream(s, true));

    let video = streams
        .video_streams
        .into_iter()
        .map(|s| {
            let has_audio = !s.video_only;
            split_stream(s, has_audio)
        })
        .collect();

    RawResolution {
        details,
        streams: RawStreams::Split { audio, video },
    }
}

fn split_stream(stream: PipedStream, has_audio: bool) -> SplitStream {
    SplitStream {
        container: container_from_mime(stream.mime_type.as_deref()),
        url: stream.url,
        quality_label: stream.quality,
        mime_type: stream.mime_type,
        content_length: stream.content_length.and_then(|l| u64::try_from(l).ok()).filter(|l| *l > 0),
        bitrate: stream
            .bitrate
            .and_then(|b| u32::try_from(b / 1000).ok())
            .filter(|b| *b > 0),
        has_audio,
    }
}
