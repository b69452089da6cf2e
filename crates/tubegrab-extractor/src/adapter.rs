//! Extractor adapter.
//!
//! Wraps one [`StreamResolver`] and turns its raw output into a
//! [`VideoSummary`]. Endpoint code talks only to this type and never sees
//! which resolver shape produced the formats.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use tubegrab_models::{
    format_duration, format_view_count, normalize_youtube_url, order_video_first, VideoSummary,
};

use crate::error::{ExtractError, ExtractResult};
use crate::raw::{RawResolution, RawVideoDetails};
use crate::resolver::StreamResolver;
use crate::selector::{describe, select, SelectedStream};

/// A stream located for download, with the title needed for the filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedStream {
    pub title: String,
    pub stream: SelectedStream,
}

/// Stateless front for a resolver; cheap to clone.
#[derive(Clone)]
pub struct ExtractorAdapter {
    resolver: Arc<dyn StreamResolver>,
    timeout: Duration,
}

impl ExtractorAdapter {
    pub fn new(resolver: Arc<dyn StreamResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    /// Identifier of the wrapped resolver.
    pub fn resolver_id(&self) -> &'static str {
        self.resolver.id()
    }

    /// Whether the URL is a recognized YouTube URL.
    pub fn validate_url(&self, url: &str) -> bool {
        self.resolver.validate_url(url)
    }

    /// Resolve a video into a summary with formats ordered video-first.
    pub async fn resolve(&self, url: &str) -> ExtractResult<VideoSummary> {
        let resolution = self.resolve_raw(url).await?;

        let mut formats = describe(&resolution.streams);
        order_video_first(&mut formats);

        info!(
            resolver = self.resolver.id(),
            shape = resolution.streams.shape(),
            formats = formats.len(),
            "Resolved video"
        );

        let mut summary = summarize(resolution.details);
        summary.formats = formats;
        Ok(summary)
    }

    /// Resolve afresh and locate the stream an itag refers to.
    pub async fn locate(&self, url: &str, itag: u32) -> ExtractResult<LocatedStream> {
        let resolution = self.resolve_raw(url).await?;
        let stream = select(&resolution.streams, itag)?;

        debug!(
            resolver = self.resolver.id(),
            itag,
            available = resolution.streams.len(),
            "Located stream"
        );

        Ok(LocatedStream {
            title: resolution.details.title,
            stream,
        })
    }

    /// Readiness of the wrapped resolver.
    pub async fn health_check(&self) -> ExtractResult<()> {
        tokio::time::timeout(self.timeout, self.resolver.health_check())
            .await
            .map_err(|_| ExtractError::Timeout(self.timeout.as_secs()))?
    }

    async fn resolve_raw(&self, url: &str) -> ExtractResult<RawResolution> {
        let canonical =
            normalize_youtube_url(url).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        if !self.resolver.validate_url(&canonical) {
            return Err(ExtractError::InvalidUrl(format!(
                "{} rejected by {} resolver",
                canonical,
                self.resolver.id()
            )));
        }

        tokio::time::timeout(self.timeout, self.resolver.resolve_raw(&canonical))
            .await
            .map_err(|_| ExtractError::Timeout(self.timeout.as_secs()))?
    }
}

fn summarize(details: RawVideoDetails) -> VideoSummary {
    VideoSummary {
        thumbnail: details.thumbnails.last().cloned().unwrap_or_default(),
        duration: format_duration(details.length_secs),
        view_count: format_view_count(details.view_count),
        title: details.title,
        author: details.author,
        formats: Vec::new(),
    }
}
