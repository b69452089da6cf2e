//! The resolver seam.
//!
//! A resolver turns a YouTube URL into raw metadata and stream listings.
//! Signature deciphering and request signing live inside the resolver and
//! are opaque to the rest of the crate.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::raw::{RawResolution, RawStreams, RawVideoDetails};

/// Core trait for all stream resolvers.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Identifier used in logs (e.g. "ytdlp", "piped").
    fn id(&self) -> &'static str;

    /// Whether this resolver accepts the URL.
    fn validate_url(&self, url: &str) -> bool {
        tubegrab_models::is_youtube_url(url)
    }

    /// Fetch video metadata.
    async fn fetch_info(&self, url: &str) -> ExtractResult<RawVideoDetails>;

    /// Fetch stream descriptors.
    async fn fetch_streams(&self, url: &str) -> ExtractResult<RawStreams>;

    /// Fetch metadata and streams together.
    ///
    /// Resolvers that get both from one call should override this.
    async fn resolve_raw(&self, url: &str) -> ExtractResult<RawResolution> {
        let (details, streams) = tokio::try_join!(self.fetch_info(url), self.fetch_streams(url))?;
        Ok(RawResolution { details, streams })
    }

    /// Readiness probe.
    async fn health_check(&self) -> ExtractResult<()> {
        Ok(())
    }
}
