//! YouTube URL parsing and normalization.
//!
//! User-pasted URLs are untrusted. Only YouTube hosts are accepted and the
//! video ID is restricted to the URL-safe base64 alphabet YouTube uses.

use std::borrow::Cow;

use thiserror::Error;
use url::Url;

/// Canonical watch URL prefix every accepted URL is normalized to.
pub const YOUTUBE_WATCH_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Hosts serving full watch pages.
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Hosts serving `youtu.be/<id>` short links.
const SHORT_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path prefixes that carry the video ID as the next segment.
const ID_PATH_PREFIXES: &[&str] = &["embed", "shorts", "v", "live"];

/// Upper bound on accepted video ID length.
const MAX_VIDEO_ID_LEN: usize = 64;

/// Errors that can occur while parsing a YouTube URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YoutubeUrlError {
    #[error("URL is empty")]
    Empty,

    #[error("URL could not be parsed: {0}")]
    Malformed(String),

    #[error("URL is not a valid YouTube URL")]
    InvalidYoutubeUrl,

    #[error("Video ID not found in URL")]
    VideoIdNotFound,

    #[error("Video ID has invalid format")]
    InvalidVideoId,
}

/// Result type for YouTube URL parsing.
pub type YoutubeUrlResult<T> = Result<T, YoutubeUrlError>;

/// Extract the video ID from a YouTube URL.
///
/// Recognized shapes:
/// - `https://www.youtube.com/watch?v=VIDEO_ID` (and any YouTube URL with a `v` query parameter)
/// - `https://youtu.be/VIDEO_ID`
/// - `https://youtube.com/{embed,shorts,v,live}/VIDEO_ID`
///
/// A missing scheme is tolerated (`youtu.be/abc` parses as `https://youtu.be/abc`).
pub fn extract_youtube_id(raw: &str) -> YoutubeUrlResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(YoutubeUrlError::Empty);
    }

    let with_scheme = if raw.contains("://") {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("https://{}", raw))
    };

    let parsed =
        Url::parse(&with_scheme).map_err(|e| YoutubeUrlError::Malformed(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(YoutubeUrlError::InvalidYoutubeUrl);
    }

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or(YoutubeUrlError::InvalidYoutubeUrl)?;

    let candidate = if SHORT_HOSTS.contains(&host.as_str()) {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        query_video_id(&parsed).or_else(|| path_video_id(&parsed))
    } else {
        return Err(YoutubeUrlError::InvalidYoutubeUrl);
    };

    let id = candidate.ok_or(YoutubeUrlError::VideoIdNotFound)?;
    validate_video_id(id)
}

/// Normalize any recognized YouTube URL to the canonical watch URL.
pub fn normalize_youtube_url(raw: &str) -> YoutubeUrlResult<String> {
    extract_youtube_id(raw).map(|id| canonical_watch_url(&id))
}

/// Build the canonical watch URL for a video ID.
pub fn canonical_watch_url(video_id: &str) -> String {
    format!("{}{}", YOUTUBE_WATCH_PREFIX, video_id)
}

/// Check whether a URL is a recognized YouTube video URL.
pub fn is_youtube_url(raw: &str) -> bool {
    extract_youtube_id(raw).is_ok()
}

fn query_video_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
}

fn path_video_id(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    let prefix = segments.next()?;
    if !ID_PATH_PREFIXES.contains(&prefix) {
        return None;
    }
    segments
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

fn validate_video_id(id: String) -> YoutubeUrlResult<String> {
    let id = id.trim().to_string();
    if id.is_empty() || id.len() > MAX_VIDEO_ID_LEN {
        return Err(YoutubeUrlError::InvalidVideoId);
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(YoutubeUrlError::InvalidVideoId);
    }
    Ok(id)
}
