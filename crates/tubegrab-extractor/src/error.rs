//! Error types for stream resolution.

use thiserror::Error;

/// Result type for extractor operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can occur while resolving a video.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Video no longer available: {0}")]
    Gone(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Format not found: {0}")]
    FormatNotFound(String),

    #[error("Resolver unavailable: {0}")]
    Unavailable(String),

    #[error("{0} not found in PATH")]
    ResolverNotFound(String),

    #[error("Resolution timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Diagnostic fragments reported for private or age/membership gated videos.
const ACCESS_DENIED_MARKERS: &[&str] = &[
    "private video",
    "video is private",
    "sign in to confirm your age",
    "age-restricted",
    "members-only",
    "join this channel",
    "access denied",
    "http error 403",
];

/// Fragments reported for removed or region-blocked videos.
const GONE_MARKERS: &[&str] = &[
    "available in your country",
    "geo restrict",
    "geo-restrict",
    "blocked it in your country",
    "has been removed",
    "no longer available",
    "account associated with this video has been terminated",
    "http error 410",
];

/// Fragments reported when the video does not exist.
const NOT_FOUND_MARKERS: &[&str] = &[
    "video unavailable",
    "does not exist",
    "incomplete youtube id",
    "not found",
    "http error 404",
];

impl ExtractError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a format not found error.
    pub fn format_not_found(message: impl Into<String>) -> Self {
        Self::FormatNotFound(message.into())
    }

    /// Classify a resolver diagnostic into the error taxonomy.
    ///
    /// Access and region checks run before the generic "unavailable" check
    /// because YouTube prefixes most of its messages with "Video unavailable".
    pub fn classify(diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        let lower = diagnostic.to_lowercase();

        if ACCESS_DENIED_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::AccessDenied(diagnostic)
        } else if GONE_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::Gone(diagnostic)
        } else if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::NotFound(diagnostic)
        } else {
            Self::Unavailable(diagnostic)
        }
    }

    /// Classify an HTTP status returned by a resolver API.
    pub fn from_status(status: u16, diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        match status {
            403 => Self::AccessDenied(diagnostic),
            404 => Self::NotFound(diagnostic),
            410 | 451 => Self::Gone(diagnostic),
            _ => match Self::classify(diagnostic) {
                Self::Unavailable(d) => Self::Unavailable(format!("HTTP {}: {}", status, d)),
                other => other,
            },
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::NotFound(_) => "not_found",
            Self::Gone(_) => "gone",
            Self::AccessDenied(_) => "access_denied",
            Self::FormatNotFound(_) => "format_not_found",
            Self::Timeout(_) => "timeout",
            Self::Unavailable(_)
            | Self::ResolverNotFound(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Http(_) => "unavailable",
        }
    }

    /// The diagnostic text without the variant prefix.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::InvalidUrl(d)
            | Self::NotFound(d)
            | Self::Gone(d)
            | Self::AccessDenied(d)
            | Self::FormatNotFound(d)
            | Self::Unavailable(d) => d.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ytdlp_diagnostics() {
        assert!(matches!(
            ExtractError::classify("ERROR: [youtube] abc: Private video. Sign in if you've been granted access"),
            ExtractError::AccessDenied(_)
        ));
        assert!(matches!(
            ExtractError::classify("ERROR: [youtube] abc: Sign in to confirm your age"),
            ExtractError::AccessDenied(_)
        ));
        assert!(matches!(
            ExtractError::classify(
                "ERROR: [youtube] abc: Video unavailable. The uploader has not made this video available in your country"
            ),
            ExtractError::Gone(_)
        ));
        assert!(matches!(
            ExtractError::classify("ERROR: [youtube] abc: Video unavailable. This video has been removed by the uploader"),
            ExtractError::Gone(_)
        ));
        assert!(matches!(
            ExtractError::classify("ERROR: [youtube] abc: Video unavailable"),
            ExtractError::NotFound(_)
        ));
        assert!(matches!(
            ExtractError::classify("ERROR: Unable to download API page: timed out"),
            ExtractError::Unavailable(_)
        ));
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(ExtractError::from_status(403, "x"), ExtractError::AccessDenied(_)));
        assert!(matches!(ExtractError::from_status(404, "x"), ExtractError::NotFound(_)));
        assert!(matches!(ExtractError::from_status(410, "x"), ExtractError::Gone(_)));
        assert!(matches!(
            ExtractError::from_status(500, "This video is private"),
            ExtractError::AccessDenied(_)
        ));
        match ExtractError::from_status(502, "bad gateway") {
            ExtractError::Unavailable(d) => assert_eq!(d, "HTTP 502: bad gateway"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_strips_prefix() {
        let err = ExtractError::Gone("region blocked".to_string());
        assert_eq!(err.diagnostic(), "region blocked");
        assert_eq!(err.to_string(), "Video no longer available: region blocked");
        assert_eq!(err.kind(), "gone");
    }
}
