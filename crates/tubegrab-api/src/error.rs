//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use tubegrab_extractor::ExtractError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error: a user-facing message plus an optional diagnostic.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        details: Option<String>,
    },

    #[error("Not found: {message}")]
    NotFound {
        message: String,
        details: Option<String>,
    },

    #[error("Gone: {message}")]
    Gone {
        message: String,
        details: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest {
            message: msg.into(),
            details: None,
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden {
            message: msg.into(),
            details: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
            details: None,
        }
    }

    pub fn gone(msg: impl Into<String>) -> Self {
        Self::Gone {
            message: msg.into(),
            details: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            details: None,
        }
    }

    /// Attach diagnostic text shown separately from the message.
    pub fn with_details(mut self, detail: impl Into<String>) -> Self {
        match &mut self {
            Self::BadRequest { details, .. }
            | Self::Forbidden { details, .. }
            | Self::NotFound { details, .. }
            | Self::Gone { details, .. }
            | Self::Internal { details, .. } => *details = Some(detail.into()),
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Gone { .. } => StatusCode::GONE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal diagnostics stay server-side when `ENVIRONMENT=production`.
    fn withholds_details(&self, environment: Option<&str>) -> bool {
        matches!(self, Self::Internal { .. })
            && environment.is_some_and(|env| env.trim().eq_ignore_ascii_case("production"))
    }

    fn parts(&self) -> (&str, Option<&str>) {
        match self {
            Self::BadRequest { message, details }
            | Self::Forbidden { message, details }
            | Self::NotFound { message, details }
            | Self::Gone { message, details }
            | Self::Internal { message, details } => (message, details.as_deref()),
        }
    }

    /// Map a resolution failure on the download path.
    ///
    /// The download route only distinguishes 400, 404 and 500.
    pub fn from_download(err: ExtractError) -> Self {
        let details = err.diagnostic();
        match err {
            ExtractError::InvalidUrl(_) => Self::bad_request("Invalid YouTube URL"),
            ExtractError::NotFound(_) => Self::not_found("Video not found"),
            ExtractError::FormatNotFound(_) => Self::not_found("Format not found"),
            _ => Self::internal("Download failed. Please try again later."),
        }
        .with_details(details)
    }
}

/// Resolution failures on the info path.
impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        let details = err.diagnostic();
        match err {
            ExtractError::InvalidUrl(_) => Self::bad_request("Invalid or missing YouTube URL"),
            ExtractError::NotFound(_) => {
                Self::not_found("Video not found. Please check the URL and try again.")
            }
            ExtractError::FormatNotFound(_) => Self::not_found("Format not found"),
            ExtractError::Gone(_) => Self::gone(
                "Video is not available or region-restricted. Please try another video or check if the URL is correct.",
            ),
            ExtractError::AccessDenied(_) => {
                Self::forbidden("Access denied. This video might be private or restricted.")
            }
            _ => Self::internal("Failed to fetch video information. Please try again later."),
        }
        .with_details(details)
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, details) = self.parts();

        if status.is_server_error() {
            error!(status = %status, error = %message, details = ?details, "Request failed");
        } else {
            warn!(status = %status, error = %message, details = ?details, "Request rejected");
        }

        // Don't expose internal error details in production
        let environment = std::env::var("ENVIRONMENT").ok();
        let details = details.filter(|_| !self.withholds_details(environment.as_deref()));

        let body = ErrorResponse {
            error: message,
            details,
        };

        (status, Json(body)).into_response()
    }
}
