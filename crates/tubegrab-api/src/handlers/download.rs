//! Download proxy handler.
//!
//! Re-resolves the requested stream, fetches it from the media origin and
//! relays the body to the client as it arrives.

use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Referer the media origin expects.
pub const YOUTUBE_REFERER: &str = "https://www.youtube.com/";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub itag: Option<String>,
}

/// Stream a selected format to the client as an attachment.
///
/// GET /api/download?url=...&itag=...
pub async fn download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request("Invalid query").with_details(rejection.body_text())
    })?;

    let url = query
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))?;

    let itag_raw = query
        .itag
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .ok_or_else(|| ApiError::bad_request("itag is required"))?;
    let itag: u32 = itag_raw.parse().map_err(|_| {
        ApiError::bad_request("Invalid itag").with_details(format!("Not a format id: {}", itag_raw))
    })?;

    if !state.extractor.validate_url(&url) {
        return Err(ApiError::bad_request("Invalid YouTube URL")
            .with_details(format!("Not a recognized YouTube URL: {}", url)));
    }

    let start = Instant::now();
    let result = state.extractor.locate(&url, itag).await;
    metrics::record_resolve(
        state.extractor.resolver_id(),
        "download",
        start.elapsed().as_secs_f64(),
        result.as_ref().err().map(|e| e.kind()),
    );
    let located = result.map_err(ApiError::from_download)?;
    let stream = located.stream;

    debug!(itag, origin = %origin_host(&stream.url), "Fetching upstream stream");

    let upstream = state
        .http
        .get(&stream.url)
        .header(header::REFERER, YOUTUBE_REFERER)
        .send()
        .await
        .map_err(|e| {
            ApiError::internal("Failed to fetch video stream")
                .with_details(format!("Upstream request failed: {}", e))
        })?;

    let status = upstream.status();
    if !status.is_success() {
        return Err(ApiError::internal("Failed to fetch video stream")
            .with_details(format!("Upstream responded with {}", status)));
    }

    let content_type = stream
        .mime_type
        .as_deref()
        .and_then(|m| HeaderValue::from_str(m).ok())
        .or_else(|| upstream.headers().get(header::CONTENT_TYPE).cloned())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let content_length = upstream.headers().get(header::CONTENT_LENGTH).cloned();

    let filename = format!(
        "{}.{}",
        sanitize_title(&located.title),
        sanitize_extension(&stream.container)
    );
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| ApiError::internal("Failed to build response").with_details(e.to_string()))?;

    info!(
        itag,
        filename = %filename,
        content_length = ?stream.content_length,
        "Relaying download"
    );
    metrics::record_download_started(&stream.container);

    let relay = RelayStream::new(upstream.bytes_stream().boxed(), itag);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "no-cache");
    if let Some(length) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(relay))
        .map_err(|e| ApiError::internal("Failed to build response").with_details(e.to_string()))
}

/// Reduce a title to ASCII alphanumerics separated by single spaces.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        "video".to_string()
    } else {
        collapsed
    }
}

fn sanitize_extension(container: &str) -> String {
    let ext: String = container
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext.to_lowercase()
    }
}

/// Host part of a media URL; signed query strings stay out of the logs.
fn origin_host(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.split(['/', '?']).next().unwrap_or(rest)
}

/// Forward-only relay of the upstream body.
///
/// Dropping it drops the upstream response and closes the origin
/// connection. A drop before the upstream finished is logged as an abort.
struct RelayStream<E> {
    inner: BoxStream<'static, Result<Bytes, E>>,
    itag: u32,
    bytes: u64,
    started: Instant,
    finished: bool,
}

impl<E> RelayStream<E> {
    fn new(inner: BoxStream<'static, Result<Bytes, E>>, itag: u32) -> Self {
        Self {
            inner,
            itag,
            bytes: 0,
            started: Instant::now(),
            finished: false,
        }
    }
}

impl<E: Display> Stream for RelayStream<E> {
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.finished = true;
                warn!(itag = this.itag, bytes = this.bytes, error = %e, "Upstream failed mid-stream");
                metrics::record_download_aborted("upstream", this.bytes);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                info!(
                    itag = this.itag,
                    bytes = this.bytes,
                    duration_ms = %this.started.elapsed().as_millis(),
                    "Download completed"
                );
                metrics::record_download_completed(this.bytes);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<E> Drop for RelayStream<E> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                itag = self.itag,
                bytes = self.bytes,
                duration_ms = %self.started.elapsed().as_millis(),
                "Client disconnected during download"
            );
            metrics::record_download_aborted("client", self.bytes);
        }
    }
}
