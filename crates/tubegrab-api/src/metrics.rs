//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "tubegrab_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "tubegrab_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "tubegrab_http_requests_in_flight";

    // Resolver metrics
    pub const RESOLVE_DURATION_SECONDS: &str = "tubegrab_resolve_duration_seconds";
    pub const RESOLVE_FAILURES_TOTAL: &str = "tubegrab_resolve_failures_total";

    // Download relay metrics
    pub const DOWNLOADS_STARTED_TOTAL: &str = "tubegrab_downloads_started_total";
    pub const DOWNLOADS_COMPLETED_TOTAL: &str = "tubegrab_downloads_completed_total";
    pub const DOWNLOADS_ABORTED_TOTAL: &str = "tubegrab_downloads_aborted_total";
    pub const DOWNLOAD_BYTES_TOTAL: &str = "tubegrab_download_bytes_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one resolver call; `failure` is the error kind when it failed.
pub fn record_resolve(
    resolver: &'static str,
    operation: &'static str,
    duration_secs: f64,
    failure: Option<&'static str>,
) {
    let labels = [("resolver", resolver), ("operation", operation)];
    histogram!(names::RESOLVE_DURATION_SECONDS, &labels).record(duration_secs);

    if let Some(kind) = failure {
        let labels = [("resolver", resolver), ("operation", operation), ("kind", kind)];
        counter!(names::RESOLVE_FAILURES_TOTAL, &labels).increment(1);
    }
}

/// Record a download whose upstream response has been accepted.
pub fn record_download_started(container: &str) {
    let labels = [("container", container.to_string())];
    counter!(names::DOWNLOADS_STARTED_TOTAL, &labels).increment(1);
}

/// Record a relay that reached the end of the upstream body.
pub fn record_download_completed(bytes: u64) {
    counter!(names::DOWNLOADS_COMPLETED_TOTAL).increment(1);
    counter!(names::DOWNLOAD_BYTES_TOTAL).increment(bytes);
}

/// Record a relay cut short by the client or the upstream.
pub fn record_download_aborted(reason: &'static str, bytes: u64) {
    counter!(names::DOWNLOADS_ABORTED_TOTAL, "reason" => reason).increment(1);
    counter!(names::DOWNLOAD_BYTES_TOTAL).increment(bytes);
}

/// Collapse paths to a bounded label set.
fn route_label(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/api/video-info" => "/api/video-info",
        "/api/download" => "/api/download",
        "/health" | "/healthz" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
