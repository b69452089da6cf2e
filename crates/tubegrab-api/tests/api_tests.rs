//! API integration tests.
//!
//! The router runs against a fake resolver; wiremock stands in for the media
//! origin.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use futures_util::StreamExt;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tubegrab_api::{create_router, ApiConfig, AppState};
use tubegrab_extractor::{
    ExtractError, ExtractResult, NativeFormat, RawResolution, RawStreams, RawVideoDetails,
    SplitStream, StreamResolver,
};

const TEST_USER_AGENT: &str = "tubegrab-test/1.0 (X11; Linux x86_64)";

type Outcome = Box<dyn Fn() -> ExtractResult<RawResolution> + Send + Sync>;

/// Resolver returning a fixed outcome and counting calls.
struct FakeResolver {
    outcome: Outcome,
    calls: AtomicUsize,
}

impl FakeResolver {
    fn ok(resolution: RawResolution) -> Arc<Self> {
        Arc::new(Self {
            outcome: Box::new(move || Ok(resolution.clone())),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(make: fn() -> ExtractError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Box::new(move || Err(make())),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamResolver for FakeResolver {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn fetch_info(&self, url: &str) -> ExtractResult<RawVideoDetails> {
        Ok(self.resolve_raw(url).await?.details)
    }

    async fn fetch_streams(&self, url: &str) -> ExtractResult<RawStreams> {
        Ok(self.resolve_raw(url).await?.streams)
    }

    async fn resolve_raw(&self, _url: &str) -> ExtractResult<RawResolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn details(title: &str) -> RawVideoDetails {
    RawVideoDetails {
        title: title.to_string(),
        thumbnails: vec![
            "https://i.ytimg.com/vi/abc123/default.jpg".to_string(),
            "https://i.ytimg.com/vi/abc123/maxresdefault.jpg".to_string(),
        ],
        length_secs: 212,
        author: "Test Channel".to_string(),
        view_count: 1_234_567,
    }
}

/// Three video streams and one audio stream served by `origin`.
fn split_resolution(origin: &str) -> RawResolution {
    let video = |i: usize, label: &str| SplitStream {
        url: format!("{}/video/{}", origin, i),
        quality_label: Some(label.to_string()),
        mime_type: Some("video/mp4".to_string()),
        content_length: Some(5_242_880),
        bitrate: None,
        has_audio: false,
        container: None,
    };

    RawResolution {
        details: details("Test Video: Special/Chars! (2024)"),
        streams: RawStreams::Split {
            audio: Some(SplitStream {
                url: format!("{}/audio", origin),
                quality_label: None,
                mime_type: Some("audio/webm".to_string()),
                content_length: None,
                bitrate: Some(160),
                has_audio: true,
                container: Some("webm".to_string()),
            }),
            video: vec![video(0, "1080p"), video(1, "720p"), video(2, "360p")],
        },
    }
}

/// Twelve native formats alternating audio-only and muxed.
fn native_resolution() -> RawResolution {
    native_resolution_at("https://media.example")
}

/// Native formats (itags 100..112) served by `origin`.
fn native_resolution_at(origin: &str) -> RawResolution {
    let formats = (0..12u32)
        .map(|i| {
            let has_video = i % 2 == 1;
            NativeFormat {
                itag: 100 + i,
                url: format!("{}/{}", origin, 100 + i),
                quality_label: None,
                height: has_video.then_some(360),
                audio_bitrate: Some(128),
                mime_type: Some(if has_video { "video/mp4" } else { "audio/mp4" }.to_string()),
                content_length: None,
                has_audio: true,
                has_video,
                container: "mp4".to_string(),
            }
        })
        .collect();

    RawResolution {
        details: details("Native Video"),
        streams: RawStreams::Native(formats),
    }
}

fn test_config() -> ApiConfig {
    ApiConfig {
        upstream_user_agent: TEST_USER_AGENT.to_string(),
        ..ApiConfig::default()
    }
}

fn router(resolver: Arc<FakeResolver>) -> Router {
    let state = tokio_test::assert_ok!(AppState::with_resolver(test_config(), resolver));
    create_router(state, None)
}

fn info_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/video-info")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn download_request(url: &str, itag: &str) -> Request<Body> {
    let uri = format!(
        "/api/download?url={}&itag={}",
        url::form_urlencoded::byte_serialize(url.as_bytes()).collect::<String>(),
        itag
    );
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = router(FakeResolver::ok(native_resolution()));

    for uri in ["/health", "/healthz", "/ready"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert!(response.headers().contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn test_index_serves_ui() {
    let app = router(FakeResolver::ok(native_resolution()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("/api/video-info"));
}

#[tokio::test]
async fn test_video_info_rejects_invalid_url_without_resolving() {
    let resolver = FakeResolver::ok(native_resolution());
    let app = router(resolver.clone());

    for body in [
        r#"{"url": "https://vimeo.com/12345"}"#,
        r#"{"url": ""}"#,
        r#"{}"#,
        r#"not json"#,
    ] {
        let response = app.clone().oneshot(info_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_video_info_region_restricted_is_gone() {
    let resolver = FakeResolver::failing(|| {
        ExtractError::Gone("The uploader has not made this video available in your country".into())
    });
    let app = router(resolver.clone());

    let response = app
        .oneshot(info_request(r#"{"url": "https://youtu.be/abc123"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GONE);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Video is not available or region-restricted. Please try another video or check if the URL is correct."
    );
    assert_eq!(
        json["details"],
        "The uploader has not made this video available in your country"
    );
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_video_info_maps_resolver_failures() {
    let cases: [(fn() -> ExtractError, StatusCode); 3] = [
        (|| ExtractError::AccessDenied("Private video".into()), StatusCode::FORBIDDEN),
        (|| ExtractError::NotFound("Video unavailable".into()), StatusCode::NOT_FOUND),
        (|| ExtractError::Timeout(30), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (make, expected) in cases {
        let app = router(FakeResolver::failing(make));
        let response = app
            .oneshot(info_request(r#"{"url": "https://www.youtube.com/watch?v=abc123"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
async fn test_video_info_sorts_and_caps_formats() {
    let app = router(FakeResolver::ok(native_resolution()));

    let response = app
        .oneshot(info_request(r#"{"url": "https://www.youtube.com/watch?v=abc123"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["title"], "Native Video");
    assert_eq!(json["duration"], "03:32");
    assert_eq!(json["viewCount"], "1,234,567");
    assert_eq!(json["thumbnail"], "https://i.ytimg.com/vi/abc123/maxresdefault.jpg");

    let formats = json["formats"].as_array().unwrap();
    assert_eq!(formats.len(), 10);

    // All six muxed formats first, in resolver order, then audio-only.
    let itags: Vec<u64> = formats.iter().map(|f| f["itag"].as_u64().unwrap()).collect();
    assert_eq!(itags, vec![101, 103, 105, 107, 109, 111, 100, 102, 104, 106]);
    assert!(formats[..6].iter().all(|f| f["hasVideo"] == true));
    assert!(formats[6..].iter().all(|f| f["hasVideo"] == false));
    assert_eq!(formats[0]["url"], "https://media.example/101");
}

#[tokio::test]
async fn test_video_info_split_shape_synthesizes_itags() {
    let app = router(FakeResolver::ok(split_resolution("https://media.example")));

    let response = app
        .oneshot(info_request(r#"{"url": "youtu.be/abc123"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let formats = json["formats"].as_array().unwrap();
    let itags: Vec<u64> = formats.iter().map(|f| f["itag"].as_u64().unwrap()).collect();
    assert_eq!(itags, vec![1000, 1001, 1002, 2000]);

    assert_eq!(formats[1]["quality"], "720p");
    assert_eq!(formats[1]["size"], "5 MB");
    assert_eq!(formats[3]["quality"], "160kbps");
    assert_eq!(formats[3]["size"], "Unknown");
    assert!(formats.iter().all(|f| f.get("url").is_none()));
}

#[tokio::test]
async fn test_download_relays_selected_video_stream() {
    let origin = MockServer::start().await;
    let payload = b"\x00\x00\x00\x18ftypmp42 video bytes".to_vec();
    Mock::given(method("GET"))
        .and(path("/video/1"))
        .and(header_eq("referer", "https://www.youtube.com/"))
        .and(header_eq("user-agent", TEST_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&origin)
        .await;

    let resolver = FakeResolver::ok(split_resolution(&origin.uri()));
    let app = router(resolver.clone());

    let response = app
        .oneshot(download_request("https://youtu.be/abc123", "1001"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Test Video Special Chars 2024.mp4\""
    );
    assert_eq!(
        headers[header::CONTENT_LENGTH],
        payload.len().to_string().as_str()
    );

    assert_eq!(body_bytes(response).await, payload);
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_download_relays_audio_stream() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"opus".to_vec()))
        .expect(1)
        .mount(&origin)
        .await;

    let app = router(FakeResolver::ok(split_resolution(&origin.uri())));

    let response = app
        .oneshot(download_request("https://www.youtube.com/watch?v=abc123", "2000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/webm");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.ends_with(".webm\""), "{}", disposition);
    assert_eq!(body_bytes(response).await, b"opus");
}

#[tokio::test]
async fn test_download_unknown_itag_is_not_found() {
    let origin = MockServer::start().await;
    let app = router(FakeResolver::ok(split_resolution(&origin.uri())));

    let response = app
        .oneshot(download_request("https://www.youtube.com/watch?v=abc123", "1005"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
    assert!(origin.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_download_validates_parameters() {
    let resolver = FakeResolver::ok(native_resolution());
    let app = router(resolver.clone());

    let cases = [
        "/api/download?url=https%3A%2F%2Fyoutu.be%2Fabc123",
        "/api/download?url=https%3A%2F%2Fyoutu.be%2Fabc123&itag=abc",
        "/api/download?itag=18",
        "/api/download?url=https%3A%2F%2Fexample.com%2Fwatch&itag=18",
    ];
    for uri in cases {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }

    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_download_upstream_failure_is_internal_error() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/0"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&origin)
        .await;

    let app = router(FakeResolver::ok(split_resolution(&origin.uri())));

    let response = app
        .oneshot(download_request("https://www.youtube.com/watch?v=abc123", "1000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to fetch video stream");
}

#[tokio::test]
async fn test_download_malformed_query_is_json_bad_request() {
    let resolver = FakeResolver::ok(native_resolution());
    let app = router(resolver.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/download?url=https%3A%2F%2Fyoutu.be%2Fabc123&itag=18&itag=22")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid query");
    assert!(json["details"].as_str().unwrap().contains("itag"));
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_download_relays_native_itag() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/105"))
        .and(header_eq("referer", "https://www.youtube.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"muxed 360p".to_vec()))
        .expect(1)
        .mount(&origin)
        .await;

    let app = router(FakeResolver::ok(native_resolution_at(&origin.uri())));

    let response = app
        .oneshot(download_request("https://www.youtube.com/watch?v=abc123", "105"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Native Video.mp4\""
    );
    assert_eq!(body_bytes(response).await, b"muxed 360p");
}

#[tokio::test]
async fn test_download_missing_native_itag_is_not_found() {
    let origin = MockServer::start().await;
    let app = router(FakeResolver::ok(native_resolution_at(&origin.uri())));

    for itag in ["22", "1001", "2000"] {
        let response = app
            .clone()
            .oneshot(download_request("https://www.youtube.com/watch?v=abc123", itag))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", itag);
        assert!(body_json(response).await["error"].is_string());
    }

    assert!(origin.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_download_missing_video_is_not_found() {
    let app = router(FakeResolver::failing(|| {
        ExtractError::NotFound("Video unavailable".into())
    }));

    let response = app
        .oneshot(download_request("https://www.youtube.com/watch?v=abc123", "18"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Video not found");
    assert_eq!(json["details"], "Video unavailable");
}

#[tokio::test]
async fn test_download_client_disconnect_after_headers() {
    const TOTAL: usize = 8 * 1024 * 1024;

    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; TOTAL]))
        .expect(1)
        .mount(&origin)
        .await;

    let app = router(FakeResolver::ok(split_resolution(&origin.uri())));

    let response = app
        .oneshot(download_request("https://www.youtube.com/watch?v=abc123", "1002"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        TOTAL.to_string().as_str()
    );

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    assert!(!first.is_empty() && first.len() < TOTAL);

    // Dropping the body drops the relay and the upstream response with it.
    drop(body);

    assert_eq!(origin.received_requests().await.unwrap_or_default().len(), 1);
}
