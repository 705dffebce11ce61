//! API integration tests.
//!
//! The router runs against fake media and AI ports, so no external tool or
//! network access is needed.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use clipper_ai::AiResult;
use clipper_api::{create_router, AppState, ServerConfig};
use clipper_media::{MediaConfig, MediaError, MediaResult, MediaToolkit};
use clipper_models::Highlight;
use clipper_pipeline::{
    ClipCutter, HighlightFinder, Pipeline, PipelinePorts, Transcriber, VideoDownloader,
};
use clipper_storage::{cleanup_channel, ArtifactStore};

#[derive(Default)]
struct Calls {
    download: AtomicUsize,
    transcribe: AtomicUsize,
    cut: AtomicUsize,
    highlights: AtomicUsize,
}

impl Calls {
    fn external(&self) -> usize {
        self.download.load(Ordering::SeqCst)
            + self.transcribe.load(Ordering::SeqCst)
            + self.cut.load(Ordering::SeqCst)
            + self.highlights.load(Ordering::SeqCst)
    }
}

struct FakeMedia {
    calls: Arc<Calls>,
    fail_download: bool,
}

#[async_trait]
impl VideoDownloader for FakeMedia {
    async fn download(&self, _url: &str, dest: &Path) -> MediaResult<()> {
        self.calls.download.fetch_add(1, Ordering::SeqCst);
        if self.fail_download {
            return Err(MediaError::download_failed("exit 1", None, Some(1)));
        }
        tokio::fs::write(dest, b"source video").await?;
        Ok(())
    }
}

#[async_trait]
impl ClipCutter for FakeMedia {
    async fn cut(&self, _src: &Path, dest: &Path, start: f64, end: f64) -> MediaResult<()> {
        self.calls.cut.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(dest, format!("clip {}-{}", start, end)).await?;
        Ok(())
    }
}

struct FakeAi {
    calls: Arc<Calls>,
}

#[async_trait]
impl Transcriber for FakeAi {
    async fn transcribe(&self, _path: &Path) -> AiResult<String> {
        self.calls.transcribe.fetch_add(1, Ordering::SeqCst);
        Ok("a transcript".to_string())
    }
}

#[async_trait]
impl HighlightFinder for FakeAi {
    async fn find_highlights(&self, _transcript: &str) -> AiResult<Vec<Highlight>> {
        self.calls.highlights.fetch_add(1, Ordering::SeqCst);
        Ok(clipper_ai::parse_highlights("not json at all"))
    }
}

struct TestApp {
    router: Router,
    store: ArtifactStore,
    calls: Arc<Calls>,
    shutdown: CancellationToken,
    _dir: TempDir,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Options {
    server: ServerConfig,
    cleanup_delay: Duration,
    fail_download: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cleanup_delay: Duration::from_secs(3600),
            fail_download: false,
        }
    }
}

async fn test_app(options: Options) -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path()).await.unwrap();
    let (scheduler, worker) = cleanup_channel(store.clone());
    let shutdown = CancellationToken::new();
    tokio::spawn(worker.run(shutdown.clone()));

    let calls = Arc::new(Calls::default());
    let media = Arc::new(FakeMedia {
        calls: calls.clone(),
        fail_download: options.fail_download,
    });
    let ai = Arc::new(FakeAi {
        calls: calls.clone(),
    });
    let ports = PipelinePorts {
        downloader: media.clone(),
        cutter: media,
        transcriber: ai.clone(),
        highlighter: ai,
    };
    let pipeline = Pipeline::new(store.clone(), scheduler, ports, options.cleanup_delay);
    let state = AppState::from_parts(
        options.server,
        pipeline,
        MediaToolkit::new(MediaConfig::default()),
    );

    TestApp {
        router: create_router(state, None),
        store,
        calls,
        shutdown,
        _dir: dir,
    }
}

fn post_json(uri: &str, body: &str, client: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Forwarded-For", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(Options::default()).await;

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().contains_key("X-Request-ID"));

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_process_validation_makes_no_external_calls() {
    let app = test_app(Options::default()).await;

    for body in [
        r#"{}"#,
        r#"{"clips": []}"#,
        r#"{"videoUrl": "", "clips": []}"#,
        r#"{"videoUrl": "https://example.com/v"}"#,
        r#"{"videoUrl": "https://example.com/v", "clips": "0-10"}"#,
        r#"{"videoUrl": "https://example.com/v", "clips": [{"start": 10, "end": 5}]}"#,
        r#"{"videoUrl": "#,
    ] {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/process", body, "198.51.100.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body_json(response).await, json!({"error": "Invalid input"}));
    }

    assert_eq!(app.calls.external(), 0);
}

#[tokio::test]
async fn test_analyze_missing_url() {
    let app = test_app(Options::default()).await;

    let response = app
        .router
        .clone()
        .oneshot(post_json("/analyze", "{}", "198.51.100.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Missing videoUrl"}));
    assert_eq!(app.calls.external(), 0);
}

#[tokio::test]
async fn test_process_then_download_clip() {
    let app = test_app(Options::default()).await;

    let body = r#"{"videoUrl":"https://example.com/v","clips":[{"start":0,"end":10,"title":"a"},{"start":20,"end":35}]}"#;
    let response = app
        .router
        .clone()
        .oneshot(post_json("/process", body, "198.51.100.3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["transcript"], "a transcript");
    let clips: Vec<String> = serde_json::from_value(body["clips"].clone()).unwrap();
    assert_eq!(clips.len(), 2);
    assert!(clips[0].starts_with("clip_0_") && clips[0].ends_with(".mp4"));
    assert!(clips[1].starts_with("clip_1_"));
    assert_eq!(app.calls.cut.load(Ordering::SeqCst), 2);

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/download/{}", clips[1])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{}\"", clips[1]).as_str()
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"clip 20-35");
}

#[tokio::test]
async fn test_download_rejects_traversal_and_non_clips() {
    let app = test_app(Options::default()).await;
    tokio::fs::write(app.store.root().join("video_1-abc.mp4"), b"source")
        .await
        .unwrap();

    for uri in [
        "/download/..%2F..%2Fetc%2Fpasswd",
        "/download/clip_..%2Fsecret",
        "/download/video_1-abc.mp4",
        "/download/clip_9_missing.mp4",
    ] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(response).await, json!({"error": "File not found"}));
    }
}

#[tokio::test]
async fn test_clip_gone_after_grace_period() {
    let app = test_app(Options {
        cleanup_delay: Duration::from_millis(100),
        ..Options::default()
    })
    .await;

    let body = r#"{"videoUrl":"https://example.com/v","clips":[{"start":1,"end":2}]}"#;
    let response = app
        .router
        .clone()
        .oneshot(post_json("/process", body, "198.51.100.4"))
        .await
        .unwrap();
    let clips = body_json(response).await["clips"].clone();
    let name = clips[0].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(400)).await;

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/download/{}", name)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_failure_is_generic_500() {
    let app = test_app(Options {
        fail_download: true,
        ..Options::default()
    })
    .await;

    let body = r#"{"videoUrl":"https://example.com/v","clips":[{"start":1,"end":2}]}"#;
    let response = app
        .router
        .clone()
        .oneshot(post_json("/process", body, "198.51.100.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Processing failed"}));
    assert_eq!(app.calls.transcribe.load(Ordering::SeqCst), 0);

    let response = app
        .router
        .clone()
        .oneshot(post_json("/analyze", r#"{"videoUrl":"https://example.com/v"}"#, "198.51.100.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Analyze failed"}));
}

#[tokio::test]
async fn test_analyze_unparseable_model_output_falls_back() {
    let app = test_app(Options::default()).await;

    let response = app
        .router
        .clone()
        .oneshot(post_json("/analyze", r#"{"videoUrl":"https://example.com/v"}"#, "198.51.100.6"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["transcript"], "a transcript");
    assert_eq!(
        body["highlights"],
        json!([{
            "title": "Highlight",
            "summary": "Fallback moment",
            "start_time": 30.0,
            "end_time": 60.0,
            "viral_score": 7.0
        }])
    );
}

#[tokio::test]
async fn test_rate_limiting_per_client_and_reset() {
    let app = test_app(Options {
        server: ServerConfig {
            rate_limit_max: 2,
            rate_limit_window: Duration::from_millis(300),
            ..ServerConfig::default()
        },
        ..Options::default()
    })
    .await;

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/analyze", "{}", "203.0.113.10"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .router
        .clone()
        .oneshot(post_json("/process", "{}", "203.0.113.10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(
        body_json(response).await,
        json!({"error": "Too many requests, try again later."})
    );

    // Other clients and unthrottled routes are unaffected.
    let response = app
        .router
        .clone()
        .oneshot(post_json("/analyze", "{}", "203.0.113.11"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(400)).await;
    let response = app
        .router
        .clone()
        .oneshot(post_json("/analyze", "{}", "203.0.113.10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limit_ignores_forged_forwarded_hops() {
    let app = test_app(Options {
        server: ServerConfig {
            rate_limit_max: 2,
            rate_limit_window: Duration::from_secs(3600),
            trusted_proxy_hops: 1,
            ..ServerConfig::default()
        },
        ..Options::default()
    })
    .await;

    let mut throttled = 0;
    for i in 0..20 {
        // The caller controls everything left of the proxy's entry.
        let chain = format!("10.9.0.{}, 198.51.100.77", i);
        let response = app
            .router
            .clone()
            .oneshot(post_json("/analyze", "{}", &chain))
            .await
            .unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            throttled += 1;
        }
    }
    assert_eq!(throttled, 18);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = test_app(Options::default()).await;
    let response = app.router.clone().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Not found"}));
}

