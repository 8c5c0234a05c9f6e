use super::{create_router, AppState};
use crate::config::Settings;
use crate::upstream::YouTubeClient;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(upstream: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.upstream.base_url = format!("{}/search", upstream.uri());
    settings.upstream.api_key = "server-key".to_string();
    settings
}

fn app_with(settings: Settings) -> (Router, AppState) {
    let upstream = Arc::new(YouTubeClient::with_settings(&settings.upstream).unwrap());
    let state = AppState::new(settings, upstream);
    (create_router(state.clone()), state)
}

fn request(method: Method, uri: &str, client: [u8; 4]) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((client, 40000))));
    request
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn next_chunk(body: &mut axum::body::BodyDataStream) -> String {
    let chunk = body.next().await.unwrap().unwrap();
    String::from_utf8(chunk.to_vec()).unwrap()
}

/// Directory holding a single index page
fn static_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tube-remote-{}-{}", name, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("remote.html"), "<h1>remote</h1>").unwrap();
    dir
}

#[tokio::test]
async fn search_hits_upstream_once_per_query() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "never gonna"))
        .and(query_param("key", "server-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": ["a"]})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (app, _) = app_with(settings_for(&upstream));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/search_video?query=never%20gonna", [10, 0, 0, 1]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"items": ["a"]}));
    }
}

#[tokio::test]
async fn search_passes_upstream_failure_through_uncached() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"error": {"message": "quota"}})),
        )
        .expect(2)
        .mount(&upstream)
        .await;

    let (app, _) = app_with(settings_for(&upstream));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/search_video?query=cats", [10, 0, 0, 1]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await,
            json!({"error": {"message": "quota"}})
        );
    }
}

#[tokio::test]
async fn search_without_query_is_rejected() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&upstream)
        .await;

    let (app, state) = app_with(settings_for(&upstream));

    for uri in ["/search_video", "/search_video?query=", "/search_video?other=1"] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, uri, [10, 0, 0, 1]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Missing query parameter"})
        );
    }
    assert_eq!(state.limiter.tracked(), 0);
}

#[tokio::test]
async fn search_rate_limit_per_client() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&upstream)
        .await;

    let (app, _) = app_with(settings_for(&upstream));

    for _ in 0..30 {
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/search_video?query=cats", [10, 0, 0, 1]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/search_video?query=cats", [10, 0, 0, 1]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/search_video?query=cats", [10, 0, 0, 2]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn control_endpoints_acknowledge_and_limit() {
    let upstream = MockServer::start().await;
    let (app, _) = app_with(settings_for(&upstream));

    for (uri, message) in [
        ("/play", "Play command sent"),
        ("/pause", "Pause command sent"),
        ("/toggle", "Toggle command sent"),
    ] {
        let response = app
            .clone()
            .oneshot(request(Method::POST, uri, [10, 0, 0, 3]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "success", "message": message})
        );
    }

    for _ in 3..60 {
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/toggle", [10, 0, 0, 3]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/play", [10, 0, 0, 3]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn viewer_receives_published_command() {
    let upstream = MockServer::start().await;
    let (app, state) = app_with(settings_for(&upstream));

    let stream = app
        .clone()
        .oneshot(request(Method::GET, "/events", [10, 0, 0, 4]))
        .await
        .unwrap();
    assert_eq!(stream.status(), StatusCode::OK);
    assert_eq!(stream.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(stream.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(stream.headers()["x-accel-buffering"], "no");
    assert_eq!(state.hub.len(), 1);

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/play", [10, 0, 0, 5]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = stream.into_body().into_data_stream();
    let frame = next_chunk(&mut body).await;
    let payload = frame
        .strip_prefix("data: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(payload).unwrap(),
        json!({"type": "control", "command": "play"})
    );

    drop(body);
    assert!(state.hub.is_empty());

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/pause", [10, 0, 0, 5]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.metrics.snapshot().events_delivered, 1);
}

#[tokio::test(start_paused = true)]
async fn idle_viewer_gets_keep_alive() {
    let mut settings = Settings::default();
    settings.upstream.base_url = "http://127.0.0.1:1/search".to_string();
    let (app, state) = app_with(settings);

    let stream = app
        .clone()
        .oneshot(request(Method::GET, "/events", [10, 0, 0, 6]))
        .await
        .unwrap();
    let mut body = stream.into_body().into_data_stream();

    let started = tokio::time::Instant::now();
    let frame = next_chunk(&mut body).await;
    assert!(frame.starts_with(':'));
    assert!(!frame.contains("data"));
    assert!(started.elapsed() >= Duration::from_secs(30));

    assert!(next_chunk(&mut body).await.starts_with(':'));
    assert_eq!(state.hub.len(), 1);
}

#[tokio::test]
async fn static_assets_and_default_limit() {
    let upstream = MockServer::start().await;
    let mut settings = settings_for(&upstream);
    settings.server.static_dir = static_root("static");
    let (app, _) = app_with(settings);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/", [10, 0, 0, 7]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>remote</h1>");

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/remote.html", [10, 0, 0, 7]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/missing.js", [10, 0, 0, 7]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Three used above; the default class admits ten per minute
    for _ in 3..10 {
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/remote.html", [10, 0, 0, 7]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/remote.html", [10, 0, 0, 7]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Health is outside every limit class
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/health", [10, 0, 0, 7]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stats_reports_counters_and_registries() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&upstream)
        .await;

    let (app, _) = app_with(settings_for(&upstream));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/search_video?query=cats", [10, 0, 0, 8]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app
        .clone()
        .oneshot(request(Method::POST, "/play", [10, 0, 0, 9]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/stats", [10, 0, 0, 10]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = json_body(response).await;
    let counters = &stats["counters"];
    assert_eq!(counters["searches"], 2);
    assert_eq!(counters["cache_hits"], 1);
    assert_eq!(counters["cache_misses"], 1);
    assert_eq!(counters["upstream_errors"], 0);
    assert_eq!(counters["events_published"], 1);
    assert_eq!(counters["events_delivered"], 0);
    assert_eq!(stats["viewers"], 0);
    // Entry counts settle lazily in the cache, so only the type is fixed
    assert!(stats["cached_queries"].is_u64());
    // Search and control windows; /stats itself is unlimited
    assert_eq!(stats["tracked_clients"], 2);
}
