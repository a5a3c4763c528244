use super::*;
use crate::test_helpers::{FakeRunner, create_test_downloader, workspace_count};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::io::Read;
use tower::ServiceExt; // for oneshot()

/// Build a router backed by a fake tool runner.
fn test_router(runner: FakeRunner) -> (Router, tempfile::TempDir) {
    let (downloader, _runner, temp_dir) = create_test_downloader(runner);
    let config = Arc::new(downloader.config().clone());
    let router = create_router(Arc::new(downloader), config);
    (router, temp_dir)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok_with_version() {
    let (app, _dir) = test_router(FakeRunner::succeeding(vec![]));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn service_info_lists_endpoints() {
    let (app, _dir) = test_router(FakeRunner::succeeding(vec![]));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["service"], "media-dl");
    assert!(json["endpoints"]["probe"].as_str().unwrap().contains("/probe"));
}

#[tokio::test]
async fn probe_without_url_is_400_validation_error() {
    let (app, _dir) = test_router(FakeRunner::succeeding(vec![]));

    let response = app
        .oneshot(Request::builder().uri("/probe").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["error"]["message"].as_str().unwrap().contains("url"));
}

#[tokio::test]
async fn probe_returns_parsed_metadata() {
    let stdout = "WARNING: throttled\n{\"title\":\"X\",\"view_count\":5,\"formats\":[]}";
    let (app, _dir) = test_router(FakeRunner::probing(stdout));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/probe?url=https://example.com/watch?v=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["title"], "X");
    assert_eq!(json["viewCount"], 5);
}

#[tokio::test]
async fn probe_tool_failure_is_502_with_stderr() {
    let (app, _dir) = test_router(FakeRunner::failing("ERROR: Private video"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/probe?url=https://example.com/v")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "tool_failure");
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Private video")
    );
}

#[tokio::test]
async fn download_without_url_is_400() {
    let (app, _dir) = test_router(FakeRunner::succeeding(vec![]));

    let response = app
        .oneshot(json_post("/download", r#"{"format":"best"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn download_streams_file_with_attachment_headers() {
    let (app, dir) = test_router(FakeRunner::succeeding(vec![(
        "video.mp4",
        b"fake video bytes",
    )]));

    let response = app
        .oneshot(json_post(
            "/download",
            r#"{"url":"https://example.com/v"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"video.mp4\""
    );
    assert_eq!(response.headers()["content-length"], "16");

    let bytes = body_bytes(response).await;
    assert_eq!(bytes, b"fake video bytes");

    // Workspace is gone once the body has been consumed
    assert_eq!(workspace_count(dir.path()), 0);
}

#[tokio::test]
async fn download_tool_failure_is_502_and_cleans_workspace() {
    let (app, dir) = test_router(FakeRunner::failing("ERROR: Video unavailable"));

    let response = app
        .oneshot(json_post(
            "/download",
            r#"{"url":"https://example.com/v"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Video unavailable")
    );
    assert_eq!(workspace_count(dir.path()), 0);
}

#[tokio::test]
async fn playlist_streams_zip_with_fixed_filename() {
    let (app, dir) = test_router(FakeRunner::succeeding(vec![
        ("1 - a.mp4", b"one"),
        ("2 - b.mp4", b"two"),
        ("3 - c.mp4", b"three"),
    ]));

    let response = app
        .oneshot(json_post(
            "/playlist",
            r#"{"url":"https://example.com/list"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/zip");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"playlist.zip\""
    );

    let bytes = body_bytes(response).await;
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(zip.len(), 3);
    let mut contents = String::new();
    zip.by_name("3 - c.mp4")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "three");

    assert_eq!(workspace_count(dir.path()), 0);
}

#[tokio::test]
async fn invalid_url_is_400_invalid_url() {
    let (app, _dir) = test_router(FakeRunner::succeeding(vec![]));

    let response = app
        .oneshot(json_post("/download", r#"{"url":"not a url"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_url");
}

#[tokio::test]
async fn events_endpoint_is_an_sse_stream() {
    let (app, _dir) = test_router(FakeRunner::succeeding(vec![]));

    let response = app
        .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.contains("text/event-stream"));
}

#[tokio::test]
async fn openapi_spec_is_served() {
    let (app, _dir) = test_router(FakeRunner::succeeding(vec![]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"].get("/download").is_some());
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (downloader, _runner, _dir) = create_test_downloader(FakeRunner::succeeding(vec![]));
    let mut config = downloader.config().clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(Arc::new(downloader), Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
