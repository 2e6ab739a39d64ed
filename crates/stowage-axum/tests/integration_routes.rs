//! Integration tests for the HTTP control API.
//!
//! Routes run against a real on-disk cache; downloads are canned.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use stowage_core::{Credentials, Digest, DownloadError};
use tower::ServiceExt;

use common::{Canned, CannedDownloads, TestApp};

const MODEL: &str = "https://files.example.com/models/tiny.bin";
const MODEL_BYTES: &[u8] = b"tiny model weights";

async fn app() -> TestApp {
    TestApp::new(
        CannedDownloads::default()
            .with(MODEL, Canned::Body(MODEL_BYTES.to_vec()))
            .with(
                "https://files.example.com/flaky",
                Canned::Fail(DownloadError::upstream_status(
                    "https://files.example.com/flaky",
                    "GET",
                    503,
                )),
            ),
    )
    .await
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn post_json(app: &TestApp, uri: &str, body: &Value) -> (StatusCode, Value) {
    let (status, body) = post_raw(app, uri, body.to_string()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_raw(app: &TestApp, uri: &str, body: String) -> (StatusCode, Vec<u8>) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

async fn get(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn delete(app: &TestApp, uri: &str) -> StatusCode {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .0
}

fn content_uri(locator: &str) -> String {
    format!("/content/{}", STANDARD.encode(locator))
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn lookup_miss_is_not_found() {
    let app = app().await;
    let (status, body) = get(&app, &content_uri(MODEL)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert!(body["error"].as_str().unwrap().contains(MODEL));
}

#[tokio::test]
async fn ensure_then_lookup_returns_digest() {
    let app = app().await;
    let expected = Digest::of_bytes(MODEL_BYTES).to_string();

    let (status, body) = post_json(&app, "/content/", &json!({ "url": MODEL })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "url": MODEL, "digest": expected }));

    let (status, body) = get(&app, &content_uri(MODEL)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["digest"], expected);

    let url_safe = format!("/content/{}", URL_SAFE_NO_PAD.encode(MODEL));
    let (status, body) = get(&app, &url_safe).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], MODEL);
}

#[tokio::test]
async fn ensure_accepts_path_without_trailing_slash() {
    let app = app().await;
    let (status, body) = post_json(&app, "/content", &json!({ "url": MODEL })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], MODEL);
}

#[tokio::test]
async fn repeated_ensure_downloads_once() {
    let app = app().await;
    for _ in 0..3 {
        let (status, _) = post_json(&app, "/content/", &json!({ "url": MODEL })).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn evict_removes_content_and_is_idempotent() {
    let app = app().await;
    post_json(&app, "/content/", &json!({ "url": MODEL })).await;

    assert_eq!(delete(&app, &content_uri(MODEL)).await, StatusCode::OK);
    let (status, _) = get(&app, &content_uri(MODEL)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(delete(&app, &content_uri(MODEL)).await, StatusCode::OK);
    assert_eq!(
        delete(&app, &content_uri("https://never.example.com/x")).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn credentials_reach_the_downloader() {
    let app = app().await;
    let (status, _) = post_json(
        &app,
        "/content/",
        &json!({
            "url": MODEL,
            "credentials": STANDARD.encode("user:pass"),
            "credentialsType": "basic"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.credentials(),
        vec![Some(Credentials::Basic {
            username: "user".into(),
            password: "pass".into()
        })]
    );
}

#[tokio::test]
async fn bearer_is_the_default_credentials_type() {
    let app = app().await;
    post_json(&app, "/content/", &json!({ "url": MODEL, "credentials": "tkn" })).await;
    assert_eq!(
        app.credentials(),
        vec![Some(Credentials::Bearer("tkn".into()))]
    );
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = app().await;

    let (status, _) = post_raw(&app, "/content/", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(&app, "/content/", &json!({ "credentials": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(&app, "/content/", &json!({ "url": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/content/",
        &json!({ "url": MODEL, "credentials": "x", "credentialsType": "digest" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("credentials"));

    let (status, _) = get(&app, "/content/bad!input").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_scheme_is_bad_request() {
    let app = app().await;
    let (status, body) =
        post_json(&app, "/content/", &json!({ "url": "ftp://example.com/file" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let app = app().await;
    let (status, body) = post_json(
        &app,
        "/content/",
        &json!({ "url": "https://files.example.com/flaky" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["type"], "UPSTREAM");
    assert_eq!(body["upstreamStatus"], 503);

    let (status, _) = get(&app, &content_uri("https://files.example.com/flaky")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_download_is_integrity_error() {
    let app = TestApp::new(
        CannedDownloads::default().with("https://files.example.com/empty", Canned::Body(Vec::new())),
    )
    .await;
    let (status, body) = post_json(
        &app,
        "/content/",
        &json!({ "url": "https://files.example.com/empty" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["type"], "INTEGRITY");
}

#[tokio::test]
async fn broken_upstream_stream_is_bad_gateway() {
    let locator = "https://files.example.com/dropped";
    let app = TestApp::new(
        CannedDownloads::default().with(locator, Canned::Truncated(b"partial".to_vec())),
    )
    .await;
    let (status, body) = post_json(&app, "/content/", &json!({ "url": locator })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["type"], "UPSTREAM");
    assert!(body.get("upstreamStatus").is_none());
    let message = body["error"].as_str().unwrap();
    assert!(message.contains(locator));
    assert!(message.contains("connection reset"));

    let (status, _) = get(&app, &content_uri(locator)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
