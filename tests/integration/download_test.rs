//! Integration tests for the fetch and download endpoints.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use audiogate_access::{TokenIssuer, TokenStore};
use audiogate_api::AppState;
use audiogate_core::error::ErrorKind;
use audiogate_core::traits::Clock;

const VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[tokio::test]
async fn test_fetch_then_download() {
    let app = helpers::TestApp::new().await;

    let token = app.fetch_token(VIDEO).await;
    assert!(app.store.exists(&token));

    let response = app.get(&format!("/download?token={token}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("audio/mpeg"));
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"track-0.mp3\"")
    );
    let expected = helpers::stub_audio(0);
    assert_eq!(
        response.header("content-length"),
        Some(expected.len().to_string().as_str())
    );
    assert_eq!(response.body, expected);
}

#[tokio::test]
async fn test_fetch_missing_url() {
    let app = helpers::TestApp::new().await;

    for path in ["/", "/?url=", "/?url=%20"] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "path {path}");
        assert_eq!(response.error_code(), "VALIDATION_ERROR");
    }
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_fetch_rejects_non_url() {
    let app = helpers::TestApp::new().await;

    let response = app.get("/?url=not-a-url").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_fetch_failure_is_server_error() {
    let app = helpers::TestApp::new().await;
    app.fetcher.fail_with(ErrorKind::ExternalService);

    let response = app.get(&format!("/?url={VIDEO}")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), "FETCH_FAILED");
    assert!(response.json()["message"].is_string());
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_fetch_tool_missing_is_unavailable() {
    let app = helpers::TestApp::new().await;
    app.fetcher.fail_with(ErrorKind::ServiceUnavailable);

    let response = app.get(&format!("/?url={VIDEO}")).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_issue_failure_removes_fetched_file() {
    let mut app = helpers::TestApp::new().await;
    // Expiry beyond the calendar makes every issuance fail
    let store = Arc::new(TokenStore::new(Duration::from_secs(10_000_000_000_000)));
    let clock: Arc<dyn Clock> = app.clock.clone();
    let issuer = Arc::new(TokenIssuer::new(store.clone(), clock, 32).unwrap());
    app.router = audiogate_api::build_router(AppState {
        store: store.clone(),
        issuer,
        ..app.state()
    });

    let response = app.get(&format!("/?url={VIDEO}")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), "INTERNAL_ERROR");
    assert!(store.is_empty());
    assert!(!app.file_path("track-0.mp3").exists());
}

#[tokio::test]
async fn test_download_missing_token() {
    let app = helpers::TestApp::new().await;

    for path in ["/download", "/download?token="] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "path {path}");
        assert_eq!(response.error_code(), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_download_unknown_token() {
    let app = helpers::TestApp::new().await;

    let response = app.get("/download?token=never-issued").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_TOKEN");
    assert_eq!(response.json()["message"], "Invalid token.");
}

#[tokio::test]
async fn test_download_expired_token() {
    let app = helpers::TestApp::new().await;
    let token = app.fetch_token(VIDEO).await;

    app.advance(60);

    let response = app.get(&format!("/download?token={token}")).await;
    assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(response.error_code(), "TOKEN_EXPIRED");
    assert_eq!(response.json()["message"], "Token has expired.");
}

#[tokio::test]
async fn test_download_file_vanished() {
    let app = helpers::TestApp::new().await;
    let token = app.fetch_token(VIDEO).await;

    std::fs::remove_file(app.file_path("track-0.mp3")).unwrap();

    let response = app.get(&format!("/download?token={token}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["message"], "File not found.");
    assert!(app.store.exists(&token));
}

#[tokio::test]
async fn test_download_is_repeatable_by_default() {
    let app = helpers::TestApp::new().await;
    let token = app.fetch_token(VIDEO).await;

    for _ in 0..3 {
        let response = app.get(&format!("/download?token={token}")).await;
        assert_eq!(response.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_single_use_token_is_gone_after_download() {
    let app = helpers::TestApp::with_config(|c| c.access.single_use = true).await;
    let token = app.fetch_token(VIDEO).await;

    let first = app.get(&format!("/download?token={token}")).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.get(&format!("/download?token={token}")).await;
    assert_eq!(second.status, StatusCode::GONE);
    assert_eq!(second.error_code(), "TOKEN_USED");

    // Still swept on schedule
    assert!(app.file_path("track-0.mp3").exists());
    app.advance(60);
    app.sweeper.sweep_once().await;
    assert!(!app.file_path("track-0.mp3").exists());
}

#[tokio::test]
async fn test_scenario_a_over_http() {
    let app = helpers::TestApp::new().await;
    let token = app.fetch_token(VIDEO).await;

    app.advance(10);
    let response = app.get(&format!("/download?token={token}")).await;
    assert_eq!(response.status, StatusCode::OK);

    app.advance(51);
    let report = app.sweeper.sweep_once().await;
    assert_eq!(report.reclaimed, 1);

    let response = app.get(&format!("/download?token={token}")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!app.file_path("track-0.mp3").exists());
}

#[tokio::test]
async fn test_expired_but_unswept_is_expired_not_unknown() {
    let app = helpers::TestApp::new().await;
    let token = app.fetch_token(VIDEO).await;

    app.advance(65);
    let response = app.get(&format!("/download?token={token}")).await;
    assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);

    app.sweeper.sweep_once().await;
    let response = app.get(&format!("/download?token={token}")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;
    app.fetch_token(VIDEO).await;
    app.fetch_token(VIDEO).await;

    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["live_tokens"], 2);
    assert_eq!(body["storage"], "available");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = helpers::TestApp::new().await;
    let response = app.get("/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
