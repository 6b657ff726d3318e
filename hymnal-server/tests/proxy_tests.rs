//! Integration tests for the Drive streaming proxy

mod common;

use axum::http::{header, Request, StatusCode};
use axum::body::Body;
use common::*;
use hymnal_server::drive::ByteRange;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

fn audio_bytes() -> Vec<u8> {
    (0..1000u32).map(|i| (i % 251) as u8).collect()
}

fn range_request(uri: &str, range: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::RANGE, range)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_range_request_returns_partial_content() {
    let drive = Arc::new(FakeDrive::default().with_file("song", "audio/mpeg", audio_bytes()));
    let app = setup_app(setup_db().await, drive.clone());

    let response = app
        .oneshot(range_request("/api/proxy/song", "bytes=100-199"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_RANGE], "bytes 100-199/1000");
    assert_eq!(headers[header::CONTENT_LENGTH], "100");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(headers[header::CONTENT_TYPE], "audio/mpeg");
    assert!(headers.get(header::CACHE_CONTROL).is_none());

    let body = body_bytes(response).await;
    assert_eq!(body, audio_bytes()[100..200].to_vec());
    assert_eq!(
        *drive.last_range.lock().unwrap(),
        Some(ByteRange { start: 100, end: 199 })
    );
}

#[tokio::test]
async fn test_open_ended_range() {
    let drive = Arc::new(FakeDrive::default().with_file("song", "audio/mpeg", audio_bytes()));
    let app = setup_app(setup_db().await, drive);

    let response = app
        .oneshot(range_request("/api/proxy/song", "bytes=900-"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 900-999/1000");
    assert_eq!(body_bytes(response).await.len(), 100);
}

#[tokio::test]
async fn test_full_audio_response_is_cacheable() {
    let drive = Arc::new(FakeDrive::default().with_file("song", "audio/mpeg", audio_bytes()));
    let app = setup_app(setup_db().await, drive.clone());

    let response = app.oneshot(request("GET", "/api/proxy/song")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=31536000");
    assert_eq!(headers[header::CONTENT_LENGTH], "1000");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(body_bytes(response).await, audio_bytes());
    assert_eq!(*drive.last_range.lock().unwrap(), None);
}

#[tokio::test]
async fn test_unsatisfiable_range_falls_back_to_full_body() {
    let drive = Arc::new(FakeDrive::default().with_file("song", "audio/mpeg", audio_bytes()));
    let app = setup_app(setup_db().await, drive);

    let response = app
        .oneshot(range_request("/api/proxy/song", "bytes=5000-6000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.len(), 1000);
}

#[tokio::test]
async fn test_images_ignore_range() {
    let drive = Arc::new(FakeDrive::default().with_file("cover", "image/jpeg", vec![7u8; 64]));
    let app = setup_app(setup_db().await, drive);

    let response = app
        .oneshot(range_request("/api/proxy/cover", "bytes=0-9"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::ACCEPT_RANGES).is_none());
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body_bytes(response).await.len(), 64);
}

#[tokio::test]
async fn test_unsupported_mime_type_rejected() {
    let drive = Arc::new(FakeDrive::default().with_file("doc", "application/pdf", vec![1, 2, 3]));
    let app = setup_app(setup_db().await, drive);

    let response = app.oneshot(request("GET", "/api/proxy/doc")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Unsupported file type"));
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let app = setup_app(setup_db().await, Arc::new(FakeDrive::default()));

    let response = app.oneshot(request("GET", "/api/proxy/ghost")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_file_id_never_reaches_drive() {
    let drive = Arc::new(FakeDrive::default().with_file("a", "audio/mpeg", audio_bytes()));
    let app = setup_app(setup_db().await, drive.clone());

    for uri in [
        "/api/proxy/a%2F..%2Fb",
        "/api/proxy/..%2Fabout%3Ffields%3D*",
        "/api/proxy/a%26alt%3Dmedia",
    ] {
        let response = app.clone().oneshot(request("GET", uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = extract_json(response).await;
        assert_eq!(body["error"], "Invalid file ID");
    }

    assert_eq!(drive.metadata_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_token_refreshed_once() {
    let drive = Arc::new(
        FakeDrive::default()
            .with_file("song", "audio/mpeg", audio_bytes())
            .expire_next(1),
    );
    let app = setup_app(setup_db().await, drive.clone());

    let response = app.oneshot(request("GET", "/api/proxy/song")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(drive.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(drive.metadata_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_second_expiry_is_not_retried() {
    let drive = Arc::new(
        FakeDrive::default()
            .with_file("song", "audio/mpeg", audio_bytes())
            .expire_next(2),
    );
    let app = setup_app(setup_db().await, drive.clone());

    let response = app.oneshot(request("GET", "/api/proxy/song")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(drive.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(drive.metadata_calls.load(Ordering::SeqCst), 2);

    let body = extract_json(response).await;
    assert_eq!(body["error"], "Failed to proxy file");
}
