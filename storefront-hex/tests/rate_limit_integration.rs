//! Integration tests for rate limiting middleware.
//!
//! These tests verify the HTTP-level behavior of rate limiting,
//! including 429 responses and proper integration with the middleware stack.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use storefront_hex::inbound::HttpServer;
use tower::ServiceExt;

use common::{FixtureBackend, catalog, json_body, loaded_service};

/// Helper to create a test server with a very low rate limit.
async fn create_test_server(requests_per_minute: u32) -> HttpServer<FixtureBackend> {
    let service = loaded_service(catalog()).await;
    HttpServer::with_rate_limit(service, requests_per_minute)
}

/// Helper to make a health check request.
fn health_request() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

/// Helper to make a catalog request from one client address.
fn catalog_request(client: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/catalog")
        .header("X-Forwarded-For", client)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    let server = create_test_server(3).await;
    let app = server.router();

    for i in 1..=3 {
        let response = app
            .clone()
            .oneshot(catalog_request("198.51.100.4"))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Request {} should not be rate limited (quota not yet exceeded)",
            i
        );
    }

    // 4th request should be rate limited
    let response = app
        .clone()
        .oneshot(catalog_request("198.51.100.4"))
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::TOO_MANY_REQUESTS,
        "Request should be rate limited after exceeding quota"
    );

    let json = json_body(response).await;
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("Rate limit exceeded")
    );
    assert_eq!(json["retry_after_seconds"], 60);
}

#[tokio::test]
async fn test_rate_limiting_health_endpoint_bypassed() {
    let server = create_test_server(1).await;
    let app = server.router();

    for _ in 0..10 {
        let response = app.clone().oneshot(health_request()).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Health endpoint should not be rate limited"
        );
    }
}

#[tokio::test]
async fn test_rate_limiting_per_client_isolation() {
    let server = create_test_server(1).await;
    let app = server.router();

    let response = app
        .clone()
        .oneshot(catalog_request("203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(catalog_request("203.0.113.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different client still has its own quota.
    let response = app
        .clone()
        .oneshot(catalog_request("203.0.113.2"))
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Second client should have its own quota"
    );
}

#[tokio::test]
async fn test_rate_limiting_response_format() {
    let server = create_test_server(1).await;
    let app = server.router();

    let _ = app.clone().oneshot(catalog_request("192.0.2.9")).await;
    let response = app
        .clone()
        .oneshot(catalog_request("192.0.2.9"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("application/json"));

    let json = json_body(response).await;
    assert!(
        json.get("error").is_some(),
        "Response should have 'error' field"
    );
    assert!(
        json.get("retry_after_seconds").is_some(),
        "Response should have 'retry_after_seconds' field"
    );
}
