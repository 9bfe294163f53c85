//! Integration tests for the health check endpoint and general HTTP behaviour.
//!
//! These run without a database: the pool points at a closed port.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get};
use gymflow_core::testing::RecordingChannel;
use gymflow_core::{ChannelKind, ChannelRegistry};
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], false);
    assert_eq!(json["channels"], serde_json::json!([]));
    assert_eq!(json["default_channel"], "sms");
    assert_eq!(json["default_channel_ready"], false);
}

#[tokio::test]
async fn health_lists_configured_channels() {
    let channels = ChannelRegistry::new()
        .with(Arc::new(RecordingChannel::new(ChannelKind::Whatsapp)))
        .with(Arc::new(RecordingChannel::new(ChannelKind::Sms)));
    let app = common::build_test_app_with_channels(common::unreachable_pool(), channels);

    let json = body_json(get(app, "/health").await).await;
    assert_eq!(json["channels"], serde_json::json!(["sms", "whatsapp"]));
    assert_eq!(json["default_channel_ready"], true);
    // Still degraded: the database is unreachable.
    assert_eq!(json["status"], "degraded");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");

    // MakeRequestUuid produces a hyphenated UUID.
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn cors_preflight_returns_correct_headers() {
    let app = common::build_test_app(common::unreachable_pool());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/scan/check-in")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .expect("Missing Access-Control-Allow-Origin header")
            .to_str()
            .unwrap(),
        "http://localhost:5173"
    );
    let allow_methods = headers
        .get("access-control-allow-methods")
        .expect("Missing Access-Control-Allow-Methods header")
        .to_str()
        .unwrap();
    assert!(allow_methods.contains("POST"), "got: {allow_methods}");
}
