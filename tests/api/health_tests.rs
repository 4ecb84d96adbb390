//! Health and Metrics Endpoint Tests
//!
//! Router-level tests using a lazy database pool; no live database is
//! required for the endpoints exercised here.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use interest_connect::config::{
    CorsSettings, DatabaseSettings, JwtSettings, RealtimeSettings, ServerSettings, Settings,
};
use interest_connect::presentation::http::create_router;
use interest_connect::presentation::realtime::Hub;
use interest_connect::startup::AppState;

fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://localhost/interest_connect_test".to_string(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
        },
        jwt: JwtSettings {
            secret: "test-secret-that-is-at-least-32-bytes!!".to_string(),
        },
        cors: CorsSettings {
            allowed_origins: Vec::new(),
        },
        realtime: RealtimeSettings {
            auth_timeout_secs: 1,
            store_timeout_secs: 1,
            max_message_size: 65536,
        },
        environment: "test".to_string(),
    }
}

fn test_router() -> axum::Router {
    let settings = test_settings();
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&settings.database.url)
        .expect("lazy pool");

    let state = AppState {
        db,
        hub: Arc::new(Hub::new()),
        settings: Arc::new(settings),
    };
    create_router(state)
}

async fn get(router: &axum::Router, uri: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let router = test_router();
    let response = get(&router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_liveness_probe_returns_ok() {
    let router = test_router();
    let response = get(&router, "/health/live").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let router = test_router();
    let response = get(&router, "/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_protected_route_rejects_missing_token() {
    let router = test_router();
    let response = get(&router, "/api/users/matches").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_rejects_garbage_token() {
    let router = test_router();
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/communities/recommendations")
                .header("Authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
