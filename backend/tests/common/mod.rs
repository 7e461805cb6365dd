/// Shared helpers for driving the router in-process
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use gaadi_backend::{
    api::server::{router, AppState},
    db::Database,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

/// Fresh in-memory SQLite database with the users table in place.
pub async fn create_test_database() -> Database {
    Database::connect_sqlite("sqlite::memory:").await.unwrap()
}

pub fn create_test_app(db: Database) -> Router {
    router(Arc::new(AppState::new(db)))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}
