//! Integration tests for handlers whose JSON body may be omitted

use api::extract::OptionalJson;
use api::services::habit_service::CompleteHabitInput;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    routing::post,
    Router,
};
use tower::ServiceExt;

async fn complete(OptionalJson(input): OptionalJson<CompleteHabitInput>) -> String {
    format!("count={}", input.count.unwrap_or(1))
}

fn app() -> Router {
    Router::new().route("/complete", post(complete))
}

/// Sends a POST and returns the status and body text.
async fn send(body: Option<&'static str>) -> (StatusCode, String) {
    let request = match body {
        Some(json) => Request::post("/complete")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json))
            .unwrap(),
        None => Request::post("/complete").body(Body::empty()).unwrap(),
    };
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_missing_body_uses_defaults() {
    let (status, body) = send(None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "count=1");
}

#[tokio::test]
async fn test_valid_body_is_used() {
    let (status, body) = send(Some(r#"{"count": 3}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "count=3");
}

#[tokio::test]
async fn test_negative_count_is_rejected() {
    let (status, body) = send(Some(r#"{"count": -5}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("\"error\""));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (status, _) = send(Some("{\"count\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
