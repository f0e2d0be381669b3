// Tests for the HTTP control API

mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{Harness, PromptAnswer};
use screen_recorder::{create_router, AppState, HintBoard};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn router(h: &Harness) -> Router {
    create_router(AppState::new(h.enablement.clone(), Arc::new(HintBoard::new())))
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    Ok((status, value))
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let h = Harness::new();

    let (status, body) = send(router(&h), "GET", "/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));

    Ok(())
}

#[tokio::test]
async fn test_capture_start_and_stop() -> Result<()> {
    let h = Harness::new();

    let (status, body) = send(
        router(&h),
        "POST",
        "/capture/start",
        Some(json!({ "record": true })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], json!(true));
    assert_eq!(body["recording"], json!("recording"));
    assert_eq!(body["session"]["tracks"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(router(&h), "GET", "/status", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], json!(true));
    assert_eq!(body["capture_supported"], json!(true));

    let (status, body) = send(router(&h), "POST", "/capture/stop", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("stopped"));
    assert_eq!(body["saved"]["kind"], json!("downloaded"));
    assert!(!h.enablement.is_enabled());

    Ok(())
}

#[tokio::test]
async fn test_cancelled_prompt_is_forbidden() -> Result<()> {
    let h = Harness::new();
    h.capture.answer_next(PromptAnswer::Cancel);

    let (status, body) = send(router(&h), "POST", "/capture/start", Some(json!({}))).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("USER_CANCELLED"));
    assert!(!h.enablement.is_enabled());

    Ok(())
}

#[tokio::test]
async fn test_recording_start_without_capture_conflicts() -> Result<()> {
    let h = Harness::new();

    let (status, body) = send(router(&h), "POST", "/recording/start", None).await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("NOT_CAPTURING"));

    Ok(())
}

#[tokio::test]
async fn test_pick_and_read_folder() -> Result<()> {
    let h = Harness::new();

    let (status, body) = send(router(&h), "GET", "/folder", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["folder"], Value::Null);

    let (status, body) = send(
        router(&h),
        "POST",
        "/folder",
        Some(json!({ "path": "/videos" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["folder"]["path"], json!("/videos"));
    assert_eq!(body["folder"]["permission"], json!("granted"));

    // Omitted path is a cancelled picker
    let (status, body) = send(router(&h), "POST", "/folder", Some(json!({}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("USER_CANCELLED"));

    let (_, body) = send(router(&h), "GET", "/folder", None).await?;
    assert_eq!(body["folder"]["path"], json!("/videos"));

    Ok(())
}
