// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::persistence::MemoryPersistence;
use axum::body::Body;
use axum::http::{header, Request};
use gz_core::FakeClock;
use gz_wire::WorkerJobView;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, JobStore<FakeClock>) {
    let persistence = Arc::new(MemoryPersistence::new());
    let (store, _rx) = JobStore::new(persistence, FakeClock::new());
    (router(store.clone()), store)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = app();
    let response = app.oneshot(get("/jobs/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn submit_accepts_and_returns_job_id() {
    let (app, store) = app();
    let response = app
        .oneshot(post_json("/jobs/analyze", serde_json::json!({"code": "contract A {}"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "queued");
    let job_id = body["jobId"].as_str().unwrap();
    assert!(job_id.starts_with("wjob-"));
    assert!(store.get(job_id).is_some());
}

#[tokio::test]
async fn submit_rejects_empty_code() {
    let (app, _) = app();
    let response = app
        .oneshot(post_json("/jobs/analyze", serde_json::json!({"code": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn show_returns_view_and_404_for_missing() {
    let (app, store) = app();
    let view = store.create("contract A {}").await.unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/jobs/{}", view.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: WorkerJobView = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(fetched.job_id, view.job_id);

    let response = app.oneshot(get("/jobs/wjob-missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_all_jobs() {
    let (app, store) = app();
    store.create("contract A {}").await.unwrap();
    store.create("contract B {}").await.unwrap();

    let response = app.oneshot(get("/jobs")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cancel_and_retry_flow() {
    let (app, store) = app();
    let view = store.create("contract A {}").await.unwrap();

    // Retry before terminal: conflict.
    let response = app
        .clone()
        .oneshot(post(&format!("/jobs/{}/retry", view.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Cancel the queued job.
    let response = app
        .clone()
        .oneshot(post(&format!("/jobs/{}/cancel", view.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "cancelled");

    // Retry now succeeds with a new id and back-pointer.
    let response = app
        .clone()
        .oneshot(post(&format!("/jobs/{}/retry", view.job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["retryOf"], view.job_id);
    assert_ne!(body["jobId"], view.job_id);
    assert_eq!(body["status"], "queued");

    // Cancel of a missing job 404s.
    let response = app.oneshot(post("/jobs/wjob-missing/cancel")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
