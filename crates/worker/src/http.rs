// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker's `/jobs` HTTP surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use gz_core::Clock;
use gz_wire::{AnalyzeRequest, ErrorBody, HealthResponse, JobAccepted, RetryAccepted};

use crate::error::StoreError;
use crate::store::JobStore;

pub fn router<C: Clock>(store: JobStore<C>) -> Router {
    Router::new()
        .route("/jobs/health", get(health))
        .route("/jobs/analyze", post(submit::<C>))
        .route("/jobs", get(list::<C>))
        .route("/jobs/:id", get(show::<C>))
        .route("/jobs/:id/cancel", post(cancel::<C>))
        .route("/jobs/:id/retry", post(retry::<C>))
        .with_state(store)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn store_error(err: StoreError) -> Response {
    match err {
        StoreError::NotFound => error_response(StatusCode::NOT_FOUND, "job not found"),
        StoreError::NotRetryable(status) => error_response(
            StatusCode::CONFLICT,
            format!("job is not retryable from status {status}"),
        ),
        StoreError::Persistence(err) => {
            tracing::error!(error = %err, "persistence failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn submit<C: Clock>(
    State(store): State<JobStore<C>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    if request.code.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "code must not be empty");
    }
    match store.create(request.code).await {
        Ok(view) => (
            StatusCode::ACCEPTED,
            Json(JobAccepted { job_id: view.job_id, status: view.status.to_string() }),
        )
            .into_response(),
        Err(err) => store_error(err),
    }
}

async fn list<C: Clock>(State(store): State<JobStore<C>>) -> Response {
    Json(store.list()).into_response()
}

async fn show<C: Clock>(State(store): State<JobStore<C>>, Path(id): Path<String>) -> Response {
    match store.get(&id) {
        Some(view) => Json(view).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "job not found"),
    }
}

async fn cancel<C: Clock>(State(store): State<JobStore<C>>, Path(id): Path<String>) -> Response {
    match store.cancel(&id).await {
        Ok(view) => Json(view).into_response(),
        Err(err) => store_error(err),
    }
}

async fn retry<C: Clock>(State(store): State<JobStore<C>>, Path(id): Path<String>) -> Response {
    match store.retry(&id).await {
        Ok(view) => {
            let retry_of = view.retry_of.clone().unwrap_or_default();
            (
                StatusCode::ACCEPTED,
                Json(RetryAccepted {
                    job_id: view.job_id,
                    status: view.status.to_string(),
                    retry_of,
                }),
            )
                .into_response()
        }
        Err(err) => store_error(err),
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
