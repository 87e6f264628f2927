// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator's `/api/analyze` HTTP surface.
//!
//! The events endpoint speaks SSE with the backlog-then-live contract:
//! every recorded event first, then live events, then a single `done`
//! event once the job is terminal.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use gz_core::{AnalysisJobId, Clock};
use gz_engine::{ProofBuilder, ProofError};
use gz_wire::{
    AnalyzeRequest, DoneEvent, ErrorBody, HealthResponse, JobAccepted, MintResponse,
    ProofPayloadRequest,
};

use crate::state::AppState;

pub fn router<C: Clock>(state: AppState<C>) -> Router {
    Router::new()
        .route("/api/analyze/health", get(health))
        .route("/api/analyze/jobs", post(submit::<C>))
        .route("/api/analyze/jobs/:id", get(show::<C>))
        .route("/api/analyze/jobs/:id/cancel", post(cancel::<C>))
        .route("/api/analyze/jobs/:id/events", get(events::<C>))
        .route("/api/analyze/jobs/:id/proof-payload", post(proof_payload::<C>))
        .route("/api/analyze/jobs/:id/mint-proof", post(mint_proof::<C>))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn submit<C: Clock>(
    State(state): State<AppState<C>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    if request.code.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "code must not be empty");
    }
    match state.analyzer.submit(&request.code) {
        Ok((view, reused)) => {
            tracing::info!(job_id = %view.job_id, reused, "analysis submitted");
            (
                StatusCode::ACCEPTED,
                Json(JobAccepted { job_id: view.job_id, status: view.status.to_string() }),
            )
                .into_response()
        }
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

async fn show<C: Clock>(State(state): State<AppState<C>>, Path(id): Path<String>) -> Response {
    match state.analyzer.job(&id) {
        Some(view) => Json(view).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "job not found"),
    }
}

async fn cancel<C: Clock>(State(state): State<AppState<C>>, Path(id): Path<String>) -> Response {
    match state.analyzer.cancel(&id) {
        Some(view) => Json(view).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "job not found"),
    }
}

async fn events<C: Clock>(State(state): State<AppState<C>>, Path(id): Path<String>) -> Response {
    let Some(mut progress) = state.analyzer.subscribe(&id) else {
        return error_response(StatusCode::NOT_FOUND, "job not found");
    };

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(64);
    tokio::spawn(async move {
        while let Some(event) = progress.recv().await {
            let terminal = event.phase.is_terminal();
            let status = event.phase.to_string();
            let Ok(data) = serde_json::to_string(&event) else {
                continue;
            };
            if tx.send(Ok(Event::default().event("progress").data(data))).await.is_err() {
                return;
            }
            if terminal {
                if let Ok(done) = serde_json::to_string(&DoneEvent { status }) {
                    let _ = tx.send(Ok(Event::default().event("done").data(done))).await;
                }
                return;
            }
        }
    });

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn proof_error(err: ProofError) -> Response {
    match err {
        ProofError::NotEligible(message) => error_response(StatusCode::BAD_REQUEST, message),
        ProofError::MissingConfig(message) => error_response(
            StatusCode::BAD_REQUEST,
            format!("missing configuration: {message}"),
        ),
        ProofError::Registry(message) => {
            tracing::error!(error = %message, "proof registry failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

async fn proof_payload<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
    Json(request): Json<ProofPayloadRequest>,
) -> Response {
    let job_id = AnalysisJobId::from_string(&id);
    let payload = state.analyzer.registry().with_job(job_id, |job| {
        ProofBuilder::build_payload(
            job,
            request.contract_address.as_deref(),
            request.contract_name.as_deref(),
        )
    });
    match payload {
        None => error_response(StatusCode::NOT_FOUND, "job not found"),
        Some(Err(err)) => proof_error(err),
        Some(Ok(payload)) => Json(payload).into_response(),
    }
}

async fn mint_proof<C: Clock>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Response {
    let Some(registry) = state.proof_registry.clone() else {
        return proof_error(ProofError::MissingConfig(
            "CHAIN_RPC_URL, BACKEND_SIGNER_PRIVATE_KEY, GAS_OPTIMIZATION_REGISTRY_ADDRESS"
                .to_string(),
        ));
    };

    let job_id = AnalysisJobId::from_string(&id);
    let payload = state
        .analyzer
        .registry()
        .with_job(job_id, |job| ProofBuilder::build_payload(job, None, None));
    let payload = match payload {
        None => return error_response(StatusCode::NOT_FOUND, "job not found"),
        Some(Err(err)) => return proof_error(err),
        Some(Ok(payload)) => payload,
    };

    match registry.mint(&payload).await {
        Ok(receipt) => {
            tracing::info!(job_id = %id, tx_hash = %receipt.tx_hash, "proof minted");
            Json(MintResponse { minted: true, payload, receipt }).into_response()
        }
        Err(err) => proof_error(err),
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
