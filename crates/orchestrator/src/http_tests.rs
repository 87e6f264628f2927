// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::state::ChainConfig;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use gz_core::{FakeClock, Mutability};
use gz_engine::test_support::{
    profile, simple_outcome, FixedOptimizer, FixedParser, HangingOptimizer, QueueProfiler,
};
use gz_engine::{Analyzer, AnalyzerConfig, ProofRegistry};
use gz_wire::{MintReceipt, ProofPayload};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const SOURCE: &str = "contract Demo { function bump(uint256 n) external {} }";

struct FakeRegistry;

#[async_trait]
impl ProofRegistry for FakeRegistry {
    async fn mint(&self, _payload: &ProofPayload) -> Result<MintReceipt, gz_engine::ProofError> {
        Ok(MintReceipt {
            tx_hash: "0xdeadbeef".into(),
            token_id: Some("7".into()),
            registry_address: "0xregistry".into(),
            chain_id: 31_337,
        })
    }
}

fn happy_analyzer() -> Analyzer<FakeClock> {
    let baseline = profile(
        200_000,
        &[("bump", &["uint256"], Mutability::Nonpayable, Some(100_000))],
    );
    let improved = profile(
        150_000,
        &[("bump", &["uint256"], Mutability::Nonpayable, Some(80_000))],
    );
    Analyzer::new(
        FakeClock::new(),
        Arc::new(FixedParser::ok()),
        QueueProfiler::new(vec![Ok(baseline), Ok(improved)]),
        Arc::new(FixedOptimizer {
            outcome: simple_outcome(
                "contract Demo { uint256 t; function bump(uint256 n) external { t = n; } }",
            ),
        }),
        None,
        AnalyzerConfig::default(),
    )
}

fn app_with(analyzer: Analyzer<FakeClock>, with_chain: bool) -> (Router, AppState<FakeClock>) {
    let state = AppState {
        analyzer,
        chain: with_chain.then(|| ChainConfig {
            rpc_url: "http://localhost:8545".into(),
            signer_key: "0xkey".into(),
            registry_address: "0xregistry".into(),
            chain_id: 31_337,
        }),
        proof_registry: with_chain.then(|| Arc::new(FakeRegistry) as Arc<dyn ProofRegistry>),
    };
    (router(state.clone()), state)
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
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

async fn submit_and_finish(app: &Router, state: &AppState<FakeClock>) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/analyze/jobs", serde_json::json!({"code": SOURCE})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let id = body["jobId"].as_str().unwrap().to_string();

    for _ in 0..500 {
        if let Some(view) = state.analyzer.job(&id) {
            if view.status.is_terminal() {
                return id;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never finished");
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = app_with(happy_analyzer(), false);
    let response = app.oneshot(get("/api/analyze/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn submit_empty_code_is_rejected() {
    let (app, _) = app_with(happy_analyzer(), false);
    let response = app
        .oneshot(post_json("/api/analyze/jobs", serde_json::json!({"code": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn job_view_has_no_source_and_404s_when_missing() {
    let (app, state) = app_with(happy_analyzer(), false);
    let id = submit_and_finish(&app, &state).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/analyze/jobs/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // The view has no source field of its own; the submitted text only
    // appears inside the finished result's originalContract.
    assert!(body.get("source").is_none());
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"]["originalContract"], SOURCE);
    assert!(body["result"]["optimizationValidation"]["accepted"].as_bool().unwrap());

    let response = app.oneshot(get("/api/analyze/jobs/ajob-missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_is_idempotent_on_terminal_jobs() {
    let (app, state) = app_with(happy_analyzer(), false);
    let id = submit_and_finish(&app, &state).await;

    let response = app
        .clone()
        .oneshot(post_json(&format!("/api/analyze/jobs/{id}/cancel"), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn events_stream_frames_progress_then_done() {
    let (app, state) = app_with(happy_analyzer(), false);
    let id = submit_and_finish(&app, &state).await;

    let response = app
        .oneshot(get(&format!("/api/analyze/jobs/{id}/events")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .starts_with("text/event-stream"));

    let text = body_text(response).await;
    assert!(text.contains("event: progress\n"));
    assert!(text.contains("Analysis queued."));
    assert!(text.contains("event: done\n"));
    assert!(text.contains(r#"{"status":"completed"}"#));
    // Backlog precedes the terminal frame.
    let queued_at = text.find("Analysis queued.").unwrap();
    let done_at = text.find("event: done").unwrap();
    assert!(queued_at < done_at);
}

#[tokio::test]
async fn events_404_for_unknown_job() {
    let (app, _) = app_with(happy_analyzer(), false);
    let response = app
        .oneshot(get("/api/analyze/jobs/ajob-missing/events"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn proof_payload_on_accepted_job() {
    let (app, state) = app_with(happy_analyzer(), false);
    let id = submit_and_finish(&app, &state).await;

    let response = app
        .oneshot(post_json(
            &format!("/api/analyze/jobs/{id}/proof-payload"),
            serde_json::json!({"contractAddress": "0xabc", "contractName": "Demo"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // Baseline avg 100000, optimized avg 80000 → 2000 bps.
    assert_eq!(body["savingsPercentBps"], 2_000);
    assert_eq!(body["originalGas"], 100_000);
    assert_eq!(body["optimizedGas"], 80_000);
    assert_eq!(body["contractAddress"], "0xabc");
    assert!(body["originalHash"].as_str().unwrap().starts_with("0x"));
}

#[tokio::test]
async fn proof_payload_rejects_incomplete_jobs() {
    let analyzer = Analyzer::new(
        FakeClock::new(),
        Arc::new(FixedParser::ok()),
        QueueProfiler::new(vec![]),
        Arc::new(HangingOptimizer),
        None,
        AnalyzerConfig::default(),
    );
    let (app, _state) = app_with(analyzer, false);

    let response = app
        .clone()
        .oneshot(post_json("/api/analyze/jobs", serde_json::json!({"code": SOURCE})))
        .await
        .unwrap();
    let id = body_json(response).await["jobId"].as_str().unwrap().to_string();

    let response = app
        .oneshot(post_json(
            &format!("/api/analyze/jobs/{id}/proof-payload"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mint_without_chain_config_is_400() {
    let (app, state) = app_with(happy_analyzer(), false);
    let id = submit_and_finish(&app, &state).await;

    let response = app
        .oneshot(post_json(&format!("/api/analyze/jobs/{id}/mint-proof"), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("CHAIN_RPC_URL"));
}

#[tokio::test]
async fn mint_with_registry_returns_receipt() {
    let (app, state) = app_with(happy_analyzer(), true);
    let id = submit_and_finish(&app, &state).await;

    let response = app
        .oneshot(post_json(&format!("/api/analyze/jobs/{id}/mint-proof"), serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["minted"], true);
    assert_eq!(body["receipt"]["txHash"], "0xdeadbeef");
    assert_eq!(body["receipt"]["tokenId"], "7");
    assert_eq!(body["payload"]["savingsPercentBps"], 2_000);
}
