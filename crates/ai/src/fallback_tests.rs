// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::AiError;
use crate::provider::{CompletionRequest, ProviderCallError};
use crate::test_support::ScriptedProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn fast_policy() -> RetryPolicy {
    RetryPolicy { retries: 2, base_delay: Duration::from_millis(1) }
}

fn request() -> CompletionRequest {
    CompletionRequest::text("prompt")
}

#[tokio::test]
async fn first_success_wins() {
    let provider = Arc::new(ScriptedProvider::new("alpha", &["m1"], vec![Ok("hello".into())]));
    let ladder = ProviderLadder::new(vec![provider.clone()], fast_policy());

    let reply = ladder.complete(&request(), &CancellationToken::new()).await.unwrap();
    assert_eq!(reply.text, "hello");
    assert_eq!(reply.provider, "alpha");
    assert_eq!(reply.model, "m1");
    assert_eq!(reply.retries, 0);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn terminal_error_skips_to_next_model() {
    let provider = Arc::new(ScriptedProvider::new(
        "alpha",
        &["m1", "m2"],
        vec![
            Err(ProviderCallError::new("401 bad api key")),
            Ok("from m2".into()),
        ],
    ));
    let ladder = ProviderLadder::new(vec![provider.clone()], fast_policy());

    let reply = ladder.complete(&request(), &CancellationToken::new()).await.unwrap();
    assert_eq!(reply.model, "m2");
    // Terminal failure consumed exactly one call on m1.
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn retriable_error_retries_same_model() {
    let provider = Arc::new(ScriptedProvider::new(
        "alpha",
        &["m1"],
        vec![
            Err(ProviderCallError::new("429 slow down")),
            Ok("second try".into()),
        ],
    ));
    let ladder = ProviderLadder::new(vec![provider.clone()], fast_policy());

    let reply = ladder.complete(&request(), &CancellationToken::new()).await.unwrap();
    assert_eq!(reply.text, "second try");
    assert_eq!(reply.retries, 1);
    let calls = provider.calls.lock().clone();
    assert_eq!(calls, vec![("m1".to_string(), false), ("m1".to_string(), false)]);
}

#[tokio::test]
async fn falls_through_to_next_provider() {
    let alpha = Arc::new(ScriptedProvider::new(
        "alpha",
        &["m1"],
        vec![Err(ProviderCallError::new("404 model not found"))],
    ));
    let beta = Arc::new(ScriptedProvider::new("beta", &["m9"], vec![Ok("beta wins".into())]));
    let ladder = ProviderLadder::new(vec![alpha, beta], fast_policy());

    let reply = ladder.complete(&request(), &CancellationToken::new()).await.unwrap();
    assert_eq!(reply.provider, "beta");
    assert_eq!(reply.model, "m9");
}

#[tokio::test]
async fn exhaustion_enumerates_attempts() {
    let alpha = Arc::new(ScriptedProvider::new(
        "alpha",
        &["m1"],
        vec![
            Err(ProviderCallError::new("429 one")),
            Err(ProviderCallError::new("429 two")),
        ],
    ));
    let ladder = ProviderLadder::new(vec![alpha], fast_policy());

    let err = ladder.complete(&request(), &CancellationToken::new()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("All providers/models failed"), "got: {message}");
    assert!(message.contains("alpha/m1 attempt 1: 429 one"));
    assert!(message.contains("alpha/m1 attempt 2: 429 two"));
}

#[tokio::test]
async fn cancellation_short_circuits() {
    let alpha = Arc::new(ScriptedProvider::new("alpha", &["m1"], vec![Ok("never".into())]));
    let ladder = ProviderLadder::new(vec![alpha.clone()], fast_policy());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = ladder.complete(&request(), &cancel).await.unwrap_err();
    assert!(matches!(err, AiError::Cancelled));
    assert_eq!(alpha.call_count(), 0);
}

#[tokio::test]
async fn empty_ladder_is_an_error() {
    let ladder = ProviderLadder::new(vec![], fast_policy());
    let err = ladder.complete(&request(), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, AiError::NoProviders));
}

#[test]
fn summary_lists_names_and_model_counts() {
    let alpha = Arc::new(ScriptedProvider::new("alpha", &["m1", "m2"], vec![]));
    let ladder = ProviderLadder::new(vec![alpha], fast_policy());
    assert_eq!(ladder.summary(), vec![("alpha".to_string(), 2)]);
}
