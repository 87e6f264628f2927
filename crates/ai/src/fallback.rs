// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider fallback ladder: providers → models → retries with backoff.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::AiError;
use crate::provider::{CompletionRequest, TextProvider};

/// Retry knobs for a single model before falling through to the next.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Tries per model (`for retry in 0..retries`).
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 2, base_delay: Duration::from_millis(600) }
    }
}

impl RetryPolicy {
    /// Capped exponential backoff: `base * 2^retry` plus up to 150ms jitter.
    fn delay(&self, retry: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << retry.min(8));
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..150));
        exp + jitter
    }
}

/// A successful completion with its provenance.
#[derive(Debug, Clone)]
pub struct LadderReply {
    pub text: String,
    pub provider: String,
    pub model: String,
    /// Retried attempts consumed on the way to this reply.
    pub retries: u32,
}

/// Ordered providers, each with ordered models.
///
/// The call plan is `for provider { for model { for retry } }`: transient
/// failures retry with backoff, terminal failures skip straight to the next
/// model. Exhaustion raises [`AiError::AllProvidersFailed`] enumerating
/// every attempt.
pub struct ProviderLadder {
    providers: Vec<Arc<dyn TextProvider>>,
    policy: RetryPolicy,
}

impl ProviderLadder {
    pub fn new(providers: Vec<Arc<dyn TextProvider>>, policy: RetryPolicy) -> Self {
        Self { providers, policy }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Names and model counts, for startup logging.
    pub fn summary(&self) -> Vec<(String, usize)> {
        self.providers
            .iter()
            .map(|p| (p.name().to_string(), p.models().len()))
            .collect()
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<LadderReply, AiError> {
        if self.providers.is_empty() {
            return Err(AiError::NoProviders);
        }

        let tries_per_model = self.policy.retries.max(1);
        let mut attempts: Vec<String> = Vec::new();
        let mut retries_used = 0u32;

        for provider in &self.providers {
            for model in provider.models() {
                for retry in 0..tries_per_model {
                    if cancel.is_cancelled() {
                        return Err(AiError::Cancelled);
                    }

                    match provider.complete(model, request).await {
                        Ok(text) => {
                            return Ok(LadderReply {
                                text,
                                provider: provider.name().to_string(),
                                model: model.clone(),
                                retries: retries_used,
                            });
                        }
                        Err(err) => {
                            tracing::debug!(
                                provider = provider.name(),
                                model = %model,
                                attempt = retry + 1,
                                error = %err,
                                retriable = err.is_retriable(),
                                "provider call failed"
                            );
                            attempts.push(format!(
                                "{}/{} attempt {}: {}",
                                provider.name(),
                                model,
                                retry + 1,
                                err.message
                            ));
                            if !err.is_retriable() {
                                break;
                            }
                            retries_used += 1;
                            if retry + 1 < tries_per_model {
                                let delay = self.policy.delay(retry);
                                tokio::select! {
                                    _ = tokio::time::sleep(delay) => {}
                                    _ = cancel.cancelled() => return Err(AiError::Cancelled),
                                }
                            }
                        }
                    }
                }
            }
        }

        Err(AiError::AllProvidersFailed { attempts: attempts.join("; ") })
    }
}

#[cfg(test)]
#[path = "fallback_tests.rs"]
mod tests;
