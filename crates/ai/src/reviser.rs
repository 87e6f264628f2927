// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot corrective revision of a candidate that failed to compile.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::AiError;
use crate::fallback::ProviderLadder;
use crate::generate::{post_process_candidate, sanity_check};
use crate::prompts;
use crate::provider::CompletionRequest;

/// Collaborator used by acceptance validation for its single AI corrective
/// retry: feed the compile error kind plus a canned hint back to the model.
#[async_trait]
pub trait CandidateReviser: Send + Sync {
    async fn revise(
        &self,
        source: &str,
        error_kind: &str,
        hint: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AiError>;
}

/// Reviser backed by the provider ladder.
pub struct LadderReviser {
    ladder: Arc<ProviderLadder>,
}

impl LadderReviser {
    pub fn new(ladder: Arc<ProviderLadder>) -> Self {
        Self { ladder }
    }
}

#[async_trait]
impl CandidateReviser for LadderReviser {
    async fn revise(
        &self,
        source: &str,
        error_kind: &str,
        hint: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AiError> {
        let reply = self
            .ladder
            .complete(
                &CompletionRequest::text(prompts::corrective_prompt(source, error_kind, hint)),
                cancel,
            )
            .await?;
        let revised = post_process_candidate(&reply.text);
        if sanity_check(&revised).is_err() {
            // Revision failed sanity: return the original unchanged.
            return Ok(source.to_string());
        }
        Ok(revised)
    }
}
