// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The optimizer cycle loop: draft → schema repair → generate → verify.
//!
//! Each cycle must clear all four stages; any stage failure becomes feedback
//! for the next cycle. When every cycle fails the loop degrades to a
//! fallback response carrying the original source and the failure reasons
//! as warnings — AI failure is never a pipeline failure.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use gz_core::{GasProfile, OptimizerMeta, OptimizerOutcome};

use crate::draft::{parse_draft, OptimizationDraft};
use crate::error::AiError;
use crate::fallback::ProviderLadder;
use crate::generate::{post_process_candidate, sanity_check};
use crate::prompts;
use crate::provider::CompletionRequest;
use crate::verify::{parse_verdict, static_pre_check};

/// Knobs for the cycle loop.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub max_cycles: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { max_cycles: 2 }
    }
}

/// User-facing progress callback. Providers-level retries are not surfaced.
pub type ProgressFn<'a> = &'a (dyn Fn(&str) + Send + Sync);

enum CycleFailure {
    Cancelled,
    Soft(String),
}

impl From<AiError> for CycleFailure {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Cancelled => CycleFailure::Cancelled,
            other => CycleFailure::Soft(other.to_string()),
        }
    }
}

/// Drives up to `max_cycles` optimization cycles over the provider ladder.
pub struct AiOptimizer {
    ladder: Arc<ProviderLadder>,
    config: OptimizerConfig,
}

impl AiOptimizer {
    pub fn new(ladder: Arc<ProviderLadder>, config: OptimizerConfig) -> Self {
        Self { ladder, config }
    }

    /// Run the loop. Errors only on cancellation; every other failure mode
    /// degrades to the fallback outcome.
    pub async fn optimize(
        &self,
        source: &str,
        baseline: &GasProfile,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<OptimizerOutcome, AiError> {
        let mut meta = OptimizerMeta::default();
        let mut feedback: Option<String> = None;

        for cycle in 0..self.config.max_cycles.max(1) {
            if cancel.is_cancelled() {
                return Err(AiError::Cancelled);
            }

            match self
                .run_cycle(source, baseline, feedback.as_deref(), &mut meta, progress, cancel)
                .await
            {
                Ok(outcome) => return Ok(outcome),
                Err(CycleFailure::Cancelled) => return Err(AiError::Cancelled),
                Err(CycleFailure::Soft(reason)) => {
                    tracing::info!(cycle = cycle + 1, reason = %reason, "optimizer cycle failed");
                    meta.warnings.push(format!("cycle {} failed: {reason}", cycle + 1));
                    feedback = Some(reason);
                }
            }
        }

        let reason = feedback.unwrap_or_else(|| "no cycle produced output".to_string());
        Ok(fallback_outcome(source, reason, meta))
    }

    async fn run_cycle(
        &self,
        source: &str,
        baseline: &GasProfile,
        feedback: Option<&str>,
        meta: &mut OptimizerMeta,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<OptimizerOutcome, CycleFailure> {
        // Stage 1: draft.
        progress("Calling AI model…");
        let draft_prompt = prompts::draft_prompt(source, baseline, feedback);
        let reply = self
            .ladder
            .complete(&CompletionRequest::json(&draft_prompt), cancel)
            .await?;
        meta.provider = Some(reply.provider);
        meta.model = Some(reply.model);
        meta.retries += reply.retries;

        // Stage 2: parse and, if needed, one schema-repair round.
        progress("Validating JSON…");
        let draft = match parse_draft(&reply.text) {
            Ok(draft) => draft,
            Err(errors) => {
                progress("Calling AI to repair…");
                meta.schema_repair_attempts += 1;
                let repaired = self
                    .ladder
                    .complete(
                        &CompletionRequest::json(prompts::repair_prompt(
                            &draft_prompt,
                            &reply.text,
                            &errors,
                        )),
                        cancel,
                    )
                    .await?;
                meta.retries += repaired.retries;
                parse_draft(&repaired.text).map_err(|errors| {
                    CycleFailure::Soft(format!("draft schema invalid: {}", errors.join("; ")))
                })?
            }
        };

        // Stage 3: generate the full candidate source.
        progress("Applying optimization edits…");
        let generated = self
            .ladder
            .complete(
                &CompletionRequest::text(prompts::generator_prompt(source, &draft.edits)),
                cancel,
            )
            .await?;
        meta.retries += generated.retries;
        let candidate = post_process_candidate(&generated.text);
        sanity_check(&candidate)
            .map_err(|reason| CycleFailure::Soft(format!("candidate rejected: {reason}")))?;

        // Stage 4: verify (static pre-check, then the AI verifier).
        static_pre_check(&candidate).map_err(|anti_pattern| {
            CycleFailure::Soft(format!("candidate matches anti-pattern: {anti_pattern}"))
        })?;

        progress("Verifying optimization…");
        let verdict_reply = self
            .ladder
            .complete(
                &CompletionRequest::json(prompts::verifier_prompt(
                    source, &candidate, &draft.edits, baseline,
                )),
                cancel,
            )
            .await?;
        meta.retries += verdict_reply.retries;
        let verdict = parse_verdict(&verdict_reply.text).map_err(|errors| {
            CycleFailure::Soft(format!("verifier verdict invalid: {}", errors.join("; ")))
        })?;
        let approved = verdict.approved;
        let summary = verdict.summary.clone();
        meta.verifier = Some(verdict);

        if !approved {
            return Err(CycleFailure::Soft(format!("verifier rejected: {summary}")));
        }

        Ok(build_outcome(draft, candidate, meta.clone()))
    }
}

fn build_outcome(
    draft: OptimizationDraft,
    candidate: String,
    meta: OptimizerMeta,
) -> OptimizerOutcome {
    OptimizerOutcome {
        optimizations: draft.optimizations,
        edits: draft.edits,
        optimized_source: candidate,
        total_estimated_saving: draft.total_estimated_saving,
        meta,
    }
}

fn fallback_outcome(source: &str, reason: String, meta: OptimizerMeta) -> OptimizerOutcome {
    OptimizerOutcome {
        optimizations: Vec::new(),
        edits: Vec::new(),
        optimized_source: source.to_string(),
        total_estimated_saving: format!("Unavailable (AI failed: {reason})"),
        meta,
    }
}

#[cfg(test)]
#[path = "optimizer_tests.rs"]
mod tests;
