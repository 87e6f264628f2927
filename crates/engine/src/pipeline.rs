// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three-phase analysis pipeline task.
//!
//! One task per job: static analysis → baseline measurement → AI
//! optimization with acceptance adjudication. Cancellation is checked at
//! every phase boundary and inside every collaborator; an observed cancel
//! terminates the job as `cancelled`, never `failed`.

use tokio_util::sync::CancellationToken;

use gz_ai::AiError;
use gz_core::{AnalysisJobId, AnalysisPhase, AnalysisResult, Clock};

use crate::analyzer::Analyzer;
use crate::error::{RegistryError, WorkerClientError};

pub const CANCELLED_BY_USER: &str = "Analysis cancelled by user.";

enum Abort {
    Cancelled,
    Failed(String),
}

impl From<RegistryError> for Abort {
    fn from(err: RegistryError) -> Self {
        Abort::Failed(err.to_string())
    }
}

pub(crate) async fn run<C: Clock>(
    analyzer: Analyzer<C>,
    id: AnalysisJobId,
    cancel: CancellationToken,
) {
    if let Err(abort) = drive(&analyzer, id, &cancel).await {
        let outcome = match abort {
            Abort::Cancelled => analyzer.registry.cancelled(id, CANCELLED_BY_USER),
            Abort::Failed(message) => analyzer.registry.fail(id, &message),
        };
        if let Err(err) = outcome {
            tracing::error!(job_id = %id, error = %err, "failed to finalize job");
        }
    }
}

fn check_cancel<C: Clock>(
    analyzer: &Analyzer<C>,
    id: AnalysisJobId,
    cancel: &CancellationToken,
) -> Result<(), Abort> {
    if cancel.is_cancelled() || analyzer.registry.is_cancel_requested(id) {
        return Err(Abort::Cancelled);
    }
    Ok(())
}

async fn drive<C: Clock>(
    analyzer: &Analyzer<C>,
    id: AnalysisJobId,
    cancel: &CancellationToken,
) -> Result<(), Abort> {
    let source = analyzer
        .registry
        .with_job(id, |job| job.source.clone())
        .ok_or_else(|| Abort::Failed("job record missing".to_string()))?;

    check_cancel(analyzer, id, cancel)?;
    analyzer
        .registry
        .enter_phase(id, AnalysisPhase::StaticAnalysis, "Parsing Solidity source.")?;
    let static_profile = analyzer
        .parser
        .parse(&source)
        .map_err(|_| Abort::Failed("Failed to parse Solidity code.".to_string()))?;

    check_cancel(analyzer, id, cancel)?;
    analyzer.registry.enter_phase(
        id,
        AnalysisPhase::DynamicAnalysis,
        "Measuring baseline gas profile.",
    )?;
    let baseline = analyzer.profiler.profile(&source, cancel).await.map_err(|e| match e {
        WorkerClientError::Cancelled => Abort::Cancelled,
        other => Abort::Failed(other.to_string()),
    })?;

    check_cancel(analyzer, id, cancel)?;
    analyzer
        .registry
        .enter_phase(id, AnalysisPhase::AiOptimization, "Running AI optimization.")?;
    let registry = analyzer.registry.clone();
    let sink = move |message: &str| registry.emit(id, message);
    let mut ai = analyzer
        .optimizer
        .optimize(&source, &baseline.gas, &sink, cancel)
        .await
        .map_err(|e| match e {
            AiError::Cancelled => Abort::Cancelled,
            other => Abort::Failed(other.to_string()),
        })?;

    check_cancel(analyzer, id, cancel)?;
    analyzer.registry.emit(id, "Validating optimization candidate.");
    let acceptance = analyzer
        .validator
        .validate(&ai.optimized_source, &baseline, cancel)
        .await
        .map_err(|e| match e {
            WorkerClientError::Cancelled => Abort::Cancelled,
            other => Abort::Failed(other.to_string()),
        })?;

    let accepted = acceptance.verdict.is_accepted();
    if accepted {
        // The corrective retry may have revised the candidate on the way in.
        ai.optimized_source = acceptance.candidate.clone();
    } else {
        ai.meta
            .warnings
            .push(format!("Optimization rejected: {}", acceptance.verdict.reason()));
        ai.optimized_source = source.clone();
    }

    let result = AnalysisResult {
        original_contract: source,
        static_profile,
        baseline,
        optimized: if accepted { acceptance.profile } else { None },
        ai,
        optimization_validation: acceptance.verdict,
        attempts: acceptance.attempts,
    };
    analyzer.registry.complete(id, result)?;
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
