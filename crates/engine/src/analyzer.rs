// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The analysis service: registry plus collaborators, one pipeline task per
//! fresh job.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gz_ai::{AiError, AiOptimizer, CandidateReviser, ProgressFn};
use gz_core::{AnalysisJobId, Clock, GasProfile, OptimizerOutcome, ProgressEvent};
use gz_wire::AnalysisJobView;

use crate::acceptance::{AcceptanceConfig, AcceptanceValidator};
use crate::error::RegistryError;
use crate::parser::SourceParser;
use crate::pipeline;
use crate::registry::JobRegistry;
use crate::worker_client::GasProfiler;

/// Optimization collaborator seam (implemented by [`AiOptimizer`], mocked in
/// tests).
#[async_trait]
pub trait ContractOptimizer: Send + Sync {
    async fn optimize(
        &self,
        source: &str,
        baseline: &GasProfile,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<OptimizerOutcome, AiError>;
}

#[async_trait]
impl ContractOptimizer for AiOptimizer {
    async fn optimize(
        &self,
        source: &str,
        baseline: &GasProfile,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<OptimizerOutcome, AiError> {
        AiOptimizer::optimize(self, source, baseline, progress, cancel).await
    }
}

/// Orchestrator-side knobs.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub dedupe_ttl: Duration,
    pub acceptance: AcceptanceConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { dedupe_ttl: Duration::from_secs(600), acceptance: AcceptanceConfig::default() }
    }
}

/// The orchestrator's analysis service.
pub struct Analyzer<C: Clock> {
    pub(crate) registry: Arc<JobRegistry<C>>,
    pub(crate) parser: Arc<dyn SourceParser>,
    pub(crate) profiler: Arc<dyn GasProfiler>,
    pub(crate) optimizer: Arc<dyn ContractOptimizer>,
    pub(crate) validator: Arc<AcceptanceValidator>,
}

impl<C: Clock> Clone for Analyzer<C> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            parser: self.parser.clone(),
            profiler: self.profiler.clone(),
            optimizer: self.optimizer.clone(),
            validator: self.validator.clone(),
        }
    }
}

impl<C: Clock> Analyzer<C> {
    pub fn new(
        clock: C,
        parser: Arc<dyn SourceParser>,
        profiler: Arc<dyn GasProfiler>,
        optimizer: Arc<dyn ContractOptimizer>,
        reviser: Option<Arc<dyn CandidateReviser>>,
        config: AnalyzerConfig,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new(clock, config.dedupe_ttl));
        let validator = Arc::new(AcceptanceValidator::new(
            profiler.clone(),
            reviser,
            config.acceptance,
        ));
        Self { registry, parser, profiler, optimizer, validator }
    }

    pub fn registry(&self) -> &Arc<JobRegistry<C>> {
        &self.registry
    }

    /// Create or reuse a job for `source` and, when fresh, spawn its
    /// pipeline task.
    pub fn submit(&self, source: &str) -> Result<(AnalysisJobView, bool), RegistryError> {
        let outcome = self.registry.create_or_reuse(source);
        if let Some(cancel) = outcome.cancel {
            let analyzer = self.clone();
            let id = outcome.id;
            tokio::spawn(async move {
                pipeline::run(analyzer, id, cancel).await;
            });
        }
        let view = self.registry.view(outcome.id).ok_or(RegistryError::NotFound)?;
        Ok((view, outcome.reused))
    }

    pub fn job(&self, id: &str) -> Option<AnalysisJobView> {
        self.registry.view(AnalysisJobId::from_string(id))
    }

    pub fn cancel(&self, id: &str) -> Option<AnalysisJobView> {
        self.registry.cancel(AnalysisJobId::from_string(id))
    }

    pub fn subscribe(&self, id: &str) -> Option<mpsc::Receiver<ProgressEvent>> {
        self.registry.subscribe(AnalysisJobId::from_string(id))
    }
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
