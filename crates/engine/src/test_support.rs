// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock collaborators and profile fixtures for engine tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use gz_ai::{AiError, CandidateReviser, ProgressFn};
use gz_core::abi::{canonical_signature, AbiEntry, AbiParam};
use gz_core::{
    Abi, DynamicProfile, FunctionGasEntry, GasProfile, Mutability, OptimizerMeta,
    OptimizerOutcome, StaticProfile,
};

use crate::analyzer::ContractOptimizer;
use crate::error::WorkerClientError;
use crate::parser::{ParseError, SourceParser};
use crate::worker_client::GasProfiler;

pub fn abi_fn(name: &str, input_types: &[&str], mutability: Mutability) -> AbiEntry {
    AbiEntry {
        kind: "function".into(),
        name: Some(name.into()),
        inputs: input_types.iter().map(|t| AbiParam::new(*t)).collect(),
        state_mutability: Some(mutability),
    }
}

/// Build a dynamic profile whose ABI and gas map agree.
///
/// Each tuple is `(name, input types, mutability, measured gas)`; `None`
/// gas becomes an unmeasured entry.
pub fn profile(deploy: u64, fns: &[(&str, &[&str], Mutability, Option<u64>)]) -> DynamicProfile {
    let mut abi_entries = Vec::new();
    let mut functions = std::collections::BTreeMap::new();
    for (name, inputs, mutability, gas) in fns {
        let entry = abi_fn(name, inputs, *mutability);
        let signature = canonical_signature(&entry);
        abi_entries.push(entry);
        functions.insert(
            signature,
            match gas {
                Some(gas) => FunctionGasEntry::Measured { gas_used: *gas, mutability: *mutability },
                None => FunctionGasEntry::Unmeasured {
                    reason: "estimation reverted".into(),
                    mutability: *mutability,
                },
            },
        );
    }
    DynamicProfile {
        gas: GasProfile { deployment_gas: deploy, functions },
        abi: Abi(abi_entries),
        bytecode: "0x60806040".into(),
        contract_name: "Demo".into(),
    }
}

/// A completed-and-accepted analysis result.
pub fn result_fixture() -> gz_core::AnalysisResult {
    let baseline = profile(
        100_000,
        &[("bump", &["uint256"], Mutability::Nonpayable, Some(100_000))],
    );
    let optimized = profile(
        90_000,
        &[("bump", &["uint256"], Mutability::Nonpayable, Some(80_000))],
    );
    gz_core::AnalysisResult {
        original_contract: "contract Demo { function bump(uint256 n) external {} }".into(),
        static_profile: StaticProfile { contract_name: "Demo".into(), functions: Vec::new() },
        baseline,
        optimized: Some(optimized),
        ai: simple_outcome("contract Demo { uint256 t; function bump(uint256 n) external { t = n; } }"),
        optimization_validation: gz_core::AcceptanceVerdict::Accepted {
            reason: "Candidate accepted.".into(),
            checks: gz_core::AcceptanceChecks {
                compiled: true,
                abi_compatible: true,
                deployment_gas_regression_pct: -10.0,
                average_mutable_function_regression_pct: -20.0,
                improved: true,
            },
        },
        attempts: 1,
    }
}

/// Parser that always succeeds (or always fails when `profile` is `None`).
pub struct FixedParser {
    pub profile: Option<StaticProfile>,
}

impl FixedParser {
    pub fn ok() -> Self {
        Self {
            profile: Some(StaticProfile { contract_name: "Demo".into(), functions: Vec::new() }),
        }
    }

    pub fn failing() -> Self {
        Self { profile: None }
    }
}

impl SourceParser for FixedParser {
    fn parse(&self, _source: &str) -> Result<StaticProfile, ParseError> {
        self.profile.clone().ok_or_else(|| ParseError("scripted parse failure".into()))
    }
}

/// Profiler replaying a reply queue; respects cancellation.
pub struct QueueProfiler {
    replies: Mutex<VecDeque<Result<DynamicProfile, WorkerClientError>>>,
    pub calls: AtomicU32,
}

impl QueueProfiler {
    pub fn new(replies: Vec<Result<DynamicProfile, WorkerClientError>>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), calls: AtomicU32::new(0) })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GasProfiler for QueueProfiler {
    async fn profile(
        &self,
        _source: &str,
        cancel: &CancellationToken,
    ) -> Result<DynamicProfile, WorkerClientError> {
        if cancel.is_cancelled() {
            return Err(WorkerClientError::Cancelled);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .pop_front()
            .unwrap_or(Err(WorkerClientError::WorkerFailed("profiler script exhausted".into())))
    }
}

/// Profiler that parks until cancellation (models a long-running worker).
pub struct HangingProfiler;

#[async_trait]
impl GasProfiler for HangingProfiler {
    async fn profile(
        &self,
        _source: &str,
        cancel: &CancellationToken,
    ) -> Result<DynamicProfile, WorkerClientError> {
        cancel.cancelled().await;
        Err(WorkerClientError::Cancelled)
    }
}

pub fn simple_outcome(optimized_source: &str) -> OptimizerOutcome {
    OptimizerOutcome {
        optimizations: Vec::new(),
        edits: Vec::new(),
        optimized_source: optimized_source.to_string(),
        total_estimated_saving: "~500 gas".into(),
        meta: OptimizerMeta::default(),
    }
}

/// Optimizer returning a fixed outcome immediately.
pub struct FixedOptimizer {
    pub outcome: OptimizerOutcome,
}

#[async_trait]
impl ContractOptimizer for FixedOptimizer {
    async fn optimize(
        &self,
        _source: &str,
        _baseline: &GasProfile,
        progress: ProgressFn<'_>,
        _cancel: &CancellationToken,
    ) -> Result<OptimizerOutcome, AiError> {
        progress("Calling AI model…");
        Ok(self.outcome.clone())
    }
}

/// Optimizer that parks until cancellation (models a slow AI call).
pub struct HangingOptimizer;

#[async_trait]
impl ContractOptimizer for HangingOptimizer {
    async fn optimize(
        &self,
        _source: &str,
        _baseline: &GasProfile,
        progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<OptimizerOutcome, AiError> {
        progress("Calling AI model…");
        cancel.cancelled().await;
        Err(AiError::Cancelled)
    }
}

/// Reviser returning a fixed revision and counting calls.
pub struct FixedReviser {
    pub revised: String,
    pub calls: AtomicU32,
}

impl FixedReviser {
    pub fn new(revised: &str) -> Arc<Self> {
        Arc::new(Self { revised: revised.to_string(), calls: AtomicU32::new(0) })
    }
}

#[async_trait]
impl CandidateReviser for FixedReviser {
    async fn revise(
        &self,
        _source: &str,
        _error_kind: &str,
        _hint: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.revised.clone())
    }
}
