// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker job identifier and state machine.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::gas::DynamicProfile;

crate::define_id! {
    /// Unique identifier for a worker measurement job.
    pub struct WorkerJobId("wjob-");
}

/// Status of a worker job.
///
/// Legal paths: `queued → processing → (completed|failed|cancelled)` and
/// `queued → cancelled`. Terminal records are retained for retry and
/// inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl WorkerStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerStatus::Completed | WorkerStatus::Failed | WorkerStatus::Cancelled
        )
    }

    /// Whether a job may be retried from this status.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkerStatus::Failed | WorkerStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: WorkerStatus) -> bool {
        use WorkerStatus::*;
        match (self, next) {
            (Queued, Processing) | (Queued, Cancelled) => true,
            (Processing, Completed) | (Processing, Failed) | (Processing, Cancelled) => true,
            _ => false,
        }
    }
}

crate::simple_display! {
    WorkerStatus {
        Queued => "queued",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl std::str::FromStr for WorkerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(WorkerStatus::Queued),
            "processing" => Ok(WorkerStatus::Processing),
            "completed" => Ok(WorkerStatus::Completed),
            "failed" => Ok(WorkerStatus::Failed),
            "cancelled" => Ok(WorkerStatus::Cancelled),
            other => Err(format!("unknown worker status: {other}")),
        }
    }
}

/// A worker measurement job. Every state transition is upserted to the
/// relational store before it becomes caller-visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerJob {
    pub id: WorkerJobId,
    pub source: String,
    pub status: WorkerStatus,
    pub attempts: u32,
    pub cancel_requested: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DynamicProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_of: Option<WorkerJobId>,
}

impl WorkerJob {
    pub fn new(source: impl Into<String>, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id: WorkerJobId::new(),
            source: source.into(),
            status: WorkerStatus::Queued,
            attempts: 1,
            cancel_requested: false,
            created_at_ms: now,
            updated_at_ms: now,
            error: None,
            result: None,
            retry_of: None,
        }
    }

    /// Build the replacement job for a retry of `prior`.
    ///
    /// The prior record is never mutated; the new job carries an incremented
    /// attempt count and a `retry_of` back-pointer.
    pub fn retry_from(prior: &WorkerJob, clock: &impl Clock) -> Self {
        let mut job = Self::new(prior.source.clone(), clock);
        job.attempts = prior.attempts + 1;
        job.retry_of = Some(prior.id);
        job
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

crate::builder! {
    pub struct WorkerJobBuilder => WorkerJob {
        into {
            source: String = "contract Demo {}",
        }
        set {
            status: WorkerStatus = WorkerStatus::Queued,
            attempts: u32 = 1,
            cancel_requested: bool = false,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            error: String = None,
            result: DynamicProfile = None,
            retry_of: WorkerJobId = None,
        }
        computed {
            id: WorkerJobId = WorkerJobId::new(),
        }
    }
}

#[cfg(test)]
#[path = "worker_job_tests.rs"]
mod tests;
