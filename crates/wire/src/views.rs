// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public job views. Conversions strip the submitted source text.

use serde::{Deserialize, Serialize};

use gz_core::{AnalysisJob, AnalysisPhase, AnalysisResult, DynamicProfile, ProgressEvent};
use gz_core::{WorkerJob, WorkerStatus};

/// Caller-visible view of an analysis job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJobView {
    pub job_id: String,
    pub status: AnalysisPhase,
    pub events: Vec<ProgressEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cancel_requested: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&AnalysisJob> for AnalysisJobView {
    fn from(job: &AnalysisJob) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.phase,
            events: job.events.clone(),
            result: job.result.clone(),
            error: job.error.clone(),
            cancel_requested: job.cancel_requested,
            created_at_ms: job.created_at_ms,
            updated_at_ms: job.updated_at_ms,
        }
    }
}

/// Caller-visible view of a worker job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerJobView {
    pub job_id: String,
    pub status: WorkerStatus,
    pub attempts: u32,
    pub cancel_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DynamicProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_of: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&WorkerJob> for WorkerJobView {
    fn from(job: &WorkerJob) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status,
            attempts: job.attempts,
            cancel_requested: job.cancel_requested,
            error: job.error.clone(),
            result: job.result.clone(),
            retry_of: job.retry_of.map(|id| id.to_string()),
            created_at_ms: job.created_at_ms,
            updated_at_ms: job.updated_at_ms,
        }
    }
}

#[cfg(test)]
#[path = "views_tests.rs"]
mod tests;
