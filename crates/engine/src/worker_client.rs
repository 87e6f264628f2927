// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote gas-measurement client: submit to the worker, poll to terminal.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use gz_core::{DynamicProfile, WorkerStatus};
use gz_wire::{AnalyzeRequest, JobAccepted, WorkerJobView};

use crate::error::WorkerClientError;

/// Measurement collaborator used by the pipeline and acceptance validator.
#[async_trait]
pub trait GasProfiler: Send + Sync {
    /// Produce the dynamic gas profile for `source`, or fail with the
    /// worker's error.
    async fn profile(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<DynamicProfile, WorkerClientError>;
}

/// Polling knobs for the worker protocol.
#[derive(Debug, Clone)]
pub struct WorkerClientConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WorkerClientConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(1), timeout: Duration::from_secs(180) }
    }
}

/// HTTP client for the worker's `/jobs` surface.
pub struct WorkerClient {
    base_url: String,
    http: reqwest::Client,
    config: WorkerClientConfig,
}

impl WorkerClient {
    pub fn new(base_url: impl Into<String>, config: WorkerClientConfig) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn submit(&self, source: &str) -> Result<String, WorkerClientError> {
        let response = self
            .http
            .post(format!("{}/jobs/analyze", self.base_url))
            .json(&AnalyzeRequest { code: source.to_string() })
            .send()
            .await
            .map_err(|e| WorkerClientError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(WorkerClientError::Http(format!(
                "submit returned {}",
                response.status()
            )));
        }
        let accepted: JobAccepted = response
            .json()
            .await
            .map_err(|e| WorkerClientError::Http(e.to_string()))?;
        Ok(accepted.job_id)
    }

    async fn fetch(&self, job_id: &str) -> Result<WorkerJobView, WorkerClientError> {
        let response = self
            .http
            .get(format!("{}/jobs/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| WorkerClientError::Http(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(WorkerClientError::JobNotFound);
        }
        if !response.status().is_success() {
            return Err(WorkerClientError::Http(format!(
                "status fetch returned {}",
                response.status()
            )));
        }
        response.json().await.map_err(|e| WorkerClientError::Http(e.to_string()))
    }

    /// Best-effort abort propagation to the worker.
    async fn cancel_remote(&self, job_id: &str) {
        let result = self
            .http
            .post(format!("{}/jobs/{}/cancel", self.base_url, job_id))
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!(job_id, error = %e, "failed to propagate cancel to worker");
        }
    }
}

#[async_trait]
impl GasProfiler for WorkerClient {
    async fn profile(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<DynamicProfile, WorkerClientError> {
        if cancel.is_cancelled() {
            return Err(WorkerClientError::Cancelled);
        }
        let job_id = self.submit(source).await?;
        tracing::debug!(job_id = %job_id, "worker job submitted");

        let deadline = tokio::time::Instant::now() + self.config.timeout;
        loop {
            if cancel.is_cancelled() {
                self.cancel_remote(&job_id).await;
                return Err(WorkerClientError::Cancelled);
            }

            let view = self.fetch(&job_id).await?;
            match view.status {
                WorkerStatus::Completed => {
                    return view.result.ok_or_else(|| {
                        WorkerClientError::WorkerFailed(
                            "worker job completed without a result".to_string(),
                        )
                    });
                }
                WorkerStatus::Failed | WorkerStatus::Cancelled => {
                    let reason = view
                        .error
                        .unwrap_or_else(|| format!("worker job {}", view.status));
                    return Err(WorkerClientError::WorkerFailed(reason));
                }
                WorkerStatus::Queued | WorkerStatus::Processing => {}
            }

            if tokio::time::Instant::now() >= deadline {
                self.cancel_remote(&job_id).await;
                return Err(WorkerClientError::Timeout(self.config.timeout.as_millis() as u64));
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }
}
