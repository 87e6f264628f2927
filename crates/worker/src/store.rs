// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker job store: lifecycle, serialized processing, durable transitions.
//!
//! Exactly one subprocess runs at a time per host: jobs queue into a single
//! consumer task. Every status transition is upserted (through a write gate
//! that serializes persistence) before it becomes caller-visible.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gz_core::{Clock, WorkerJob, WorkerJobId, WorkerStatus};
use gz_wire::WorkerJobView;

use crate::error::{RunnerError, StoreError};
use crate::persistence::JobPersistence;
use crate::runner::SubprocessRunner;

pub const RESTART_ORPHAN_ERROR: &str = "Worker restarted during processing.";
pub const CANCELLED_ERROR: &str = "Job cancelled by request.";

struct StoreInner<C: Clock> {
    jobs: Mutex<HashMap<WorkerJobId, WorkerJob>>,
    tokens: Mutex<HashMap<WorkerJobId, CancellationToken>>,
    persistence: Arc<dyn JobPersistence>,
    write_gate: tokio::sync::Mutex<()>,
    queue_tx: mpsc::UnboundedSender<WorkerJobId>,
    clock: C,
}

/// Handle to the worker's job store. Cheap to clone.
pub struct JobStore<C: Clock> {
    inner: Arc<StoreInner<C>>,
}

impl<C: Clock> Clone for JobStore<C> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<C: Clock> JobStore<C> {
    /// Build the store plus the processing queue receiver to hand to
    /// [`JobStore::run_processor`].
    pub fn new(
        persistence: Arc<dyn JobPersistence>,
        clock: C,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerJobId>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let store = Self {
            inner: Arc::new(StoreInner {
                jobs: Mutex::new(HashMap::new()),
                tokens: Mutex::new(HashMap::new()),
                persistence,
                write_gate: tokio::sync::Mutex::new(()),
                queue_tx,
                clock,
            }),
        };
        (store, queue_rx)
    }

    /// Load persisted jobs into memory. Records left `processing` by a
    /// previous process are orphans and become `failed` — no ghost
    /// `processing` state is observable past a restart.
    pub async fn recover(&self) -> Result<(), StoreError> {
        let loaded = self.inner.persistence.load_all().await?;
        let mut orphans = Vec::new();
        {
            let mut jobs = self.inner.jobs.lock();
            for mut job in loaded {
                if job.status == WorkerStatus::Processing {
                    job.status = WorkerStatus::Failed;
                    job.error = Some(RESTART_ORPHAN_ERROR.to_string());
                    job.updated_at_ms = self.inner.clock.epoch_ms().max(job.updated_at_ms);
                    orphans.push(job.clone());
                }
                jobs.insert(job.id, job);
            }
        }
        for orphan in &orphans {
            tracing::warn!(job_id = %orphan.id, "orphaned processing job marked failed");
            self.persist(orphan.clone()).await?;
        }
        Ok(())
    }

    /// Insert a queued job, persist it, and schedule processing.
    pub async fn create(&self, source: impl Into<String>) -> Result<WorkerJobView, StoreError> {
        let job = WorkerJob::new(source, &self.inner.clock);
        let id = job.id;
        let view = WorkerJobView::from(&job);

        self.inner.jobs.lock().insert(id, job.clone());
        self.inner.tokens.lock().insert(id, CancellationToken::new());
        self.persist(job).await?;

        // Receiver only drops on shutdown; a failed send just means the job
        // stays queued until restart recovery.
        let _ = self.inner.queue_tx.send(id);
        tracing::info!(job_id = %id, "worker job created");
        Ok(view)
    }

    pub fn get(&self, id: &str) -> Option<WorkerJobView> {
        self.inner.jobs.lock().get(id).map(WorkerJobView::from)
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<WorkerJobView> {
        let jobs = self.inner.jobs.lock();
        let mut views: Vec<WorkerJobView> = jobs.values().map(WorkerJobView::from).collect();
        views.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        views
    }

    /// Cooperative cancel. Queued jobs go terminal directly; processing jobs
    /// get their subprocess abort signal. No-op on terminal jobs.
    pub async fn cancel(&self, id: &str) -> Result<WorkerJobView, StoreError> {
        let (job, token) = {
            let mut jobs = self.inner.jobs.lock();
            let job = jobs.get_mut(id).ok_or(StoreError::NotFound)?;
            if job.is_terminal() {
                return Ok(WorkerJobView::from(&*job));
            }
            job.cancel_requested = true;
            job.updated_at_ms = self.inner.clock.epoch_ms().max(job.updated_at_ms);
            if job.status == WorkerStatus::Queued {
                job.status = WorkerStatus::Cancelled;
                job.error = Some(CANCELLED_ERROR.to_string());
            }
            let token = if job.status == WorkerStatus::Processing {
                self.inner.tokens.lock().get(id).cloned()
            } else {
                None
            };
            (job.clone(), token)
        };

        if let Some(token) = token {
            token.cancel();
        }
        tracing::info!(job_id = %job.id, status = %job.status, "worker job cancel requested");
        let view = WorkerJobView::from(&job);
        self.persist(job).await?;
        Ok(view)
    }

    /// Retry a failed/cancelled job: a NEW record with `attempts + 1` and a
    /// `retry_of` pointer. The prior record is never mutated.
    pub async fn retry(&self, id: &str) -> Result<WorkerJobView, StoreError> {
        let retried = {
            let jobs = self.inner.jobs.lock();
            let prior = jobs.get(id).ok_or(StoreError::NotFound)?;
            if !prior.status.is_retryable() {
                return Err(StoreError::NotRetryable(prior.status));
            }
            WorkerJob::retry_from(prior, &self.inner.clock)
        };

        let new_id = retried.id;
        let view = WorkerJobView::from(&retried);
        self.inner.jobs.lock().insert(new_id, retried.clone());
        self.inner.tokens.lock().insert(new_id, CancellationToken::new());
        self.persist(retried).await?;
        let _ = self.inner.queue_tx.send(new_id);
        tracing::info!(job_id = %new_id, retry_of = id, "worker job retried");
        Ok(view)
    }

    /// Fire the abort signal of every non-terminal job (shutdown path).
    pub fn abort_all(&self) {
        let jobs = self.inner.jobs.lock();
        let tokens = self.inner.tokens.lock();
        for job in jobs.values().filter(|j| !j.is_terminal()) {
            if let Some(token) = tokens.get(&job.id) {
                token.cancel();
            }
        }
    }

    /// Serial job consumer: exactly one subprocess in flight per host.
    pub async fn run_processor(
        self,
        mut queue_rx: mpsc::UnboundedReceiver<WorkerJobId>,
        runner: Arc<SubprocessRunner>,
        shutdown: CancellationToken,
    ) {
        loop {
            let id = tokio::select! {
                _ = shutdown.cancelled() => break,
                id = queue_rx.recv() => match id {
                    Some(id) => id,
                    None => break,
                },
            };
            self.process_one(id, &runner).await;
        }
        tracing::info!("worker processor stopped");
    }

    async fn process_one(&self, id: WorkerJobId, runner: &SubprocessRunner) {
        let Some((source, token)) = self.begin_processing(id).await else {
            return;
        };

        let outcome = runner.measure(&id, &source, &token).await;
        self.finish_processing(id, &token, outcome).await;
    }

    /// Transition to `processing` (persisted); `None` when the job was
    /// cancelled while queued or is otherwise gone.
    async fn begin_processing(&self, id: WorkerJobId) -> Option<(String, CancellationToken)> {
        let job = {
            let mut jobs = self.inner.jobs.lock();
            let job = jobs.get_mut(&id)?;
            if job.status != WorkerStatus::Queued || job.cancel_requested {
                return None;
            }
            job.status = WorkerStatus::Processing;
            job.updated_at_ms = self.inner.clock.epoch_ms().max(job.updated_at_ms);
            job.clone()
        };
        let token = self.inner.tokens.lock().get(&id).cloned().unwrap_or_default();
        let source = job.source.clone();
        if let Err(err) = self.persist(job).await {
            tracing::error!(job_id = %id, error = %err, "failed to persist processing transition");
        }
        Some((source, token))
    }

    async fn finish_processing(
        &self,
        id: WorkerJobId,
        token: &CancellationToken,
        outcome: Result<gz_core::DynamicProfile, RunnerError>,
    ) {
        let job = {
            let mut jobs = self.inner.jobs.lock();
            let Some(job) = jobs.get_mut(&id) else {
                return;
            };
            let cancelled = job.cancel_requested || token.is_cancelled();
            match outcome {
                Ok(profile) if !cancelled => {
                    job.status = WorkerStatus::Completed;
                    job.result = Some(profile);
                    job.error = None;
                }
                Ok(_) | Err(RunnerError::Aborted) => {
                    job.status = WorkerStatus::Cancelled;
                    job.error = Some(CANCELLED_ERROR.to_string());
                }
                Err(err) if cancelled => {
                    tracing::debug!(job_id = %id, error = %err, "error after cancel; reporting cancelled");
                    job.status = WorkerStatus::Cancelled;
                    job.error = Some(CANCELLED_ERROR.to_string());
                }
                Err(err) => {
                    job.status = WorkerStatus::Failed;
                    job.error = Some(sanitize_error(&err.to_string()));
                }
            }
            job.updated_at_ms = self.inner.clock.epoch_ms().max(job.updated_at_ms);
            job.clone()
        };
        self.inner.tokens.lock().remove(&id);
        tracing::info!(job_id = %id, status = %job.status, "worker job finished");
        if let Err(err) = self.persist(job).await {
            tracing::error!(job_id = %id, error = %err, "failed to persist terminal transition");
        }
    }

    /// Single-file write chain: in-memory state and the store never disagree
    /// about ordering.
    async fn persist(&self, job: WorkerJob) -> Result<(), StoreError> {
        let _gate = self.inner.write_gate.lock().await;
        self.inner.persistence.upsert(&job).await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn raw_job(&self, id: &str) -> Option<WorkerJob> {
        self.inner.jobs.lock().get(id).cloned()
    }
}

/// Trim subprocess noise out of user-visible error text.
pub(crate) fn sanitize_error(message: &str) -> String {
    const LIMIT: usize = 500;
    let cleaned: String = message
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();
    let mut end = LIMIT.min(cleaned.len());
    while end > 0 && !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    cleaned[..end].trim().to_string()
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
