// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analysis job registry: lifecycle, fingerprint dedup, progress emission.
//!
//! One mutex guards jobs, fingerprint mappings, cancel tokens, and the
//! progress bus together, so a subscriber attached under the lock can never
//! miss an event published under the lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gz_core::{
    AnalysisJob, AnalysisJobId, AnalysisPhase, AnalysisResult, Clock, CodeFingerprint,
    ProgressEvent,
};
use gz_wire::AnalysisJobView;

use crate::bus::ProgressBus;
use crate::error::RegistryError;

struct State {
    jobs: HashMap<AnalysisJobId, AnalysisJob>,
    fingerprints: HashMap<CodeFingerprint, AnalysisJobId>,
    tokens: HashMap<AnalysisJobId, CancellationToken>,
    bus: ProgressBus,
}

/// Result of `create_or_reuse`: the job id, whether an existing job was
/// reused, and (for fresh jobs) the cancellation token the pipeline task
/// must honor.
pub struct CreateOutcome {
    pub id: AnalysisJobId,
    pub reused: bool,
    pub cancel: Option<CancellationToken>,
}

/// Process-wide owner of analysis jobs. Jobs are never deleted; terminal
/// records back the proof endpoints.
pub struct JobRegistry<C: Clock> {
    state: Mutex<State>,
    clock: C,
    dedupe_ttl: Duration,
}

impl<C: Clock> JobRegistry<C> {
    pub fn new(clock: C, dedupe_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                jobs: HashMap::new(),
                fingerprints: HashMap::new(),
                tokens: HashMap::new(),
                bus: ProgressBus::new(),
            }),
            clock,
            dedupe_ttl,
        }
    }

    /// Create a job for `source`, or hand back an existing one.
    ///
    /// Reuse applies when a fingerprint mapping exists and the mapped job is
    /// non-terminal, or completed within the dedup TTL. Failed and cancelled
    /// jobs invalidate the mapping.
    pub fn create_or_reuse(&self, source: &str) -> CreateOutcome {
        let fingerprint = CodeFingerprint::of(source);
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock();

        if let Some(existing_id) = state.fingerprints.get(&fingerprint).copied() {
            if let Some(job) = state.jobs.get(&existing_id) {
                let completed_within_ttl = job.phase == AnalysisPhase::Completed
                    && now.saturating_sub(job.updated_at_ms) <= self.dedupe_ttl.as_millis() as u64;
                if !job.is_terminal() || completed_within_ttl {
                    tracing::debug!(job_id = %existing_id, "reusing analysis job");
                    return CreateOutcome { id: existing_id, reused: true, cancel: None };
                }
            }
        }

        let mut job = AnalysisJob::new(source, &self.clock);
        let id = job.id;
        let token = CancellationToken::new();
        let event = job.record_event("Analysis queued.", now);

        state.fingerprints.insert(fingerprint, id);
        state.tokens.insert(id, token.clone());
        state.jobs.insert(id, job);
        state.bus.publish(id, &event);
        tracing::info!(job_id = %id, "analysis job created");

        CreateOutcome { id, reused: false, cancel: Some(token) }
    }

    pub fn view(&self, id: AnalysisJobId) -> Option<AnalysisJobView> {
        self.state.lock().jobs.get(&id).map(AnalysisJobView::from)
    }

    /// Read access to the full job record (including source) for the proof
    /// builder. Views handed to HTTP callers go through [`Self::view`].
    pub fn with_job<R>(&self, id: AnalysisJobId, f: impl FnOnce(&AnalysisJob) -> R) -> Option<R> {
        self.state.lock().jobs.get(&id).map(f)
    }

    pub fn is_cancel_requested(&self, id: AnalysisJobId) -> bool {
        self.state.lock().jobs.get(&id).map(|j| j.cancel_requested).unwrap_or(false)
    }

    /// Request cancellation. Idempotent; a no-op on terminal jobs.
    pub fn cancel(&self, id: AnalysisJobId) -> Option<AnalysisJobView> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();

        let job = state.jobs.get_mut(&id)?;
        if job.is_terminal() || job.cancel_requested {
            return Some(AnalysisJobView::from(&*job));
        }

        job.cancel_requested = true;
        let event = job.record_event("Cancellation requested.", now);
        let view = AnalysisJobView::from(&*job);
        state.bus.publish(id, &event);
        if let Some(token) = state.tokens.get(&id) {
            token.cancel();
        }
        tracing::info!(job_id = %id, "cancellation requested");
        Some(view)
    }

    /// Emit a progress message in the job's current phase.
    pub fn emit(&self, id: AnalysisJobId, message: &str) {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();
        if let Some(job) = state.jobs.get_mut(&id) {
            if job.is_terminal() {
                return;
            }
            let event = job.record_event(message, now);
            state.bus.publish(id, &event);
        }
    }

    /// Enter a new phase, emitting its start-of-phase progress event.
    pub fn enter_phase(
        &self,
        id: AnalysisJobId,
        phase: AnalysisPhase,
        message: &str,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();
        let job = state.jobs.get_mut(&id).ok_or(RegistryError::NotFound)?;
        job.transition(phase, now)
            .map_err(|e| RegistryError::IllegalTransition(e.to_string()))?;
        let event = job.record_event(message, now);
        state.bus.publish(id, &event);
        Ok(())
    }

    /// Terminal success: store the result and close out subscribers.
    pub fn complete(&self, id: AnalysisJobId, result: AnalysisResult) -> Result<(), RegistryError> {
        self.finish(id, AnalysisPhase::Completed, "Analysis complete.", Some(result), None)
    }

    /// Terminal failure with the error message as the reason.
    pub fn fail(&self, id: AnalysisJobId, error: &str) -> Result<(), RegistryError> {
        self.finish(id, AnalysisPhase::Failed, error, None, Some(error.to_string()))
    }

    /// Terminal cancellation.
    pub fn cancelled(&self, id: AnalysisJobId, reason: &str) -> Result<(), RegistryError> {
        self.finish(id, AnalysisPhase::Cancelled, reason, None, Some(reason.to_string()))
    }

    fn finish(
        &self,
        id: AnalysisJobId,
        phase: AnalysisPhase,
        message: &str,
        result: Option<AnalysisResult>,
        error: Option<String>,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();
        let job = state.jobs.get_mut(&id).ok_or(RegistryError::NotFound)?;
        if job.is_terminal() {
            return Ok(());
        }
        job.transition(phase, now)
            .map_err(|e| RegistryError::IllegalTransition(e.to_string()))?;
        job.result = result;
        job.error = error;
        let event = job.record_event(message, now);
        state.bus.publish(id, &event);
        state.bus.clear(id);
        state.tokens.remove(&id);
        tracing::info!(job_id = %id, status = %phase, "analysis job finished");
        Ok(())
    }

    /// Subscribe to a job's progress: backlog first, then live events, in
    /// emission order. `None` for unknown jobs.
    pub fn subscribe(&self, id: AnalysisJobId) -> Option<mpsc::Receiver<ProgressEvent>> {
        let mut state = self.state.lock();
        let (backlog, live) = {
            let job = state.jobs.get(&id)?;
            (job.events.clone(), !job.is_terminal())
        };
        Some(state.bus.subscribe(id, &backlog, live))
    }

    #[cfg(test)]
    pub fn cancel_token(&self, id: AnalysisJobId) -> Option<CancellationToken> {
        self.state.lock().tokens.get(&id).cloned()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
