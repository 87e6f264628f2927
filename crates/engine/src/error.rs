// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the orchestrator engine.

/// Errors from the job registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("job not found")]
    NotFound,

    #[error("illegal transition: {0}")]
    IllegalTransition(String),
}

/// Errors from the worker client's submit/poll protocol.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerClientError {
    #[error("worker request failed: {0}")]
    Http(String),

    #[error("job not found")]
    JobNotFound,

    #[error("Worker analysis timed out after {0}ms.")]
    Timeout(u64),

    /// The worker reported the job failed or cancelled.
    #[error("{0}")]
    WorkerFailed(String),

    #[error("worker polling cancelled")]
    Cancelled,
}

/// Errors from proof payload derivation and submission.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProofError {
    #[error("{0}")]
    NotEligible(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("proof registry call failed: {0}")]
    Registry(String),
}
