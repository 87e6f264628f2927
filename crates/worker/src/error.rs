// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the worker.

use gz_core::WorkerStatus;

/// Deterministic input synthesis failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    #[error("Unsupported nested type depth")]
    NestedTooDeep,

    #[error("Unsupported ABI type: {0}")]
    UnsupportedType(String),
}

/// Subprocess compile/deploy/measure failures.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("io error: {0}")]
    Io(String),

    #[error("failed to spawn {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("{command} exited with code {code}: {stderr}")]
    NonZeroExit { command: String, code: i32, stderr: String },

    #[error("subprocess aborted")]
    Aborted,

    #[error("no JSON object found in {command} output")]
    NoJson { command: String },

    #[error("bad artifacts: {0}")]
    BadArtifacts(String),

    #[error("bad estimator output: {0}")]
    BadEstimate(String),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io(err.to_string())
    }
}

/// Store-level failures surfaced to the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("job not found")]
    NotFound,

    #[error("job is not retryable from status {0}")]
    NotRetryable(WorkerStatus),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Relational store failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("persistence error: {0}")]
pub struct PersistenceError(pub String);
