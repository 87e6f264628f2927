// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response bodies shared by the two HTTP surfaces.

use serde::{Deserialize, Serialize};

use crate::proof::{MintReceipt, ProofPayload};

/// `202` acknowledgement for a submitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: String,
    pub status: String,
}

/// `202` acknowledgement for a worker retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryAccepted {
    pub job_id: String,
    pub status: String,
    pub retry_of: String,
}

/// Terminal SSE event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoneEvent {
    pub status: String,
}

/// Health probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

/// Response for `POST /api/analyze/jobs/{id}/mint-proof`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintResponse {
    pub minted: bool,
    pub payload: ProofPayload,
    pub receipt: MintReceipt,
}
