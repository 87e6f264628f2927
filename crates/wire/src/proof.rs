// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-chain proof payload and mint receipt DTOs.

use serde::{Deserialize, Serialize};

/// Payload submitted to the proof registry collaborator.
///
/// Hashes are 0x-prefixed keccak256 hex; gas values are clamped to u32;
/// savings are basis points in `[0, 10000]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPayload {
    pub original_hash: String,
    pub optimized_hash: String,
    pub contract_address: String,
    pub contract_name: String,
    pub original_gas: u32,
    pub optimized_gas: u32,
    pub savings_percent_bps: u32,
}

/// Receipt returned by the registry collaborator after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    pub registry_address: String,
    pub chain_id: u64,
}
