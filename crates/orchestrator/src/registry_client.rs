// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proof registry collaborator over JSON-RPC.
//!
//! The chain endpoint owns signing and transaction submission; this client
//! posts the payload and reads back the transaction hash plus the token id
//! from the `OptimizationProofMinted` event when the registry emitted one.

use async_trait::async_trait;
use serde::Deserialize;

use gz_engine::{ProofError, ProofRegistry};
use gz_wire::{MintReceipt, ProofPayload};

use crate::state::ChainConfig;

pub struct RpcProofRegistry {
    chain: ChainConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<RpcResult>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcResult {
    transaction_hash: String,
    #[serde(default)]
    events: Vec<RpcEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcEvent {
    name: String,
    #[serde(default)]
    token_id: Option<String>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

impl RpcProofRegistry {
    pub fn new(chain: ChainConfig) -> Self {
        Self { chain, http: reqwest::Client::new() }
    }
}

#[async_trait]
impl ProofRegistry for RpcProofRegistry {
    async fn mint(&self, payload: &ProofPayload) -> Result<MintReceipt, ProofError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "gz_mintOptimizationProof",
            "params": [{
                "registry": self.chain.registry_address,
                "signerKey": self.chain.signer_key,
                "payload": payload,
            }],
        });

        let response = self
            .http
            .post(&self.chain.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProofError::Registry(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProofError::Registry(format!(
                "chain endpoint returned {}",
                response.status()
            )));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| ProofError::Registry(format!("malformed chain response: {e}")))?;
        if let Some(error) = envelope.error {
            return Err(ProofError::Registry(error.message));
        }
        let result = envelope
            .result
            .ok_or_else(|| ProofError::Registry("chain response had no result".to_string()))?;

        let token_id = result
            .events
            .iter()
            .find(|e| e.name == "OptimizationProofMinted")
            .and_then(|e| e.token_id.clone());

        Ok(MintReceipt {
            tx_hash: result.transaction_hash,
            token_id,
            registry_address: self.chain.registry_address.clone(),
            chain_id: self.chain.chain_id,
        })
    }
}
