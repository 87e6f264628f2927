// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide handler state.

use std::sync::Arc;

use gz_core::Clock;
use gz_engine::{Analyzer, ProofRegistry};

/// Proof-submission configuration; all three env vars must be present
/// before a mint is attempted.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub signer_key: String,
    pub registry_address: String,
    pub chain_id: u64,
}

/// Shared state behind every orchestrator route.
pub struct AppState<C: Clock> {
    pub analyzer: Analyzer<C>,
    pub chain: Option<ChainConfig>,
    pub proof_registry: Option<Arc<dyn ProofRegistry>>,
}

impl<C: Clock> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            analyzer: self.analyzer.clone(),
            chain: self.chain.clone(),
            proof_registry: self.proof_registry.clone(),
        }
    }
}
