// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-chain proof payload derivation and submission.

use async_trait::async_trait;
use tiny_keccak::{Hasher, Keccak};

use gz_core::{AnalysisJob, AnalysisPhase, GasProfile};
use gz_wire::{MintReceipt, ProofPayload};

use crate::error::ProofError;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// keccak256 of `data`, 0x-prefixed hex.
pub fn keccak256_hex(data: &[u8]) -> String {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut digest = [0u8; 32];
    hasher.finalize(&mut digest);
    let mut out = String::with_capacity(66);
    out.push_str("0x");
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Opaque transaction-submitting collaborator for the proof registry.
#[async_trait]
pub trait ProofRegistry: Send + Sync {
    /// Submit the payload; returns the receipt with the minted token id when
    /// the registry emitted one.
    async fn mint(&self, payload: &ProofPayload) -> Result<MintReceipt, ProofError>;
}

/// Derives proof payloads from completed, accepted analysis jobs.
pub struct ProofBuilder;

impl ProofBuilder {
    /// Average measured gas over mutable entries, falling back to deployment
    /// gas, clamped to u32.
    fn representative_gas(profile: &GasProfile) -> u32 {
        let gas = profile
            .average_mutable_gas()
            .map(|avg| avg.round())
            .unwrap_or(profile.deployment_gas as f64);
        if gas <= 0.0 {
            0
        } else if gas >= u32::MAX as f64 {
            u32::MAX
        } else {
            gas as u32
        }
    }

    /// `round((before-after)/before * 10000)` clamped into `[0, 10000]`.
    pub fn savings_bps(original_gas: u32, optimized_gas: u32) -> u32 {
        if original_gas == 0 {
            return 0;
        }
        let raw = (original_gas as f64 - optimized_gas as f64) / original_gas as f64 * 10_000.0;
        raw.round().clamp(0.0, 10_000.0) as u32
    }

    /// Build the payload for `job`.
    ///
    /// Refuses unless the job completed, acceptance accepted the candidate,
    /// and an optimized profile is present.
    pub fn build_payload(
        job: &AnalysisJob,
        contract_address: Option<&str>,
        contract_name: Option<&str>,
    ) -> Result<ProofPayload, ProofError> {
        if job.phase != AnalysisPhase::Completed {
            return Err(ProofError::NotEligible("job is not completed".to_string()));
        }
        let result = job
            .result
            .as_ref()
            .ok_or_else(|| ProofError::NotEligible("job has no result".to_string()))?;
        if !result.optimization_validation.is_accepted() {
            return Err(ProofError::NotEligible(
                "optimization candidate was not accepted".to_string(),
            ));
        }
        let optimized = result.optimized.as_ref().ok_or_else(|| {
            ProofError::NotEligible("no optimized profile was produced".to_string())
        })?;

        let original_source = &result.original_contract;
        let optimized_source = if result.ai.optimized_source.is_empty() {
            original_source
        } else {
            &result.ai.optimized_source
        };

        let original_gas = Self::representative_gas(&result.baseline.gas);
        let optimized_gas = Self::representative_gas(&optimized.gas);

        Ok(ProofPayload {
            original_hash: keccak256_hex(original_source.as_bytes()),
            optimized_hash: keccak256_hex(optimized_source.as_bytes()),
            contract_address: contract_address.unwrap_or(ZERO_ADDRESS).to_string(),
            contract_name: contract_name
                .unwrap_or(&result.baseline.contract_name)
                .to_string(),
            original_gas,
            optimized_gas,
            savings_percent_bps: Self::savings_bps(original_gas, optimized_gas),
        })
    }
}

#[cfg(test)]
#[path = "proof_tests.rs"]
mod tests;
