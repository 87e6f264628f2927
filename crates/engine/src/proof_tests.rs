// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::result_fixture;
use gz_core::{AnalysisJob, FakeClock};
use proptest::prelude::*;

fn completed_job() -> AnalysisJob {
    AnalysisJob::builder()
        .source("contract Demo { function bump(uint256 n) external {} }")
        .phase(AnalysisPhase::Completed)
        .result(result_fixture())
        .build()
}

#[test]
fn keccak_of_empty_input_matches_known_vector() {
    assert_eq!(
        keccak256_hex(b""),
        "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}

#[test]
fn payload_hashes_cover_both_sources() {
    let job = completed_job();
    let payload = ProofBuilder::build_payload(&job, None, None).unwrap();

    let result = job.result.as_ref().unwrap();
    assert_eq!(
        payload.original_hash,
        keccak256_hex(result.original_contract.as_bytes())
    );
    assert_eq!(
        payload.optimized_hash,
        keccak256_hex(result.ai.optimized_source.as_bytes())
    );
    assert_ne!(payload.original_hash, payload.optimized_hash);
}

#[test]
fn savings_use_average_mutable_gas() {
    // Baseline avg 100000, optimized avg 80000 → 2000 bps.
    let job = completed_job();
    let payload = ProofBuilder::build_payload(&job, None, None).unwrap();
    assert_eq!(payload.original_gas, 100_000);
    assert_eq!(payload.optimized_gas, 80_000);
    assert_eq!(payload.savings_percent_bps, 2_000);
}

#[test]
fn address_defaults_to_zero_and_name_to_contract() {
    let job = completed_job();
    let payload = ProofBuilder::build_payload(&job, None, None).unwrap();
    assert_eq!(payload.contract_address, ZERO_ADDRESS);
    assert_eq!(payload.contract_name, "Demo");

    let payload = ProofBuilder::build_payload(&job, Some("0xabc"), Some("Renamed")).unwrap();
    assert_eq!(payload.contract_address, "0xabc");
    assert_eq!(payload.contract_name, "Renamed");
}

#[test]
fn non_completed_job_is_not_eligible() {
    let clock = FakeClock::new();
    let job = AnalysisJob::new("contract A {}", &clock);
    let err = ProofBuilder::build_payload(&job, None, None).unwrap_err();
    assert!(matches!(err, ProofError::NotEligible(_)));
}

#[test]
fn rejected_result_is_not_eligible() {
    let mut job = completed_job();
    if let Some(result) = job.result.as_mut() {
        result.optimization_validation = gz_core::AcceptanceVerdict::Rejected {
            reason: "ABI compatibility check failed.".into(),
            checks: gz_core::AcceptanceChecks::default(),
        };
    }
    assert!(ProofBuilder::build_payload(&job, None, None).is_err());
}

#[test]
fn missing_optimized_profile_is_not_eligible() {
    let mut job = completed_job();
    if let Some(result) = job.result.as_mut() {
        result.optimized = None;
    }
    assert!(ProofBuilder::build_payload(&job, None, None).is_err());
}

#[test]
fn negative_savings_clamp_to_zero() {
    assert_eq!(ProofBuilder::savings_bps(100, 150), 0);
    assert_eq!(ProofBuilder::savings_bps(0, 100), 0);
    assert_eq!(ProofBuilder::savings_bps(100, 0), 10_000);
}

proptest! {
    /// Savings land in [0, 10000] and match the rounded formula.
    #[test]
    fn savings_bps_formula(original in 1u32..2_000_000, optimized in 0u32..2_000_000) {
        let bps = ProofBuilder::savings_bps(original, optimized);
        prop_assert!(bps <= 10_000);
        let raw = (original as f64 - optimized as f64) / original as f64 * 10_000.0;
        let expected = raw.round().clamp(0.0, 10_000.0) as u32;
        prop_assert_eq!(bps, expected);
    }
}
