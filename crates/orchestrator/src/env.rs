// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the orchestrator binary.

use std::time::Duration;

use gz_ai::{OptimizerConfig, RetryPolicy};
use gz_engine::{AcceptanceConfig, AnalyzerConfig, WorkerClientConfig};

use crate::state::ChainConfig;

fn ms_var(name: &str) -> Option<Duration> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

fn u32_var(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|s| s.parse::<u32>().ok())
}

fn f64_var(name: &str) -> Option<f64> {
    std::env::var(name).ok().and_then(|s| s.parse::<f64>().ok())
}

/// TCP port for the orchestrator HTTP surface (`GZ_PORT`, default 8090).
pub fn port() -> u16 {
    std::env::var("GZ_PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(8090)
}

/// Worker base URL (`WORKER_URL`, default local worker).
pub fn worker_url() -> String {
    std::env::var("WORKER_URL").unwrap_or_else(|_| "http://127.0.0.1:8091".to_string())
}

/// `WORKER_POLL_INTERVAL_MS` (1000) and `WORKER_TIMEOUT_MS` (180000).
pub fn worker_client_config() -> WorkerClientConfig {
    let mut config = WorkerClientConfig::default();
    if let Some(interval) = ms_var("WORKER_POLL_INTERVAL_MS") {
        config.poll_interval = interval;
    }
    if let Some(timeout) = ms_var("WORKER_TIMEOUT_MS") {
        config.timeout = timeout;
    }
    config
}

/// `ANALYSIS_JOB_DEDUPE_TTL_MS` (600000) plus the acceptance knobs
/// (`AI_ACCEPTANCE_MAX_ATTEMPTS` 3, `AI_MAX_ALLOWED_REGRESSION_PCT` 10,
/// `AI_MAX_DEPLOYMENT_REGRESSION_PCT` 20).
pub fn analyzer_config() -> AnalyzerConfig {
    let mut config = AnalyzerConfig::default();
    if let Some(ttl) = ms_var("ANALYSIS_JOB_DEDUPE_TTL_MS") {
        config.dedupe_ttl = ttl;
    }
    let mut acceptance = AcceptanceConfig::default();
    if let Some(attempts) = u32_var("AI_ACCEPTANCE_MAX_ATTEMPTS") {
        acceptance.max_attempts = attempts;
    }
    if let Some(pct) = f64_var("AI_MAX_ALLOWED_REGRESSION_PCT") {
        acceptance.max_fn_regression_pct = pct;
    }
    if let Some(pct) = f64_var("AI_MAX_DEPLOYMENT_REGRESSION_PCT") {
        acceptance.max_deploy_regression_pct = pct;
    }
    config.acceptance = acceptance;
    config
}

/// `AI_MAX_OPTIMIZER_CYCLES` (2).
pub fn optimizer_config() -> OptimizerConfig {
    let mut config = OptimizerConfig::default();
    if let Some(cycles) = u32_var("AI_MAX_OPTIMIZER_CYCLES") {
        config.max_cycles = cycles;
    }
    config
}

/// `AI_PROVIDER_RETRIES` (2) and `AI_RETRY_BASE_DELAY_MS` (600).
pub fn retry_policy() -> RetryPolicy {
    let mut policy = RetryPolicy::default();
    if let Some(retries) = u32_var("AI_PROVIDER_RETRIES") {
        policy.retries = retries;
    }
    if let Some(delay) = ms_var("AI_RETRY_BASE_DELAY_MS") {
        policy.base_delay = delay;
    }
    policy
}

/// Chain configuration; `None` unless all required variables are present.
/// `which_chain_vars_missing` reports the gap for 400 responses.
pub fn chain_config() -> Option<ChainConfig> {
    let rpc_url = std::env::var("CHAIN_RPC_URL").ok().filter(|s| !s.is_empty())?;
    let signer_key = std::env::var("BACKEND_SIGNER_PRIVATE_KEY").ok().filter(|s| !s.is_empty())?;
    let registry_address =
        std::env::var("GAS_OPTIMIZATION_REGISTRY_ADDRESS").ok().filter(|s| !s.is_empty())?;
    let chain_id = std::env::var("CHAIN_ID").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(31_337);
    Some(ChainConfig { rpc_url, signer_key, registry_address, chain_id })
}
