// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the worker binary.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::PersistenceError;
use crate::runner::RunnerConfig;

/// TCP port for the worker HTTP surface (`WORKER_PORT`, default 8091).
pub fn worker_port() -> u16 {
    std::env::var("WORKER_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8091)
}

/// `DATABASE_URL`, with `PGSSLMODE=require` appended when set.
pub fn database_url() -> Result<String, PersistenceError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| PersistenceError("DATABASE_URL is not set".to_string()))?;
    let require_ssl = std::env::var("PGSSLMODE").map(|v| v == "require").unwrap_or(false);
    if require_ssl && !url.contains("sslmode=") {
        let separator = if url.contains('?') { '&' } else { '?' };
        return Ok(format!("{url}{separator}sslmode=require"));
    }
    Ok(url)
}

/// Runner configuration from `GZ_SOLC_BIN`, `GZ_GAS_ESTIMATOR_BIN`, and
/// `GZ_BUILD_ROOT`.
pub fn runner_config() -> RunnerConfig {
    let mut config = RunnerConfig::default();
    if let Ok(bin) = std::env::var("GZ_SOLC_BIN") {
        config.compiler_bin = bin;
    }
    if let Ok(bin) = std::env::var("GZ_GAS_ESTIMATOR_BIN") {
        config.estimator_bin = bin;
    }
    if let Ok(root) = std::env::var("GZ_BUILD_ROOT") {
        config.build_root = PathBuf::from(root);
    }
    if let Some(ms) = std::env::var("GZ_KILL_GRACE_MS").ok().and_then(|s| s.parse::<u64>().ok()) {
        config.kill_grace = Duration::from_millis(ms);
    }
    config
}
