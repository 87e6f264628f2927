// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script-backed fake compiler/estimator binaries for runner and store
//! tests.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::runner::{RunnerConfig, SubprocessRunner};

/// Artifact JSON for a small contract with one nonpayable function.
pub fn demo_artifacts_json() -> String {
    serde_json::json!({
        "contracts": {
            "contracts/Contract.sol:Demo": {
                "abi": [
                    {"type": "constructor", "inputs": [], "stateMutability": "nonpayable"},
                    {"type": "function", "name": "bump",
                     "inputs": [{"name": "n", "type": "uint256"}],
                     "stateMutability": "nonpayable"},
                    {"type": "function", "name": "peek", "inputs": [],
                     "stateMutability": "view"}
                ],
                "bytecode": "0x6080604052348015600e575f5ffd5b50"
            }
        }
    })
    .to_string()
}

/// Estimator JSON matching [`demo_artifacts_json`].
pub fn demo_estimate_json() -> String {
    serde_json::json!({
        "deploymentGas": "143200",
        "functions": {
            "bump(uint256)": {"status": "measured", "gasUsed": "43750"},
            "peek()": {"status": "measured", "gasUsed": "3100"}
        }
    })
    .to_string()
}

/// Write an executable shell script into `dir` and return its path string.
pub fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    path.to_string_lossy().into_owned()
}

/// A script that prints `payload` on stdout and exits 0.
pub fn echo_script(dir: &Path, name: &str, payload: &str) -> String {
    let encoded = payload.replace('\'', "'\\''");
    write_script(dir, name, &format!("printf '%s' '{encoded}'"))
}

/// Runner wired to scripts that produce the demo artifact and estimate.
pub fn scripted_runner(dir: &Path) -> SubprocessRunner {
    let compiler = echo_script(dir, "fake-compiler", &demo_artifacts_json());
    let estimator = echo_script(dir, "fake-estimator", &demo_estimate_json());
    SubprocessRunner::new(RunnerConfig {
        build_root: dir.join("builds"),
        compiler_bin: compiler,
        estimator_bin: estimator,
        kill_grace: std::time::Duration::from_millis(200),
    })
}
