// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{demo_artifacts_json, echo_script, scripted_runner, write_script};
use std::sync::Arc;
use tempfile::TempDir;

const SOURCE: &str = "contract Demo { function bump(uint256 n) external {} }";

fn job_id() -> WorkerJobId {
    WorkerJobId::new()
}

#[test]
fn first_json_object_extracts_balanced_region() {
    assert_eq!(first_json_object("noise {\"a\": 1} trailing"), Some("{\"a\": 1}"));
    assert_eq!(
        first_json_object("log line\n{\"a\": {\"b\": 2}}\nmore"),
        Some("{\"a\": {\"b\": 2}}")
    );
    // Braces inside strings do not close the region.
    assert_eq!(
        first_json_object(r#"{"a": "}", "b": 1}"#),
        Some(r#"{"a": "}", "b": 1}"#)
    );
    assert_eq!(first_json_object("no json here"), None);
    assert_eq!(first_json_object("{unterminated"), None);
}

#[tokio::test]
async fn happy_path_produces_merged_profile() {
    let dir = TempDir::new().unwrap();
    let runner = scripted_runner(dir.path());
    let id = job_id();

    let profile = runner
        .measure(&id, SOURCE, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(profile.contract_name, "Demo");
    assert_eq!(profile.gas.deployment_gas, 143_200);
    let bump = &profile.gas.functions["bump(uint256)"];
    assert_eq!(bump.gas_used(), Some(43_750));
    assert_eq!(bump.mutability(), Mutability::Nonpayable);
    let peek = &profile.gas.functions["peek()"];
    assert_eq!(peek.mutability(), Mutability::View);

    // The per-job build folder is gone.
    assert!(!dir.path().join("builds").join(format!("job-{}", id.suffix())).exists());
}

#[tokio::test]
async fn compiler_failure_raises_with_stderr() {
    let dir = TempDir::new().unwrap();
    let failing = write_script(dir.path(), "bad-compiler", "echo 'CompilerError: bad pragma' >&2; exit 3");
    let runner = SubprocessRunner::new(RunnerConfig {
        build_root: dir.path().join("builds"),
        compiler_bin: failing,
        estimator_bin: echo_script(dir.path(), "estimator", "{}"),
        kill_grace: Duration::from_millis(200),
    });

    let id = job_id();
    let err = runner.measure(&id, SOURCE, &CancellationToken::new()).await.unwrap_err();
    match err {
        RunnerError::NonZeroExit { code, stderr, .. } => {
            assert_eq!(code, 3);
            assert!(stderr.contains("CompilerError: bad pragma"));
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
    assert!(!dir.path().join("builds").join(format!("job-{}", id.suffix())).exists());
}

#[tokio::test]
async fn output_without_json_is_an_error() {
    let dir = TempDir::new().unwrap();
    let runner = SubprocessRunner::new(RunnerConfig {
        build_root: dir.path().join("builds"),
        compiler_bin: echo_script(dir.path(), "chatty-compiler", "just some logs"),
        estimator_bin: echo_script(dir.path(), "estimator", "{}"),
        kill_grace: Duration::from_millis(200),
    });

    let err = runner
        .measure(&job_id(), SOURCE, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::NoJson { .. }));
}

#[tokio::test]
async fn abort_terminates_subprocess_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    // The estimator hangs; the job must abort via the token.
    let hanging = write_script(dir.path(), "hanging-estimator", "sleep 30");
    let runner = Arc::new(SubprocessRunner::new(RunnerConfig {
        build_root: dir.path().join("builds"),
        compiler_bin: echo_script(dir.path(), "compiler", &demo_artifacts_json()),
        estimator_bin: hanging,
        kill_grace: Duration::from_millis(200),
    }));

    let id = job_id();
    let cancel = CancellationToken::new();
    let task = {
        let runner = runner.clone();
        let cancel = cancel.clone();
        let id_for_task = id;
        tokio::spawn(async move {
            runner.measure(&id_for_task, SOURCE, &cancel).await
        })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("abort must complete within the grace window")
        .unwrap();
    assert!(matches!(result, Err(RunnerError::Aborted)));

    // No leftover source file or artifact folder.
    assert!(!dir.path().join("builds").join(format!("job-{}", id.suffix())).exists());

    // The next submission with the same source succeeds.
    let fresh = scripted_runner(dir.path());
    let profile = fresh
        .measure(&job_id(), SOURCE, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(profile.contract_name, "Demo");
}

#[tokio::test]
async fn unsynthesizable_function_is_premarked_unmeasured() {
    let dir = TempDir::new().unwrap();
    let artifacts = serde_json::json!({
        "contracts": {
            "contracts/Contract.sol:Odd": {
                "abi": [
                    {"type": "function", "name": "weird",
                     "inputs": [{"name": "f", "type": "function"}],
                     "stateMutability": "nonpayable"},
                    {"type": "function", "name": "plain", "inputs": [],
                     "stateMutability": "nonpayable"}
                ],
                "bytecode": "0x6080"
            }
        }
    })
    .to_string();
    let estimate = serde_json::json!({
        "deploymentGas": "90000",
        "functions": {
            "plain()": {"status": "measured", "gasUsed": "21000"}
        }
    })
    .to_string();
    let runner = SubprocessRunner::new(RunnerConfig {
        build_root: dir.path().join("builds"),
        compiler_bin: echo_script(dir.path(), "compiler", &artifacts),
        estimator_bin: echo_script(dir.path(), "estimator", &estimate),
        kill_grace: Duration::from_millis(200),
    });

    let profile = runner
        .measure(&job_id(), SOURCE, &CancellationToken::new())
        .await
        .unwrap();

    let weird = &profile.gas.functions["weird(function)"];
    match weird {
        FunctionGasEntry::Unmeasured { reason, .. } => {
            assert!(reason.contains("Unsupported ABI type: function"));
        }
        other => panic!("expected unmeasured entry, got {other:?}"),
    }
    assert_eq!(profile.gas.functions["plain()"].gas_used(), Some(21_000));
}
