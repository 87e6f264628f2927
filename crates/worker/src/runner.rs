// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compile and gas-estimator subprocess execution.
//!
//! Two supervised invocations per job against a job-local build folder:
//!
//! 1. the compiler CLI reads the source file named by `GZ_SOURCE_FILE` and
//!    prints artifact JSON (`{"contracts": {name: {abi, bytecode}}}`),
//! 2. the estimator CLI reads the measurement plan named by `GZ_PLAN_FILE`
//!    (bytecode, constructor args, calls keyed by canonical signature) and
//!    prints `{"deploymentGas": string, "functions": {signature: entry}}`.
//!
//! Supervision contract: piped stdio; exit 0 resolves with captured output;
//! non-zero raises with stderr appended; abort sends SIGTERM, waits 1.5 s,
//! then SIGKILLs. The job's source file and artifact folder are removed on
//! every exit path, including abort.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use gz_core::abi::canonical_signature;
use gz_core::{DynamicProfile, FunctionGasEntry, GasProfile, Mutability, WorkerJobId};

use crate::artifact::{parse_artifacts, select_main_artifact, Artifact};
use crate::error::RunnerError;
use crate::store::sanitize_error as sanitize_reason;
use crate::synth;

/// Runner knobs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Root under which per-job build folders are created.
    pub build_root: PathBuf,
    pub compiler_bin: String,
    pub estimator_bin: String,
    /// Grace between SIGTERM and SIGKILL.
    pub kill_grace: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            build_root: std::env::temp_dir().join("gweizero-builds"),
            compiler_bin: "solc-artifacts".to_string(),
            estimator_bin: "gas-estimator".to_string(),
            kill_grace: Duration::from_millis(1_500),
        }
    }
}

/// Removes the per-job folder on every exit path.
struct BuildDirGuard {
    dir: PathBuf,
}

impl Drop for BuildDirGuard {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.dir) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(dir = %self.dir.display(), error = %err, "failed to clean build dir");
            }
        }
    }
}

struct Captured {
    stdout: String,
    stderr: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeasurePlan {
    bytecode: String,
    constructor_args: Vec<serde_json::Value>,
    calls: Vec<PlannedCall>,
}

#[derive(Serialize)]
struct PlannedCall {
    signature: String,
    args: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimatorOutput {
    deployment_gas: String,
    #[serde(default)]
    functions: BTreeMap<String, RawGasEntry>,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum RawGasEntry {
    #[serde(rename_all = "camelCase")]
    Measured { gas_used: String },
    #[serde(rename_all = "camelCase")]
    Unmeasured { reason: String },
}

/// Executes the compile/measure subprocess pair for one job.
pub struct SubprocessRunner {
    config: RunnerConfig,
}

impl SubprocessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Compile `source`, select the main artifact, synthesize deterministic
    /// inputs, and measure gas.
    pub async fn measure(
        &self,
        job_id: &WorkerJobId,
        source: &str,
        cancel: &CancellationToken,
    ) -> Result<DynamicProfile, RunnerError> {
        let job_dir = self.config.build_root.join(format!("job-{}", job_id.suffix()));
        let contracts_dir = job_dir.join("contracts");
        let _guard = BuildDirGuard { dir: job_dir.clone() };

        tokio::fs::create_dir_all(&contracts_dir).await?;
        let source_path = contracts_dir.join("Contract.sol");
        tokio::fs::write(&source_path, source).await?;

        // Phase 1: compile.
        let mut compile = Command::new(&self.config.compiler_bin);
        compile
            .arg("compile")
            .env("GZ_SOURCE_FILE", &source_path)
            .current_dir(&job_dir);
        let compiled = self.supervise(compile, &self.config.compiler_bin, cancel).await?;
        let artifacts_json = first_json_object(&compiled.stdout).ok_or_else(|| {
            RunnerError::NoJson { command: self.config.compiler_bin.clone() }
        })?;
        let artifacts = parse_artifacts(artifacts_json)?;
        let artifact = select_main_artifact(artifacts)
            .ok_or_else(|| RunnerError::BadArtifacts("no deployable artifact".to_string()))?;

        // Phase 2: synthesize the plan and measure.
        let (plan, premarked) = build_plan(&artifact)?;
        let plan_path = job_dir.join("plan.json");
        let plan_json = serde_json::to_string(&plan)
            .map_err(|e| RunnerError::Io(format!("unserializable plan: {e}")))?;
        tokio::fs::write(&plan_path, plan_json).await?;

        let mut estimate = Command::new(&self.config.estimator_bin);
        estimate
            .arg("measure")
            .env("GZ_PLAN_FILE", &plan_path)
            .current_dir(&job_dir);
        let estimated = self.supervise(estimate, &self.config.estimator_bin, cancel).await?;
        let output_json = first_json_object(&estimated.stdout).ok_or_else(|| {
            RunnerError::NoJson { command: self.config.estimator_bin.clone() }
        })?;

        merge_profile(&artifact, output_json, premarked)
    }

    /// Run one subprocess under the supervision contract.
    async fn supervise(
        &self,
        mut command: Command,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Captured, RunnerError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| RunnerError::Spawn {
            command: name.to_string(),
            message: e.to_string(),
        })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                self.terminate(&mut child, name).await;
                return Err(RunnerError::Aborted);
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();

        if status.success() {
            Ok(Captured { stdout, stderr })
        } else {
            Err(RunnerError::NonZeroExit {
                command: name.to_string(),
                code: status.code().unwrap_or(-1),
                stderr,
            })
        }
    }

    /// SIGTERM, grace, then SIGKILL. Does not rely on the child cooperating.
    async fn terminate(&self, child: &mut tokio::process::Child, name: &str) {
        if let Some(pid) = child.id() {
            let pid = nix::unistd::Pid::from_raw(pid as i32);
            if let Err(err) = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM) {
                tracing::debug!(command = name, error = %err, "SIGTERM failed");
            }
        }
        match tokio::time::timeout(self.config.kill_grace, child.wait()).await {
            Ok(_) => {
                tracing::debug!(command = name, "subprocess exited after SIGTERM");
            }
            Err(_) => {
                tracing::warn!(command = name, "subprocess survived grace period, killing");
                let _ = child.kill().await;
            }
        }
    }
}

/// Build the measurement plan; functions whose inputs cannot be synthesized
/// come back pre-marked unmeasured.
fn build_plan(artifact: &Artifact) -> Result<(MeasurePlan, Vec<(String, String)>), RunnerError> {
    let constructor_args = synth::constructor_args(&artifact.abi)?;
    let mut calls = Vec::new();
    let mut premarked = Vec::new();
    for function in artifact.abi.functions() {
        let signature = canonical_signature(function);
        match synth::args_for(&function.inputs) {
            Ok(args) => calls.push(PlannedCall { signature, args }),
            Err(err) => premarked.push((signature, err.to_string())),
        }
    }
    Ok((
        MeasurePlan { bytecode: artifact.bytecode.clone(), constructor_args, calls },
        premarked,
    ))
}

/// Combine estimator output with ABI mutability into the final profile.
fn merge_profile(
    artifact: &Artifact,
    output_json: &str,
    premarked: Vec<(String, String)>,
) -> Result<DynamicProfile, RunnerError> {
    let output: EstimatorOutput = serde_json::from_str(output_json)
        .map_err(|e| RunnerError::BadEstimate(format!("unparseable output: {e}")))?;
    let deployment_gas: u64 = output
        .deployment_gas
        .parse()
        .map_err(|_| RunnerError::BadEstimate(format!("bad deploymentGas: {}", output.deployment_gas)))?;

    let mutability_by_signature: BTreeMap<String, Mutability> = artifact
        .abi
        .functions()
        .map(|f| {
            (canonical_signature(f), f.state_mutability.unwrap_or(Mutability::Nonpayable))
        })
        .collect();
    let mutability_of = |signature: &str| {
        mutability_by_signature
            .get(signature)
            .copied()
            .unwrap_or(Mutability::Nonpayable)
    };

    let mut functions = BTreeMap::new();
    for (signature, raw) in output.functions {
        let mutability = mutability_of(&signature);
        let entry = match raw {
            RawGasEntry::Measured { gas_used } => match gas_used.parse::<u64>() {
                Ok(gas_used) => FunctionGasEntry::Measured { gas_used, mutability },
                Err(_) => FunctionGasEntry::Unmeasured {
                    reason: format!("unparseable gas value: {gas_used}"),
                    mutability,
                },
            },
            RawGasEntry::Unmeasured { reason } => FunctionGasEntry::Unmeasured {
                reason: sanitize_reason(&reason),
                mutability,
            },
        };
        functions.insert(signature, entry);
    }
    for (signature, reason) in premarked {
        let mutability = mutability_of(&signature);
        functions
            .entry(signature)
            .or_insert(FunctionGasEntry::Unmeasured { reason: sanitize_reason(&reason), mutability });
    }

    Ok(DynamicProfile {
        gas: GasProfile { deployment_gas, functions },
        abi: artifact.abi.clone(),
        bytecode: artifact.bytecode.clone(),
        contract_name: artifact.name.clone(),
    })
}

/// First balanced `{…}` region of `text`, string-literal aware.
pub(crate) fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
