// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiler artifact parsing and main-artifact selection.

use serde::Deserialize;
use std::collections::BTreeMap;

use gz_core::Abi;

use crate::error::RunnerError;

/// One compiled contract artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub abi: Abi,
    pub bytecode: String,
}

impl Artifact {
    /// Hex payload without the optional 0x prefix.
    fn bytecode_hex(&self) -> &str {
        self.bytecode.strip_prefix("0x").unwrap_or(&self.bytecode)
    }

    /// Interfaces and abstract contracts compile to empty bytecode.
    pub fn is_deployable(&self) -> bool {
        !self.bytecode_hex().is_empty()
    }

    pub fn has_constructor(&self) -> bool {
        self.abi.constructor().is_some()
    }
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: Abi,
    #[serde(alias = "bin")]
    bytecode: String,
}

#[derive(Deserialize)]
struct CompilerOutput {
    contracts: BTreeMap<String, RawArtifact>,
}

/// Parse the compiler's stdout JSON: `{"contracts": {name: {abi, bytecode}}}`.
pub fn parse_artifacts(json: &str) -> Result<Vec<Artifact>, RunnerError> {
    let output: CompilerOutput = serde_json::from_str(json)
        .map_err(|e| RunnerError::BadArtifacts(format!("unparseable compiler output: {e}")))?;
    Ok(output
        .contracts
        .into_iter()
        .map(|(name, raw)| Artifact {
            // solc-style keys are "path:Name"; keep the contract name only.
            name: name.rsplit(':').next().unwrap_or(&name).to_string(),
            abi: raw.abi,
            bytecode: raw.bytecode,
        })
        .collect())
}

/// Select the main artifact: skip empty bytecode, prefer one with a
/// constructor, break ties by largest bytecode.
pub fn select_main_artifact(artifacts: Vec<Artifact>) -> Option<Artifact> {
    let mut deployable: Vec<Artifact> =
        artifacts.into_iter().filter(Artifact::is_deployable).collect();
    if deployable.is_empty() {
        return None;
    }
    deployable.sort_by(|a, b| {
        b.has_constructor()
            .cmp(&a.has_constructor())
            .then(b.bytecode_hex().len().cmp(&a.bytecode_hex().len()))
    });
    deployable.into_iter().next()
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
