// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loose ABI model plus canonical signature derivation.
//!
//! The compiler collaborator hands us ABI JSON; we keep it as a list of
//! loosely-typed entries (unknown entry kinds pass through untouched) and
//! derive canonical signatures from it. Canonical form follows the ABI
//! grammar: `uint` widens to `uint256`, `int` to `int256`, tuples expand to
//! their component lists, array suffixes are preserved. Data location
//! (memory/calldata) never appears in the ABI and so never appears here.

use serde::{Deserialize, Serialize};

use crate::gas::Mutability;

/// A single ABI input/output parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { name: String::new(), kind: kind.into(), components: Vec::new() }
    }
}

/// One entry of a contract ABI (function, constructor, event, error, …).
///
/// Kept loose on purpose: the compiler emits entry kinds we never inspect
/// (events, errors, receive), and a strict enum would reject them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<Mutability>,
}

/// A contract ABI: the ordered entry list as emitted by the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abi(pub Vec<AbiEntry>);

impl Abi {
    /// All function entries.
    pub fn functions(&self) -> impl Iterator<Item = &AbiEntry> {
        self.0.iter().filter(|e| e.kind == "function")
    }

    /// The constructor entry, if the contract declares one.
    pub fn constructor(&self) -> Option<&AbiEntry> {
        self.0.iter().find(|e| e.kind == "constructor")
    }

    /// Normalized compatibility entries: `signature@mutability` per function,
    /// as a sorted multiset.
    pub fn compat_entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self
            .functions()
            .map(|f| {
                let mutability =
                    f.state_mutability.unwrap_or(Mutability::Nonpayable);
                format!("{}@{}", canonical_signature(f), mutability)
            })
            .collect();
        entries.sort();
        entries
    }
}

/// Canonical signature of a function entry: `name(type1,type2,…)`.
pub fn canonical_signature(entry: &AbiEntry) -> String {
    let types: Vec<String> = entry.inputs.iter().map(canonical_type).collect();
    format!("{}({})", entry.name.as_deref().unwrap_or_default(), types.join(","))
}

/// ABI-canonical type name for a parameter.
pub fn canonical_type(param: &AbiParam) -> String {
    canonicalize(&param.kind, &param.components)
}

fn canonicalize(kind: &str, components: &[AbiParam]) -> String {
    // Split off array suffix ("uint[2][]" → base "uint", suffix "[2][]").
    let (base, suffix) = match kind.find('[') {
        Some(idx) => kind.split_at(idx),
        None => (kind, ""),
    };

    let canonical_base = match base {
        "uint" => "uint256".to_string(),
        "int" => "int256".to_string(),
        "tuple" => {
            let inner: Vec<String> = components.iter().map(canonical_type).collect();
            format!("({})", inner.join(","))
        }
        other => other.to_string(),
    };

    format!("{canonical_base}{suffix}")
}

#[cfg(test)]
#[path = "abi_tests.rs"]
mod tests;
