// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gas profiles: deployment gas plus per-function measurements.
//!
//! Functions are keyed by canonical signature (`name(type1,type2,…)` with
//! ABI-canonical type names). Each entry is either a measurement or the
//! reason one could not be taken.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::abi::Abi;

/// Solidity state mutability of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    View,
    Pure,
    Nonpayable,
    Payable,
}

impl Mutability {
    /// True for state-changing mutabilities (the ones that cost gas on-chain).
    pub fn is_mutable(&self) -> bool {
        matches!(self, Mutability::Nonpayable | Mutability::Payable)
    }
}

crate::simple_display! {
    Mutability {
        View => "view",
        Pure => "pure",
        Nonpayable => "nonpayable",
        Payable => "payable",
    }
}

/// Outcome of estimating gas for a single function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FunctionGasEntry {
    #[serde(rename_all = "camelCase")]
    Measured { gas_used: u64, mutability: Mutability },
    #[serde(rename_all = "camelCase")]
    Unmeasured { reason: String, mutability: Mutability },
}

impl FunctionGasEntry {
    pub fn mutability(&self) -> Mutability {
        match self {
            FunctionGasEntry::Measured { mutability, .. } => *mutability,
            FunctionGasEntry::Unmeasured { mutability, .. } => *mutability,
        }
    }

    /// Gas for measured entries, `None` otherwise.
    pub fn gas_used(&self) -> Option<u64> {
        match self {
            FunctionGasEntry::Measured { gas_used, .. } => Some(*gas_used),
            FunctionGasEntry::Unmeasured { .. } => None,
        }
    }
}

/// Deployment gas plus per-function gas, keyed by canonical signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasProfile {
    pub deployment_gas: u64,
    pub functions: BTreeMap<String, FunctionGasEntry>,
}

impl GasProfile {
    /// Average measured gas over nonpayable/payable functions.
    ///
    /// `None` when no mutable function was measured.
    pub fn average_mutable_gas(&self) -> Option<f64> {
        let measured: Vec<u64> = self
            .functions
            .values()
            .filter(|e| e.mutability().is_mutable())
            .filter_map(|e| e.gas_used())
            .collect();
        if measured.is_empty() {
            return None;
        }
        Some(measured.iter().sum::<u64>() as f64 / measured.len() as f64)
    }
}

/// Full dynamic profile returned by the measurement worker: the gas profile
/// plus the artifact it was measured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicProfile {
    #[serde(flatten)]
    pub gas: GasProfile,
    pub abi: Abi,
    pub bytecode: String,
    pub contract_name: String,
}

#[cfg(test)]
#[path = "gas_tests.rs"]
mod tests;
