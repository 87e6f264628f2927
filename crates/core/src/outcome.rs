// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analysis outcome types: static profile, AI optimizer output, acceptance
//! verdict, and the final analysis result.

use serde::{Deserialize, Serialize};

use crate::gas::{DynamicProfile, Mutability};

/// Function visibility as reported by the parser collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

crate::simple_display! {
    Visibility {
        Public => "public",
        External => "external",
        Internal => "internal",
        Private => "private",
    }
}

/// One function from the static profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSummary {
    pub name: String,
    pub visibility: Visibility,
    pub mutability: Mutability,
}

/// Parser output: contract name plus declared functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticProfile {
    pub contract_name: String,
    pub functions: Vec<FunctionSummary>,
}

/// Edit operation kind proposed by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Replace,
    Insert,
    Delete,
}

crate::simple_display! {
    EditAction {
        Replace => "replace",
        Insert => "insert",
        Delete => "delete",
    }
}

/// A single source edit proposed by the optimizer draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOp {
    pub action: EditAction,
    pub line_start: u32,
    pub line_end: u32,
    pub before: String,
    pub after: String,
    pub rationale: String,
}

/// A named optimization from the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Verifier adjudication of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierVerdict {
    pub approved: bool,
    pub summary: String,
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

/// Provenance and bookkeeping for an optimizer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub retries: u32,
    pub schema_repair_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<VerifierVerdict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Full optimizer output for one analysis: the accepted (or fallback) draft
/// plus the generated source and run metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerOutcome {
    pub optimizations: Vec<Optimization>,
    pub edits: Vec<EditOp>,
    pub optimized_source: String,
    pub total_estimated_saving: String,
    pub meta: OptimizerMeta,
}

/// The individual checks behind an acceptance decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceChecks {
    pub compiled: bool,
    pub abi_compatible: bool,
    pub deployment_gas_regression_pct: f64,
    pub average_mutable_function_regression_pct: f64,
    pub improved: bool,
}

/// Acceptance decision for a candidate.
///
/// Serializes as `{accepted: bool, reason, checks}` for the wire; in code it
/// is a sum so callers cannot read a reason without knowing which side it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VerdictRepr", into = "VerdictRepr")]
pub enum AcceptanceVerdict {
    Accepted { reason: String, checks: AcceptanceChecks },
    Rejected { reason: String, checks: AcceptanceChecks },
}

impl AcceptanceVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptanceVerdict::Accepted { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            AcceptanceVerdict::Accepted { reason, .. } => reason,
            AcceptanceVerdict::Rejected { reason, .. } => reason,
        }
    }

    pub fn checks(&self) -> &AcceptanceChecks {
        match self {
            AcceptanceVerdict::Accepted { checks, .. } => checks,
            AcceptanceVerdict::Rejected { checks, .. } => checks,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerdictRepr {
    accepted: bool,
    reason: String,
    checks: AcceptanceChecks,
}

impl From<VerdictRepr> for AcceptanceVerdict {
    fn from(repr: VerdictRepr) -> Self {
        if repr.accepted {
            AcceptanceVerdict::Accepted { reason: repr.reason, checks: repr.checks }
        } else {
            AcceptanceVerdict::Rejected { reason: repr.reason, checks: repr.checks }
        }
    }
}

impl From<AcceptanceVerdict> for VerdictRepr {
    fn from(verdict: AcceptanceVerdict) -> Self {
        let accepted = verdict.is_accepted();
        let (reason, checks) = match verdict {
            AcceptanceVerdict::Accepted { reason, checks }
            | AcceptanceVerdict::Rejected { reason, checks } => (reason, checks),
        };
        VerdictRepr { accepted, reason, checks }
    }
}

/// Final result of a completed analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub original_contract: String,
    pub static_profile: StaticProfile,
    pub baseline: DynamicProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<DynamicProfile>,
    pub ai: OptimizerOutcome,
    pub optimization_validation: AcceptanceVerdict,
    pub attempts: u32,
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
