// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acceptance adjudication: ABI compatibility plus gas regression limits.
//!
//! ABI compatibility uses strict canonical normalization
//! (`name(type1,…)@stateMutability`, multiset equality). Data location is
//! not part of the ABI type grammar, so a memory→calldata relocation passes
//! while added functions or changed arity fail.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use gz_ai::{AiError, CandidateReviser};
use gz_core::{AcceptanceChecks, AcceptanceVerdict, DynamicProfile};

use crate::error::WorkerClientError;
use crate::worker_client::GasProfiler;

/// Thresholds and attempt limits for acceptance.
#[derive(Debug, Clone)]
pub struct AcceptanceConfig {
    pub max_attempts: u32,
    pub max_fn_regression_pct: f64,
    pub max_deploy_regression_pct: f64,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self { max_attempts: 3, max_fn_regression_pct: 10.0, max_deploy_regression_pct: 20.0 }
    }
}

/// What the acceptance loop concluded.
#[derive(Debug)]
pub struct AcceptanceOutcome {
    pub verdict: AcceptanceVerdict,
    /// Profile of the last measured attempt (present even for decided
    /// rejections, absent when every attempt raised).
    pub profile: Option<DynamicProfile>,
    pub attempts: u32,
    /// The candidate that was ultimately measured (the corrective retry may
    /// have revised it).
    pub candidate: String,
}

/// Regression percent from `before` to `after`; 0 when `before` is not
/// positive.
pub fn regression_pct(before: f64, after: f64) -> f64 {
    if before <= 0.0 {
        return 0.0;
    }
    (after - before) / before * 100.0
}

/// Map a compile error message to an error kind plus a canned corrective
/// hint for the AI retry.
pub fn classify_compile_error(message: &str) -> (&'static str, &'static str) {
    let lowered = message.to_lowercase();
    if lowered.contains("stack too deep") {
        ("stack-too-deep", "Reduce local variables or split the function into smaller ones.")
    } else if lowered.contains("data location") || lowered.contains("storage") {
        (
            "data-location",
            "Use memory or calldata for reference-type parameters; storage is only valid for internal references.",
        )
    } else if lowered.contains("undeclared identifier") {
        (
            "undeclared-identifier",
            "Declare or import every identifier you reference; do not rename existing symbols.",
        )
    } else if lowered.contains("expected") || lowered.contains("parsererror") {
        ("syntax-error", "Fix the syntax error and return the complete contract, not a fragment.")
    } else {
        ("compile-error", "Fix the compilation error without changing the contract's external interface.")
    }
}

/// Runs up to `max_attempts` measure-and-decide rounds over a candidate.
pub struct AcceptanceValidator {
    profiler: Arc<dyn GasProfiler>,
    reviser: Option<Arc<dyn CandidateReviser>>,
    config: AcceptanceConfig,
}

impl AcceptanceValidator {
    pub fn new(
        profiler: Arc<dyn GasProfiler>,
        reviser: Option<Arc<dyn CandidateReviser>>,
        config: AcceptanceConfig,
    ) -> Self {
        Self { profiler, reviser, config }
    }

    /// Validate `candidate` against `baseline`.
    ///
    /// Each attempt recompiles and remeasures. An attempt that raises during
    /// compile/measure may trigger one AI corrective retry; a decided
    /// rejection keeps its verdict and burns the remaining attempts. Errors
    /// only on cancellation.
    pub async fn validate(
        &self,
        candidate: &str,
        baseline: &DynamicProfile,
        cancel: &CancellationToken,
    ) -> Result<AcceptanceOutcome, WorkerClientError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut current = candidate.to_string();
        let mut corrective_used = false;
        let mut last_decided: Option<(AcceptanceVerdict, DynamicProfile)> = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(WorkerClientError::Cancelled);
            }

            match self.profiler.profile(&current, cancel).await {
                Ok(profile) => {
                    let verdict = self.decide(baseline, &profile);
                    tracing::debug!(
                        attempt,
                        accepted = verdict.is_accepted(),
                        reason = verdict.reason(),
                        "acceptance attempt decided"
                    );
                    if verdict.is_accepted() {
                        return Ok(AcceptanceOutcome {
                            verdict,
                            profile: Some(profile),
                            attempts: attempt,
                            candidate: current,
                        });
                    }
                    last_decided = Some((verdict, profile));
                }
                Err(WorkerClientError::Cancelled) => return Err(WorkerClientError::Cancelled),
                Err(err) => {
                    tracing::debug!(attempt, error = %err, "acceptance attempt raised");
                    if !corrective_used {
                        if let Some(reviser) = &self.reviser {
                            corrective_used = true;
                            let (kind, hint) = classify_compile_error(&err.to_string());
                            match reviser.revise(&current, kind, hint, cancel).await {
                                Ok(revised) if revised != current => {
                                    tracing::info!(attempt, kind, "corrective retry revised candidate");
                                    current = revised;
                                }
                                Ok(_) => {}
                                Err(AiError::Cancelled) => {
                                    return Err(WorkerClientError::Cancelled)
                                }
                                Err(e) => {
                                    tracing::debug!(error = %e, "corrective retry failed");
                                }
                            }
                        }
                    }
                }
            }
        }

        match last_decided {
            Some((verdict, profile)) => Ok(AcceptanceOutcome {
                verdict,
                profile: Some(profile),
                attempts: max_attempts,
                candidate: current,
            }),
            None => Ok(AcceptanceOutcome {
                verdict: AcceptanceVerdict::Rejected {
                    reason: format!("No candidate passed acceptance after {max_attempts} attempts."),
                    checks: AcceptanceChecks::default(),
                },
                profile: None,
                attempts: max_attempts,
                candidate: current,
            }),
        }
    }

    /// The ordered acceptance decision over a measured profile.
    fn decide(&self, baseline: &DynamicProfile, candidate: &DynamicProfile) -> AcceptanceVerdict {
        let abi_compatible = baseline.abi.compat_entries() == candidate.abi.compat_entries();

        let deploy_pct = regression_pct(
            baseline.gas.deployment_gas as f64,
            candidate.gas.deployment_gas as f64,
        );

        let avg_before = baseline.gas.average_mutable_gas();
        let avg_after = candidate.gas.average_mutable_gas();
        let fn_pct = match (avg_before, avg_after) {
            (Some(before), Some(after)) => regression_pct(before, after),
            _ => 0.0,
        };

        let improved = candidate.gas.deployment_gas < baseline.gas.deployment_gas
            || matches!((avg_before, avg_after), (Some(b), Some(a)) if a < b);

        let checks = AcceptanceChecks {
            compiled: true,
            abi_compatible,
            deployment_gas_regression_pct: deploy_pct,
            average_mutable_function_regression_pct: fn_pct,
            improved,
        };

        if !abi_compatible {
            return AcceptanceVerdict::Rejected {
                reason: "ABI compatibility check failed.".to_string(),
                checks,
            };
        }
        if fn_pct > self.config.max_fn_regression_pct {
            return AcceptanceVerdict::Rejected {
                reason: format!(
                    "Average mutable function gas regressed {fn_pct:.2}% (limit {}%).",
                    self.config.max_fn_regression_pct
                ),
                checks,
            };
        }
        if deploy_pct > self.config.max_deploy_regression_pct {
            return AcceptanceVerdict::Rejected {
                reason: format!(
                    "Deployment gas regressed {deploy_pct:.2}% (limit {}%).",
                    self.config.max_deploy_regression_pct
                ),
                checks,
            };
        }

        let reason = if improved {
            "Candidate accepted."
        } else {
            "Candidate accepted (neutral gas result)."
        };
        AcceptanceVerdict::Accepted { reason: reason.to_string(), checks }
    }
}

#[cfg(test)]
#[path = "acceptance_tests.rs"]
mod tests;
