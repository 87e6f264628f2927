// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the AI optimization loop.

/// Errors surfaced by the provider ladder and optimizer.
///
/// Cycle-level failures (bad schema, rejected candidate) are not errors —
/// they feed the next cycle and ultimately the fallback response. Only
/// cancellation and total provider exhaustion escape as `AiError`.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Every provider/model/retry combination failed.
    #[error("All providers/models failed: {attempts}")]
    AllProvidersFailed { attempts: String },

    /// The caller's cancellation token fired.
    #[error("AI call cancelled")]
    Cancelled,

    /// No providers configured at all.
    #[error("no AI providers configured")]
    NoProviders,
}
