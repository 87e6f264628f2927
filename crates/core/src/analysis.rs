// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analysis job identifier, phase machine, and progress events.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::outcome::AnalysisResult;

crate::define_id! {
    /// Unique identifier for an analysis job.
    pub struct AnalysisJobId("ajob-");
}

/// Phase/status of an analysis job.
///
/// The first four are non-terminal pipeline phases; the last three are
/// terminal. Legal transitions walk the pipeline in order, and any
/// non-terminal phase may jump to `Failed` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Queued,
    StaticAnalysis,
    DynamicAnalysis,
    AiOptimization,
    Completed,
    Failed,
    Cancelled,
}

impl AnalysisPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisPhase::Completed | AnalysisPhase::Failed | AnalysisPhase::Cancelled
        )
    }

    /// Whether moving to `next` is a legal transition.
    ///
    /// `Completed` is only reachable from `AiOptimization`; terminal phases
    /// admit no further transitions.
    pub fn can_transition_to(&self, next: AnalysisPhase) -> bool {
        use AnalysisPhase::*;
        if self.is_terminal() {
            return false;
        }
        match next {
            StaticAnalysis => *self == Queued,
            DynamicAnalysis => *self == StaticAnalysis,
            AiOptimization => *self == DynamicAnalysis,
            Completed => *self == AiOptimization,
            Failed | Cancelled => true,
            Queued => false,
        }
    }
}

crate::simple_display! {
    AnalysisPhase {
        Queued => "queued",
        StaticAnalysis => "static_analysis",
        DynamicAnalysis => "dynamic_analysis",
        AiOptimization => "ai_optimization",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// A single progress message, stamped with the phase the job was in when it
/// was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub phase: AnalysisPhase,
    pub message: String,
    pub timestamp: u64,
}

/// An illegal phase transition was attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: AnalysisPhase,
    pub to: AnalysisPhase,
}

/// An analysis job: submitted source, phase, progress backlog, and terminal
/// outcome. Owned exclusively by the orchestrator's job registry; never
/// deleted (terminal records back the proof endpoints).
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub id: AnalysisJobId,
    pub source: String,
    pub phase: AnalysisPhase,
    pub events: Vec<ProgressEvent>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub cancel_requested: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl AnalysisJob {
    pub fn new(source: impl Into<String>, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            id: AnalysisJobId::new(),
            source: source.into(),
            phase: AnalysisPhase::Queued,
            events: Vec::new(),
            result: None,
            error: None,
            cancel_requested: false,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Record a progress event in the current phase.
    ///
    /// Timestamps are clamped to be non-decreasing across the backlog even
    /// if the clock steps backwards.
    pub fn record_event(&mut self, message: impl Into<String>, now_ms: u64) -> ProgressEvent {
        let floor = self.events.last().map(|e| e.timestamp).unwrap_or(0);
        let event = ProgressEvent {
            phase: self.phase,
            message: message.into(),
            timestamp: now_ms.max(floor),
        };
        self.events.push(event.clone());
        self.updated_at_ms = now_ms.max(self.updated_at_ms);
        event
    }

    /// Move to `next`, enforcing the legal transition graph.
    pub fn transition(&mut self, next: AnalysisPhase, now_ms: u64) -> Result<(), IllegalTransition> {
        if !self.phase.can_transition_to(next) {
            return Err(IllegalTransition { from: self.phase, to: next });
        }
        self.phase = next;
        self.updated_at_ms = now_ms.max(self.updated_at_ms);
        Ok(())
    }
}

crate::builder! {
    pub struct AnalysisJobBuilder => AnalysisJob {
        into {
            source: String = "contract Demo {}",
        }
        set {
            phase: AnalysisPhase = AnalysisPhase::Queued,
            events: Vec<ProgressEvent> = Vec::new(),
            cancel_requested: bool = false,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            result: AnalysisResult = None,
            error: String = None,
        }
        computed {
            id: AnalysisJobId = AnalysisJobId::new(),
        }
    }
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
