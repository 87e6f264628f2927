// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use proptest::prelude::*;

#[test]
fn new_job_starts_queued() {
    let clock = FakeClock::new();
    let job = AnalysisJob::new("contract A {}", &clock);
    assert_eq!(job.phase, AnalysisPhase::Queued);
    assert!(!job.is_terminal());
    assert!(job.events.is_empty());
    assert_eq!(job.created_at_ms, clock.epoch_ms());
}

#[test]
fn pipeline_walks_phases_in_order() {
    let clock = FakeClock::new();
    let mut job = AnalysisJob::new("contract A {}", &clock);

    for next in [
        AnalysisPhase::StaticAnalysis,
        AnalysisPhase::DynamicAnalysis,
        AnalysisPhase::AiOptimization,
        AnalysisPhase::Completed,
    ] {
        job.transition(next, clock.epoch_ms()).unwrap();
        assert_eq!(job.phase, next);
    }
    assert!(job.is_terminal());
}

#[test]
fn queued_cannot_jump_to_completed() {
    let clock = FakeClock::new();
    let mut job = AnalysisJob::new("contract A {}", &clock);
    let err = job.transition(AnalysisPhase::Completed, clock.epoch_ms()).unwrap_err();
    assert_eq!(err.from, AnalysisPhase::Queued);
    assert_eq!(err.to, AnalysisPhase::Completed);
}

#[test]
fn any_nonterminal_phase_can_fail_or_cancel() {
    for phase in [
        AnalysisPhase::Queued,
        AnalysisPhase::StaticAnalysis,
        AnalysisPhase::DynamicAnalysis,
        AnalysisPhase::AiOptimization,
    ] {
        assert!(phase.can_transition_to(AnalysisPhase::Failed));
        assert!(phase.can_transition_to(AnalysisPhase::Cancelled));
    }
}

#[test]
fn terminal_phases_admit_no_transitions() {
    for phase in [AnalysisPhase::Completed, AnalysisPhase::Failed, AnalysisPhase::Cancelled] {
        for next in [
            AnalysisPhase::Queued,
            AnalysisPhase::StaticAnalysis,
            AnalysisPhase::DynamicAnalysis,
            AnalysisPhase::AiOptimization,
            AnalysisPhase::Completed,
            AnalysisPhase::Failed,
            AnalysisPhase::Cancelled,
        ] {
            assert!(!phase.can_transition_to(next), "{phase} -> {next} should be illegal");
        }
    }
}

#[test]
fn events_carry_current_phase() {
    let clock = FakeClock::new();
    let mut job = AnalysisJob::new("contract A {}", &clock);
    job.record_event("Analysis queued.", clock.epoch_ms());
    job.transition(AnalysisPhase::StaticAnalysis, clock.epoch_ms()).unwrap();
    job.record_event("Parsing Solidity source.", clock.epoch_ms());

    assert_eq!(job.events[0].phase, AnalysisPhase::Queued);
    assert_eq!(job.events[1].phase, AnalysisPhase::StaticAnalysis);
}

#[test]
fn event_timestamps_never_decrease() {
    let clock = FakeClock::new();
    let mut job = AnalysisJob::new("contract A {}", &clock);
    clock.set_epoch_ms(5_000);
    job.record_event("one", clock.epoch_ms());
    // Clock stepping backwards must not produce a decreasing timestamp.
    clock.set_epoch_ms(4_000);
    job.record_event("two", clock.epoch_ms());

    assert_eq!(job.events[0].timestamp, 5_000);
    assert_eq!(job.events[1].timestamp, 5_000);
}

#[test]
fn phase_serializes_snake_case() {
    let json = serde_json::to_string(&AnalysisPhase::AiOptimization).unwrap();
    assert_eq!(json, "\"ai_optimization\"");
    let parsed: AnalysisPhase = serde_json::from_str("\"static_analysis\"").unwrap();
    assert_eq!(parsed, AnalysisPhase::StaticAnalysis);
}

proptest! {
    /// Recorded event timestamps are non-decreasing for any input sequence.
    #[test]
    fn recorded_timestamps_monotonic(stamps in proptest::collection::vec(0u64..10_000, 1..40)) {
        let clock = FakeClock::new();
        let mut job = AnalysisJob::new("contract A {}", &clock);
        for ms in stamps {
            job.record_event("tick", ms);
        }
        for pair in job.events.windows(2) {
            prop_assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }
}
