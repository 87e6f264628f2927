// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gz_core::{Clock, FakeClock};

#[test]
fn analysis_view_never_carries_source() {
    let clock = FakeClock::new();
    let mut job = AnalysisJob::new("contract Secret { uint256 private key; }", &clock);
    job.record_event("Analysis queued.", clock.epoch_ms());

    let view = AnalysisJobView::from(&job);
    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains("Secret"));
    assert_eq!(view.status, AnalysisPhase::Queued);
    assert_eq!(view.events.len(), 1);
}

#[test]
fn worker_view_never_carries_source() {
    let clock = FakeClock::new();
    let job = WorkerJob::new("contract Secret {}", &clock);

    let view = WorkerJobView::from(&job);
    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains("Secret"));
    assert_eq!(view.status, WorkerStatus::Queued);
    assert_eq!(view.attempts, 1);
    assert!(view.retry_of.is_none());
}

#[test]
fn worker_view_carries_retry_pointer() {
    let clock = FakeClock::new();
    let mut prior = WorkerJob::new("contract A {}", &clock);
    prior.status = WorkerStatus::Failed;
    let retried = WorkerJob::retry_from(&prior, &clock);

    let view = WorkerJobView::from(&retried);
    assert_eq!(view.retry_of.as_deref(), Some(prior.id.as_str()));
    assert_eq!(view.attempts, 2);
}

#[test]
fn view_json_uses_camel_case_keys() {
    let clock = FakeClock::new();
    let job = AnalysisJob::new("contract A {}", &clock);
    let json = serde_json::to_value(AnalysisJobView::from(&job)).unwrap();
    assert!(json.get("jobId").is_some());
    assert!(json.get("cancelRequested").is_some());
    assert!(json.get("createdAtMs").is_some());
}
