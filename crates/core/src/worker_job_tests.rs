// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use yare::parameterized;

#[test]
fn new_job_is_queued_with_one_attempt() {
    let clock = FakeClock::new();
    let job = WorkerJob::new("contract A {}", &clock);
    assert_eq!(job.status, WorkerStatus::Queued);
    assert_eq!(job.attempts, 1);
    assert!(job.retry_of.is_none());
    assert!(!job.is_terminal());
}

#[parameterized(
    queued_to_processing = { WorkerStatus::Queued, WorkerStatus::Processing, true },
    queued_to_cancelled = { WorkerStatus::Queued, WorkerStatus::Cancelled, true },
    queued_to_completed = { WorkerStatus::Queued, WorkerStatus::Completed, false },
    processing_to_completed = { WorkerStatus::Processing, WorkerStatus::Completed, true },
    processing_to_failed = { WorkerStatus::Processing, WorkerStatus::Failed, true },
    processing_to_cancelled = { WorkerStatus::Processing, WorkerStatus::Cancelled, true },
    completed_to_processing = { WorkerStatus::Completed, WorkerStatus::Processing, false },
    failed_to_processing = { WorkerStatus::Failed, WorkerStatus::Processing, false },
    cancelled_to_queued = { WorkerStatus::Cancelled, WorkerStatus::Queued, false },
)]
fn transition_legality(from: WorkerStatus, to: WorkerStatus, legal: bool) {
    assert_eq!(from.can_transition_to(to), legal);
}

#[parameterized(
    failed = { WorkerStatus::Failed, true },
    cancelled = { WorkerStatus::Cancelled, true },
    completed = { WorkerStatus::Completed, false },
    queued = { WorkerStatus::Queued, false },
    processing = { WorkerStatus::Processing, false },
)]
fn retryability(status: WorkerStatus, retryable: bool) {
    assert_eq!(status.is_retryable(), retryable);
}

#[test]
fn retry_builds_new_record_with_back_pointer() {
    let clock = FakeClock::new();
    let mut prior = WorkerJob::new("contract A {}", &clock);
    prior.status = WorkerStatus::Failed;
    prior.error = Some("boom".to_string());

    let retried = WorkerJob::retry_from(&prior, &clock);
    assert_ne!(retried.id, prior.id);
    assert_eq!(retried.attempts, 2);
    assert_eq!(retried.retry_of, Some(prior.id));
    assert_eq!(retried.status, WorkerStatus::Queued);
    assert!(retried.error.is_none());
    assert_eq!(retried.source, prior.source);

    // The prior record is untouched.
    assert_eq!(prior.status, WorkerStatus::Failed);
    assert_eq!(prior.attempts, 1);
}

#[test]
fn status_serializes_snake_case() {
    let json = serde_json::to_string(&WorkerStatus::Processing).unwrap();
    assert_eq!(json, "\"processing\"");
}

#[test]
fn job_round_trips_through_json() {
    let clock = FakeClock::new();
    let mut job = WorkerJob::new("contract A {}", &clock);
    job.status = WorkerStatus::Failed;
    job.error = Some("compile error".to_string());

    let json = serde_json::to_string(&job).unwrap();
    let parsed: WorkerJob = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.id, job.id);
    assert_eq!(parsed.status, job.status);
    assert_eq!(parsed.error, job.error);
    assert_eq!(parsed.attempts, job.attempts);
}
