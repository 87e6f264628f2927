// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job progress fan-out with backlog-then-live delivery.
//!
//! The bus itself is not synchronized; it lives inside the registry's state
//! lock so that subscribing (snapshot the backlog, attach the sender) and
//! publishing are atomic with respect to each other. Each subscriber owns a
//! bounded channel; a subscriber whose buffer fills is closed, the others
//! keep receiving in order.

use std::collections::HashMap;
use tokio::sync::mpsc;

use gz_core::{AnalysisJobId, ProgressEvent};

/// Live-event headroom on top of the backlog for each subscriber.
pub const SUBSCRIBER_BUFFER: usize = 256;

#[derive(Default)]
pub struct ProgressBus {
    subscribers: HashMap<AnalysisJobId, Vec<mpsc::Sender<ProgressEvent>>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every live subscriber of `id`.
    ///
    /// Subscribers that have hung up or overflowed their buffer are dropped;
    /// delivery to the rest is unaffected.
    pub fn publish(&mut self, id: AnalysisJobId, event: &ProgressEvent) {
        if let Some(senders) = self.subscribers.get_mut(&id) {
            senders.retain(|tx| tx.try_send(event.clone()).is_ok());
            if senders.is_empty() {
                self.subscribers.remove(&id);
            }
        }
    }

    /// Attach a subscriber, delivering `backlog` first.
    ///
    /// When `live` is false (the job is already terminal) the sender is not
    /// retained: the receiver drains the backlog and then ends.
    pub fn subscribe(
        &mut self,
        id: AnalysisJobId,
        backlog: &[ProgressEvent],
        live: bool,
    ) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(backlog.len() + SUBSCRIBER_BUFFER);
        for event in backlog {
            // Capacity covers the whole backlog; failure means the receiver
            // already hung up.
            let _ = tx.try_send(event.clone());
        }
        if live {
            self.subscribers.entry(id).or_default().push(tx);
        }
        rx
    }

    /// Detach every subscriber of `id` (used once a job is terminal, after
    /// the terminal event has been published).
    pub fn clear(&mut self, id: AnalysisJobId) {
        self.subscribers.remove(&id);
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, id: AnalysisJobId) -> usize {
        self.subscribers.get(&id).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
