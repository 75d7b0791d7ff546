//! Lock-protected coordinator state.
//!
//! Everything in here is only touched while holding the coordinator's single
//! mutex. Events are pushed into the outbox from inside the critical section so
//! their order always matches the order of state changes; delivery to
//! subscribers happens elsewhere.

// Counts are always well under u32::MAX in practice
#![allow(clippy::cast_possible_truncation)]

use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pkgshelf_core::{
    DownloadEvent, DownloadRequest, DownloadStatus, QueueEntry, QueueRunSummary, QueueStatus,
};

use crate::queue::PendingQueue;

/// Lease ID for tracking active downloads.
///
/// A settlement only commits if its lease still matches the active job, so a
/// late callback can never clobber a newer entry that reuses the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct LeaseId(pub(crate) u64);

/// State for an entry holding an execution slot.
pub(crate) struct ActiveJob {
    /// Unique lease for this execution.
    pub(crate) lease: LeaseId,
    /// Cancellation handle handed to the downloader.
    pub(crate) cancel: CancellationToken,
    /// The entry, already in `Active` status.
    pub(crate) entry: QueueEntry,
}

/// Work to hand to the downloader once the lock is released.
pub(crate) struct Launch {
    pub(crate) key: String,
    pub(crate) lease: LeaseId,
    pub(crate) request: DownloadRequest,
    pub(crate) cancel: CancellationToken,
}

pub(crate) struct CoordinatorState {
    pub(crate) pending: PendingQueue,
    /// Active jobs keyed by request key, in start order.
    pub(crate) active: IndexMap<String, ActiveJob>,
    /// Current queue run (None while idle).
    pub(crate) run: Option<QueueRunSummary>,
    /// Sender side of the event outbox; dropped on dispose.
    pub(crate) outbox: Option<mpsc::UnboundedSender<DownloadEvent>>,
    pub(crate) disposed: bool,
    max_concurrent: u32,
    next_lease: u64,
}

impl CoordinatorState {
    pub(crate) fn new(max_concurrent: u32, outbox: mpsc::UnboundedSender<DownloadEvent>) -> Self {
        Self {
            pending: PendingQueue::new(),
            active: IndexMap::new(),
            run: None,
            outbox: Some(outbox),
            disposed: false,
            max_concurrent,
            next_lease: 0,
        }
    }

    /// Whether a key is live in either collection.
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.active.contains_key(key) || self.pending.contains(key)
    }

    pub(crate) fn status(&self) -> QueueStatus {
        QueueStatus {
            queued: self.pending.len() as u32,
            active: self.active.len() as u32,
            max_concurrent: self.max_concurrent,
        }
    }

    /// Queue an event for delivery. No-op once disposed.
    pub(crate) fn publish(&self, event: DownloadEvent) {
        if let Some(outbox) = &self.outbox {
            // The receiver only goes away with the runtime; nothing to do then.
            let _ = outbox.send(event);
        }
    }

    pub(crate) fn publish_status(&self) {
        self.publish(DownloadEvent::status_changed(self.status()));
    }

    /// Open a queue run if the coordinator is currently idle.
    pub(crate) fn begin_run_if_idle(&mut self) {
        if self.run.is_none() {
            self.run = Some(QueueRunSummary::begin());
        }
    }

    /// Promote pending entries into free slots, FIFO.
    ///
    /// Publishes one `DownloadStarted` per promotion and, if anything moved, a
    /// status event with the new counts. The returned launches must be spawned
    /// after the lock is released.
    pub(crate) fn dispatch(&mut self) -> Vec<Launch> {
        let mut launches = Vec::new();

        while self.status().free_slots() > 0 {
            let Some(mut entry) = self.pending.pop_front() else {
                break;
            };

            entry.mark_active();
            let lease = LeaseId(self.next_lease);
            self.next_lease += 1;
            let cancel = CancellationToken::new();

            launches.push(Launch {
                key: entry.key.clone(),
                lease,
                request: entry.request.clone(),
                cancel: cancel.clone(),
            });
            self.publish(DownloadEvent::started(entry.clone()));
            self.active.insert(
                entry.key.clone(),
                ActiveJob {
                    lease,
                    cancel,
                    entry,
                },
            );
        }

        if !launches.is_empty() {
            self.publish_status();
        }
        launches
    }

    /// Remove the active job for `key` if its lease matches.
    pub(crate) fn take_active(&mut self, key: &str, lease: LeaseId) -> Option<ActiveJob> {
        if self.active.get(key).is_some_and(|job| job.lease == lease) {
            // shift_remove keeps start order for snapshots
            self.active.shift_remove(key)
        } else {
            None
        }
    }

    pub(crate) fn record_settlement(&mut self, status: DownloadStatus) {
        if let Some(run) = self.run.as_mut() {
            run.record(status);
        }
    }

    pub(crate) fn record_removed(&mut self, count: usize) {
        if let Some(run) = self.run.as_mut() {
            run.record_removed(count);
        }
    }

    /// Close the current run and publish its summary if nothing is left.
    pub(crate) fn finish_run_if_drained(&mut self) -> Option<QueueRunSummary> {
        if !self.pending.is_empty() || !self.active.is_empty() {
            return None;
        }
        let summary = self.run.take()?.finish();
        self.publish(DownloadEvent::drained(summary.clone()));
        Some(summary)
    }

    /// Lease the next promotion will receive.
    #[cfg(test)]
    pub(crate) const fn peek_next_lease(&self) -> LeaseId {
        LeaseId(self.next_lease)
    }
}
