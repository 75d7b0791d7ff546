//! Bounded-concurrency download coordinator.
//!
//! Accepts download requests, keeps at most `max_concurrent` of them running
//! through the `DownloaderPort`, and publishes lifecycle events.
//!
//! # Concurrency Model
//!
//! - One `std::sync::Mutex` guards pending, active, the run tracker and the
//!   outbox sender. Every mutation and every count read happens under it.
//! - Public operations never await: they update state, queue events and
//!   return. Only the downloader call is long-running, on its own task.
//! - Events are queued inside the critical section and delivered by a single
//!   task outside it (see `outbox`).
//! - Lease tokens prevent stale settlements from touching a newer entry that
//!   reuses a key.

mod builder;
mod outbox;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use pkgshelf_core::{
    DownloadError, DownloadEvent, DownloadRequest, DownloadResult, DownloadStatus, DownloaderPort,
    QueueEntry, QueueSnapshot, QueueStatus,
};

use state::{CoordinatorState, Launch, LeaseId};

pub use builder::CoordinatorBuilder;

/// The download queue coordinator.
///
/// Cheap to clone; all clones share one queue. Every operation is safe to call
/// from any thread, including from inside event subscribers.
#[derive(Clone)]
pub struct DownloadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    downloader: Arc<dyn DownloaderPort>,
    max_concurrent: u32,
    state: Mutex<CoordinatorState>,
    /// Set on dispose; the delivery task checks it before every event.
    closed: Arc<AtomicBool>,
    /// Tracks the delivery task and every transfer/settlement task.
    tasks: TaskTracker,
    runtime: Handle,
}

impl DownloadCoordinator {
    /// Start building a coordinator.
    #[must_use]
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// Queue a request under `key`.
    ///
    /// Returns `false` without changing anything if the key is blank, already
    /// pending or active, or the coordinator has been disposed.
    pub fn enqueue(&self, key: &str, request: DownloadRequest) -> bool {
        self.try_enqueue(key, request).is_ok()
    }

    /// Queue a request under its own `key` field.
    pub fn submit(&self, request: DownloadRequest) -> bool {
        let key = request.key.clone();
        self.enqueue(&key, request)
    }

    /// Like `enqueue`, but reports why a request was rejected.
    pub fn try_enqueue(&self, key: &str, mut request: DownloadRequest) -> DownloadResult<()> {
        if key.trim().is_empty() {
            tracing::debug!(target: "pkgshelf.download", "Rejected blank download key");
            return Err(DownloadError::InvalidKey);
        }
        key.clone_into(&mut request.key);

        let launches = {
            let mut state = self.inner.lock_state();
            if state.disposed {
                return Err(DownloadError::ShutDown);
            }
            if state.contains(key) {
                tracing::debug!(target: "pkgshelf.download", key, "Rejected duplicate download");
                return Err(DownloadError::already_queued(key));
            }

            state.begin_run_if_idle();
            let entry = QueueEntry::new(key, request);
            let position = state.pending.push(entry.clone())?;
            tracing::info!(target: "pkgshelf.download", key, position, "Download queued");

            state.publish(DownloadEvent::queued(entry));
            state.publish_status();
            state.dispatch()
        };

        self.inner.launch_all(launches);
        Ok(())
    }

    /// Remove a pending entry. Active entries are not touched.
    pub fn remove_from_queue(&self, key: &str) -> bool {
        self.try_remove_from_queue(key).is_ok()
    }

    /// Like `remove_from_queue`, but returns the removed entry.
    pub fn try_remove_from_queue(&self, key: &str) -> DownloadResult<QueueEntry> {
        let mut state = self.inner.lock_state();
        if state.disposed {
            return Err(DownloadError::ShutDown);
        }
        Inner::remove_pending(&mut state, key)
    }

    /// Cancel a pending or active download.
    ///
    /// Pending entries are removed immediately. Active entries only have their
    /// cancellation requested; the slot frees up when the downloader settles.
    pub fn cancel_download(&self, key: &str) -> bool {
        self.try_cancel_download(key).is_ok()
    }

    /// Like `cancel_download`, but reports why nothing happened.
    pub fn try_cancel_download(&self, key: &str) -> DownloadResult<()> {
        let mut state = self.inner.lock_state();
        if state.disposed {
            return Err(DownloadError::ShutDown);
        }

        if let Some(job) = state.active.get(key) {
            job.cancel.cancel();
            tracing::info!(target: "pkgshelf.download", key, "Cancellation requested for active download");
            return Ok(());
        }

        Inner::remove_pending(&mut state, key).map(|_| ())
    }

    /// Drop every pending entry. Active downloads keep running.
    ///
    /// Returns the number of entries removed.
    pub fn clear_queue(&self) -> usize {
        let mut state = self.inner.lock_state();
        if state.disposed {
            return 0;
        }

        let removed = state.pending.clear().len();
        state.record_removed(removed);
        state.publish_status();
        state.finish_run_if_drained();
        tracing::info!(target: "pkgshelf.download", removed, "Cleared download queue");
        removed
    }

    /// Copies of the pending entries in dispatch order.
    pub fn queued_downloads(&self) -> Vec<QueueEntry> {
        self.inner.lock_state().pending.entries()
    }

    /// Copies of the active entries in start order.
    pub fn active_downloads(&self) -> Vec<QueueEntry> {
        self.inner
            .lock_state()
            .active
            .values()
            .map(|job| job.entry.clone())
            .collect()
    }

    /// Number of pending entries.
    pub fn queued_count(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    /// Number of entries holding a slot.
    pub fn active_count(&self) -> usize {
        self.inner.lock_state().active.len()
    }

    /// The enforced concurrency ceiling.
    pub fn max_concurrent(&self) -> u32 {
        self.inner.max_concurrent
    }

    /// Current counts.
    pub fn status(&self) -> QueueStatus {
        self.inner.lock_state().status()
    }

    /// Consistent copy of both collections and the counts.
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.lock_state();
        QueueSnapshot {
            pending: state.pending.entries(),
            active: state.active.values().map(|job| job.entry.clone()).collect(),
            status: state.status(),
        }
    }

    /// Whether `key` is pending or active.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock_state().contains(key)
    }

    /// Whether `dispose` has run.
    pub fn is_disposed(&self) -> bool {
        self.inner.lock_state().disposed
    }

    /// Stop the coordinator.
    ///
    /// The first call requests cancellation of every active download, drops
    /// pending entries and silences all further notifications. Later calls do
    /// nothing. Returns whether this call performed the shutdown.
    ///
    /// Events published before this call but not yet handed to the emitter
    /// are dropped, so an accepted `enqueue` followed immediately by
    /// `dispose` may never produce its `DownloadQueued` notification.
    /// Subscribers that need a final tally should wait for `QueueDrained`
    /// before disposing.
    pub fn dispose(&self) -> bool {
        let mut state = self.inner.lock_state();
        if state.disposed {
            return false;
        }

        state.disposed = true;
        self.inner.closed.store(true, Ordering::Release);
        state.outbox = None;
        state.run = None;

        for job in state.active.values() {
            job.cancel.cancel();
        }
        let dropped = state.pending.clear().len();
        let cancelled = state.active.len();
        drop(state);

        self.inner.tasks.close();
        tracing::info!(
            target: "pkgshelf.download",
            cancelled,
            dropped,
            "Download coordinator disposed"
        );
        true
    }

    /// Dispose, then wait until every background task has finished.
    pub async fn shutdown(&self) {
        self.dispose();
        self.inner.tasks.wait().await;
    }
}

impl Inner {
    fn new(
        downloader: Arc<dyn DownloaderPort>,
        max_concurrent: u32,
        outbox: mpsc::UnboundedSender<DownloadEvent>,
        closed: Arc<AtomicBool>,
        tasks: TaskTracker,
        runtime: Handle,
    ) -> Self {
        Self {
            downloader,
            max_concurrent,
            state: Mutex::new(CoordinatorState::new(max_concurrent, outbox)),
            closed,
            tasks,
            runtime,
        }
    }

    /// Lock the state, recovering from poisoning.
    ///
    /// No code path panics while holding the lock, and a poisoned queue is
    /// still structurally valid, so dispose must keep working regardless.
    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_pending(state: &mut CoordinatorState, key: &str) -> DownloadResult<QueueEntry> {
        let entry = state.pending.remove(key)?;
        tracing::info!(target: "pkgshelf.download", key, "Removed download from queue");

        state.record_removed(1);
        state.publish(DownloadEvent::removed(entry.clone()));
        state.publish_status();
        state.finish_run_if_drained();
        Ok(entry)
    }

    fn launch_all(self: &Arc<Self>, launches: Vec<Launch>) {
        for launch in launches {
            self.launch(launch);
        }
    }

    /// Hand one promoted entry to the downloader.
    ///
    /// The transfer runs on its own task so that a panic inside the downloader
    /// surfaces as a `JoinError` at the settlement boundary instead of taking
    /// the settlement down with it.
    fn launch(self: &Arc<Self>, launch: Launch) {
        let Launch {
            key,
            lease,
            request,
            cancel,
        } = launch;

        tracing::info!(target: "pkgshelf.download", key = %key, source = %request.source, "Download started");

        let downloader = Arc::clone(&self.downloader);
        let transfer = self
            .tasks
            .spawn_on(async move { downloader.run(request, cancel).await }, &self.runtime);

        let inner = Arc::clone(self);
        self.tasks.spawn_on(
            async move {
                let result = match transfer.await {
                    Ok(result) => result,
                    Err(join_err) => Err(DownloadError::other(format!(
                        "downloader task failed: {join_err}"
                    ))),
                };
                inner.settle(&key, lease, result);
            },
            &self.runtime,
        );
    }

    /// Commit the outcome of one transfer and refill the freed slot.
    fn settle(self: &Arc<Self>, key: &str, lease: LeaseId, result: DownloadResult<u64>) {
        let launches = {
            let mut state = self.lock_state();
            let Some(job) = state.take_active(key, lease) else {
                tracing::debug!(target: "pkgshelf.download", key, "Ignoring stale settlement (lease mismatch)");
                return;
            };

            let mut entry = job.entry;
            let event = match result {
                Ok(bytes) => {
                    entry.finish(DownloadStatus::Completed, None);
                    tracing::info!(target: "pkgshelf.download", key, bytes, "Download completed");
                    DownloadEvent::completed(entry, bytes)
                }
                Err(e) if e.is_cancelled() || job.cancel.is_cancelled() => {
                    entry.finish(DownloadStatus::Cancelled, None);
                    tracing::info!(target: "pkgshelf.download", key, "Download cancelled");
                    DownloadEvent::cancelled(entry)
                }
                Err(e) => {
                    entry.finish(DownloadStatus::Failed, Some(e.to_string()));
                    tracing::warn!(target: "pkgshelf.download", key, error = %e, "Download failed");
                    DownloadEvent::failed(entry, e)
                }
            };

            if state.disposed {
                return;
            }

            if let Some(status) = event.entry().map(|entry| entry.status) {
                state.record_settlement(status);
            }
            state.publish(event);
            state.publish_status();
            let launches = state.dispatch();
            state.finish_run_if_drained();
            launches
        };

        self.launch_all(launches);
    }
}
