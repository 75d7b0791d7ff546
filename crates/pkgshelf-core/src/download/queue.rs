//! Queue DTOs for snapshots and notifications.
//!
//! These types are "UI safe": Clone + Debug + Serialize + Deserialize with no
//! infrastructure dependencies. Cancellation handles live in the coordinator,
//! never in these copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{DownloadRequest, DownloadStatus};

/// A download request together with its lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Request key (unique among live entries).
    pub key: String,
    /// The submitted request.
    pub request: DownloadRequest,
    /// Current status.
    pub status: DownloadStatus,
    /// When the entry was accepted.
    pub enqueued_at: DateTime<Utc>,
    /// When the entry was promoted to an execution slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the entry reached a terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message if status is Failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueueEntry {
    /// Create a freshly queued entry.
    pub fn new(key: impl Into<String>, request: DownloadRequest) -> Self {
        Self {
            key: key.into(),
            request,
            status: DownloadStatus::Queued,
            enqueued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// Mark the entry as occupying a slot.
    pub fn mark_active(&mut self) {
        self.status = DownloadStatus::Active;
        self.started_at = Some(Utc::now());
    }

    /// Move the entry to a terminal status.
    ///
    /// Only the first terminal transition is recorded; later calls are ignored.
    pub fn finish(&mut self, status: DownloadStatus, error: Option<String>) {
        debug_assert!(status.is_terminal());
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.error = error;
    }

    /// Time spent in the slot, if the entry has started and finished.
    pub fn run_time(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

/// Aggregate counts published with every status change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Number of pending entries.
    pub queued: u32,
    /// Number of entries holding a slot.
    pub active: u32,
    /// The concurrency ceiling.
    pub max_concurrent: u32,
}

impl QueueStatus {
    /// Whether nothing is pending or running.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.queued == 0 && self.active == 0
    }

    /// Number of free execution slots.
    #[must_use]
    pub const fn free_slots(&self) -> u32 {
        self.max_concurrent.saturating_sub(self.active)
    }
}

/// Point-in-time copy of the whole queue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Pending entries in dispatch order.
    pub pending: Vec<QueueEntry>,
    /// Active entries in start order.
    pub active: Vec<QueueEntry>,
    /// Counts at the time of the snapshot.
    pub status: QueueStatus,
}

impl QueueSnapshot {
    /// Look up an entry by key in either collection.
    pub fn get(&self, key: &str) -> Option<&QueueEntry> {
        self.active
            .iter()
            .chain(self.pending.iter())
            .find(|entry| entry.key == key)
    }

    /// Total number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.active.len()
    }

    /// Whether the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }
}
