//! Download events - discriminated union for all queue state changes.

use serde::{Deserialize, Serialize};

use super::completion::QueueRunSummary;
use super::errors::DownloadError;
use super::queue::{QueueEntry, QueueStatus};

/// Single discriminated union for all download queue notifications.
///
/// Serialized with a `type` tag so UI bridges can switch on it:
///
/// ```typescript
/// type DownloadEvent =
///   | { type: "download_queued"; entry: QueueEntry }
///   | { type: "download_removed"; entry: QueueEntry }
///   | { type: "download_started"; entry: QueueEntry }
///   | { type: "download_completed"; entry: QueueEntry; bytes: number }
///   | { type: "download_failed"; entry: QueueEntry; error: DownloadError }
///   | { type: "download_cancelled"; entry: QueueEntry }
///   | { type: "queue_status_changed"; status: QueueStatus }
///   | { type: "queue_drained"; summary: QueueRunSummary };
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// An entry was accepted into the pending queue.
    DownloadQueued {
        /// The new entry.
        entry: QueueEntry,
    },

    /// A pending entry was removed before it started.
    DownloadRemoved {
        /// The removed entry.
        entry: QueueEntry,
    },

    /// An entry was promoted into an execution slot.
    DownloadStarted {
        /// The now-active entry.
        entry: QueueEntry,
    },

    /// The downloader finished successfully.
    DownloadCompleted {
        /// The settled entry.
        entry: QueueEntry,
        /// Bytes reported by the downloader.
        bytes: u64,
    },

    /// The downloader failed.
    DownloadFailed {
        /// The settled entry.
        entry: QueueEntry,
        /// Underlying cause.
        error: DownloadError,
    },

    /// An active entry was cancelled.
    DownloadCancelled {
        /// The settled entry.
        entry: QueueEntry,
    },

    /// Pending/active counts changed.
    QueueStatusChanged {
        /// Counts after the change.
        status: QueueStatus,
    },

    /// The queue went from busy to idle.
    QueueDrained {
        /// Everything that happened during the run.
        summary: QueueRunSummary,
    },
}

impl DownloadEvent {
    /// Create a queued event.
    pub const fn queued(entry: QueueEntry) -> Self {
        Self::DownloadQueued { entry }
    }

    /// Create a removed event.
    pub const fn removed(entry: QueueEntry) -> Self {
        Self::DownloadRemoved { entry }
    }

    /// Create a started event.
    pub const fn started(entry: QueueEntry) -> Self {
        Self::DownloadStarted { entry }
    }

    /// Create a completed event.
    pub const fn completed(entry: QueueEntry, bytes: u64) -> Self {
        Self::DownloadCompleted { entry, bytes }
    }

    /// Create a failed event.
    pub const fn failed(entry: QueueEntry, error: DownloadError) -> Self {
        Self::DownloadFailed { entry, error }
    }

    /// Create a cancelled event.
    pub const fn cancelled(entry: QueueEntry) -> Self {
        Self::DownloadCancelled { entry }
    }

    /// Create a status changed event.
    #[must_use]
    pub const fn status_changed(status: QueueStatus) -> Self {
        Self::QueueStatusChanged { status }
    }

    /// Create a queue drained event.
    pub const fn drained(summary: QueueRunSummary) -> Self {
        Self::QueueDrained { summary }
    }

    /// Get the entry carried by per-download events.
    #[must_use]
    pub const fn entry(&self) -> Option<&QueueEntry> {
        match self {
            Self::DownloadQueued { entry }
            | Self::DownloadRemoved { entry }
            | Self::DownloadStarted { entry }
            | Self::DownloadCompleted { entry, .. }
            | Self::DownloadFailed { entry, .. }
            | Self::DownloadCancelled { entry } => Some(entry),
            Self::QueueStatusChanged { .. } | Self::QueueDrained { .. } => None,
        }
    }

    /// Get the request key from any per-download event.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.entry().map(|entry| entry.key.as_str())
    }

    /// Whether this event ends an entry's life in the coordinator.
    #[must_use]
    pub const fn is_settlement(&self) -> bool {
        matches!(
            self,
            Self::DownloadCompleted { .. }
                | Self::DownloadFailed { .. }
                | Self::DownloadCancelled { .. }
        )
    }

    /// Get the event name for wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::DownloadQueued { .. } => "download:queued",
            Self::DownloadRemoved { .. } => "download:removed",
            Self::DownloadStarted { .. } => "download:started",
            Self::DownloadCompleted { .. } => "download:completed",
            Self::DownloadFailed { .. } => "download:failed",
            Self::DownloadCancelled { .. } => "download:cancelled",
            Self::QueueStatusChanged { .. } => "download:queue_status",
            Self::QueueDrained { .. } => "download:queue_drained",
        }
    }
}
