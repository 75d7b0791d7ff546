//! Queue run completion tracking types.
//!
//! A queue run spans the idle→busy and busy→idle transitions of the
//! coordinator. Its summary is published once when the queue drains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::DownloadStatus;

/// Summary of everything that settled during one queue run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRunSummary {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the first entry of the run was accepted.
    pub started_at: DateTime<Utc>,
    /// When the queue drained (set on `finish`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Entries that completed successfully.
    pub completed: u32,
    /// Entries that failed.
    pub failed: u32,
    /// Active entries that were cancelled.
    pub cancelled: u32,
    /// Pending entries removed, cancelled or cleared before they started.
    pub removed: u32,
}

impl QueueRunSummary {
    /// Start a new run.
    #[must_use]
    pub fn begin() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            completed: 0,
            failed: 0,
            cancelled: 0,
            removed: 0,
        }
    }

    /// Tally a settlement.
    pub const fn record(&mut self, status: DownloadStatus) {
        match status {
            DownloadStatus::Completed => self.completed += 1,
            DownloadStatus::Failed => self.failed += 1,
            DownloadStatus::Cancelled => self.cancelled += 1,
            DownloadStatus::Queued | DownloadStatus::Active => {}
        }
    }

    /// Tally pending entries dropped before they started.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn record_removed(&mut self, count: usize) {
        self.removed += count as u32;
    }

    /// Close the run.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Total number of settled or removed entries.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.completed + self.failed + self.cancelled + self.removed
    }

    /// Whether every entry that ran finished successfully.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}
