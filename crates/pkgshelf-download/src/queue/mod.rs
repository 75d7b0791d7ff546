//! Pending download queue.
//!
//! A pure FIFO state machine for entries waiting for a slot.
//!
//! # Design
//!
//! - Synchronous, no I/O, no tracing, no locking
//! - The coordinator owns synchronization and event emission
//! - Deterministic: same inputs always produce same outputs
//!
//! # Position Semantics
//!
//! Positions are 1-based over pending entries only: position 1 is the next
//! entry to be promoted when a slot frees up.

// Queue positions are always well under u32::MAX in practice
#![allow(clippy::cast_possible_truncation)]

use std::collections::VecDeque;

use pkgshelf_core::{DownloadError, QueueEntry};

/// Entries in `Queued` status, in insertion order.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<QueueEntry>,
}

impl PendingQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a key is currently pending.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Append an entry at the back.
    ///
    /// Returns the 1-based position on success.
    pub fn push(&mut self, entry: QueueEntry) -> Result<u32, DownloadError> {
        if self.contains(&entry.key) {
            return Err(DownloadError::already_queued(entry.key));
        }
        self.entries.push_back(entry);
        Ok(self.entries.len() as u32)
    }

    /// Pop the next entry from the front of the queue.
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Remove a pending entry by key.
    pub fn remove(&mut self, key: &str) -> Result<QueueEntry, DownloadError> {
        let idx = self
            .entries
            .iter()
            .position(|entry| entry.key == key)
            .ok_or_else(|| DownloadError::not_in_queue(key))?;

        // position() just found it, so remove() cannot miss
        self.entries
            .remove(idx)
            .ok_or_else(|| DownloadError::not_in_queue(key))
    }

    /// Remove every pending entry, returning them in queue order.
    pub fn clear(&mut self) -> Vec<QueueEntry> {
        self.entries.drain(..).collect()
    }

    /// Copies of all pending entries in queue order.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.entries.iter().cloned().collect()
    }
}
