//! Core domain types and port definitions for pkgshelf downloads.
//!
//! This crate holds the pure data model of the download queue (requests,
//! entries, events, errors, configuration) and the traits the coordinator
//! consumes. It performs no I/O and spawns no tasks.
//!
//! - `download` - requests, queue entries, events, errors, run summaries
//! - `config` - queue configuration
//! - `ports` - `DownloaderPort` and `DownloadEventEmitterPort`

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod download;
pub mod ports;

pub use config::{ConfigError, DEFAULT_MAX_CONCURRENT, MAX_CONCURRENT_LIMIT, QueueConfig};
pub use download::{
    DownloadError, DownloadEvent, DownloadRequest, DownloadResult, DownloadStatus, QueueEntry,
    QueueRunSummary, QueueSnapshot, QueueStatus,
};
pub use ports::{DownloadEventEmitterPort, DownloaderPort, NoopDownloadEmitter};

// Re-exported so adapters implementing `DownloaderPort` share one token type.
pub use tokio_util::sync::CancellationToken;
