//! Bounded-concurrency download queue for pkgshelf.
//!
//! `DownloadCoordinator` accepts keyed download requests, runs at most
//! `max_concurrent` of them at a time through a `DownloaderPort`, and reports
//! every lifecycle transition through a `DownloadEventEmitterPort`.
//!
//! - `coordinator` - the queue coordinator and its builder
//! - `queue` - pending FIFO state machine
//! - `emitter` - broadcast-channel event emitter
//! - `http` - reqwest-backed `DownloaderPort`
//! - `progress` - progress log throttling

// Re-export core types for convenience
pub use pkgshelf_core::{
    CancellationToken, DownloadError, DownloadEvent, DownloadEventEmitterPort, DownloadRequest,
    DownloadResult, DownloadStatus, DownloaderPort, NoopDownloadEmitter, QueueConfig, QueueEntry,
    QueueRunSummary, QueueSnapshot, QueueStatus,
};

mod coordinator;
mod emitter;
mod error;
mod http;
pub(crate) mod progress;
pub(crate) mod queue;

pub use coordinator::{CoordinatorBuilder, DownloadCoordinator};
pub use emitter::{BroadcastEmitter, DEFAULT_EVENT_CAPACITY};
pub use error::BuildError;
pub use http::HttpDownloader;
pub use progress::ProgressThrottle;
