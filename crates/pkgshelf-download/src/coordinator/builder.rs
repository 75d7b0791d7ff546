//! Coordinator construction.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

use pkgshelf_core::{DownloadEventEmitterPort, DownloaderPort, NoopDownloadEmitter, QueueConfig};

use super::outbox::spawn_delivery;
use super::{DownloadCoordinator, Inner};
use crate::error::BuildError;

/// Builder for `DownloadCoordinator`.
///
/// ```ignore
/// let coordinator = CoordinatorBuilder::new()
///     .downloader(Arc::new(HttpDownloader::new()?))
///     .event_emitter(Arc::new(emitter.clone()))
///     .max_concurrent(3)
///     .build()?;
/// ```
#[derive(Default)]
pub struct CoordinatorBuilder {
    downloader: Option<Arc<dyn DownloaderPort>>,
    event_emitter: Option<Arc<dyn DownloadEventEmitterPort>>,
    config: QueueConfig,
    runtime: Option<Handle>,
}

impl CoordinatorBuilder {
    /// Start with default configuration and no downloader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the downloader that performs transfers. Required.
    #[must_use]
    pub fn downloader(mut self, downloader: Arc<dyn DownloaderPort>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Set where notifications go. Defaults to a no-op emitter.
    #[must_use]
    pub fn event_emitter(mut self, emitter: Arc<dyn DownloadEventEmitterPort>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    /// Replace the whole queue configuration.
    #[must_use]
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency ceiling. Zero is clamped to one.
    #[must_use]
    pub const fn max_concurrent(mut self, max: u32) -> Self {
        self.config.max_concurrent = max;
        self
    }

    /// Run downloads and event delivery on this runtime instead of the current one.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the coordinator and start its event delivery task.
    pub fn build(self) -> Result<DownloadCoordinator, BuildError> {
        let downloader = self.downloader.ok_or(BuildError::MissingDownloader)?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BuildError::NoRuntime)?,
        };
        let emitter = self
            .event_emitter
            .unwrap_or_else(|| Arc::new(NoopDownloadEmitter::new()));

        let max_concurrent = self.config.effective_max_concurrent();
        if max_concurrent != self.config.max_concurrent {
            tracing::warn!(
                target: "pkgshelf.download",
                requested = self.config.max_concurrent,
                max_concurrent,
                "Concurrency limit clamped"
            );
        }

        let tasks = TaskTracker::new();
        let closed = Arc::new(AtomicBool::new(false));
        let outbox = spawn_delivery(emitter, Arc::clone(&closed), &tasks, &runtime);

        tracing::debug!(
            target: "pkgshelf.download",
            max_concurrent,
            "Download coordinator built"
        );

        Ok(DownloadCoordinator {
            inner: Arc::new(Inner::new(
                downloader,
                max_concurrent,
                outbox,
                closed,
                tasks,
                runtime,
            )),
        })
    }
}
