//! Coordinator construction errors.

use thiserror::Error;

/// Errors raised while building a `DownloadCoordinator`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// No downloader was supplied.
    #[error("a downloader is required to build a download coordinator")]
    MissingDownloader,

    /// No tokio runtime handle was supplied and none is current.
    #[error("no tokio runtime available; build inside a runtime or pass one with `runtime()`")]
    NoRuntime,
}
