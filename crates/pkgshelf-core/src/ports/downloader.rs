//! Downloader port definition.
//!
//! The coordinator treats the transfer itself as opaque: connection handling,
//! byte-level progress and destination paths all belong to the implementation.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::download::{DownloadRequest, DownloadResult};

/// Port for performing a single transfer.
///
/// # Contract
///
/// - Return `Ok(bytes)` once the file is in place.
/// - Watch `cancel` cooperatively; when it fires, stop and return
///   `Err(DownloadError::Cancelled)`.
/// - Return any other `DownloadError` on failure. The coordinator reports it
///   and moves on; it never retries.
///
/// # Example
///
/// ```ignore
/// let downloader: Arc<dyn DownloaderPort> = Arc::new(HttpDownloader::new()?);
/// let bytes = downloader.run(request, CancellationToken::new()).await?;
/// ```
#[async_trait]
pub trait DownloaderPort: Send + Sync {
    /// Run one transfer to completion, failure or cancellation.
    async fn run(&self, request: DownloadRequest, cancel: CancellationToken)
    -> DownloadResult<u64>;
}
