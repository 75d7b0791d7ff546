//! HTTP downloader.
//!
//! Streams a URL into `<destination>.part` and renames it into place once the
//! body is complete. The partial file is removed on failure or cancellation,
//! so a destination path only ever holds a finished download.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use pkgshelf_core::{DownloadError, DownloadRequest, DownloadResult, DownloaderPort};

use crate::progress::ProgressThrottle;

const USER_AGENT: &str = concat!("pkgshelf/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// `DownloaderPort` implementation for plain HTTP(S) GET downloads.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader with its own HTTP client.
    pub fn new() -> DownloadResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DownloadError::other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Path of the in-progress file for `destination`.
    #[must_use]
    pub fn part_path(destination: &Path) -> PathBuf {
        let mut name = destination
            .file_name()
            .map_or_else(OsString::new, ToOwned::to_owned);
        name.push(".part");
        destination.with_file_name(name)
    }

    async fn transfer(
        &self,
        request: &DownloadRequest,
        part: &Path,
        cancel: &CancellationToken,
    ) -> DownloadResult<u64> {
        let mut response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::Cancelled),
            sent = self.client.get(&request.source).send() => sent.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::network_with_status(
                format!("HTTP {status} for {}", request.source),
                status.as_u16(),
            ));
        }

        let total = response.content_length().or(request.size_bytes);
        if let Some(parent) = part.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(part).await?;

        let mut written: u64 = 0;
        let mut throttle = ProgressThrottle::for_logging();
        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(DownloadError::Cancelled),
                chunk = response.chunk() => chunk.map_err(map_reqwest_error)?,
            };
            let Some(chunk) = chunk else {
                break;
            };

            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            if throttle.ready() {
                tracing::debug!(
                    target: "pkgshelf.download",
                    key = %request.key,
                    written,
                    total,
                    "Download progress"
                );
            }
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl DownloaderPort for HttpDownloader {
    async fn run(&self, request: DownloadRequest, cancel: CancellationToken) -> DownloadResult<u64> {
        let part = Self::part_path(&request.destination);

        match self.transfer(&request, &part, &cancel).await {
            Ok(bytes) => {
                fs::rename(&part, &request.destination).await?;
                Ok(bytes)
            }
            Err(e) => {
                // Part file may not exist yet
                if let Err(remove_err) = fs::remove_file(&part).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            target: "pkgshelf.download",
                            path = %part.display(),
                            error = %remove_err,
                            "Failed to remove partial download"
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    match err.status() {
        Some(status) => DownloadError::network_with_status(err.to_string(), status.as_u16()),
        None => DownloadError::network(err.to_string()),
    }
}
