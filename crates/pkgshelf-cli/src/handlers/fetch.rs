//! `pkgshelf fetch`: queue every URL and follow events until every accepted
//! download has settled.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast::error::RecvError;

use pkgshelf_core::{DownloadEvent, DownloadRequest, QueueConfig, QueueRunSummary};
use pkgshelf_download::{
    BroadcastEmitter, DEFAULT_EVENT_CAPACITY, DownloadCoordinator, HttpDownloader,
};

use crate::commands::FetchArgs;

/// Upper bound on events one download produces: queued, started and settled,
/// a status change after each, and at most one drain.
const EVENTS_PER_DOWNLOAD: usize = 7;

/// Outcome counts for one `fetch` invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub completed: u32,
    pub failed: u32,
    pub cancelled: u32,
    /// URLs rejected at enqueue time (duplicate file names).
    pub skipped: u32,
    /// Interrupted by Ctrl-C.
    pub interrupted: bool,
}

impl FetchReport {
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0 && self.skipped == 0 && !self.interrupted
    }

    /// Fold one drained queue run into the totals.
    pub const fn add_run(&mut self, summary: &QueueRunSummary) {
        self.completed += summary.completed;
        self.failed += summary.failed;
        self.cancelled += summary.cancelled;
    }

    /// Downloads accounted for so far.
    pub const fn settled(&self) -> u32 {
        self.completed + self.failed + self.cancelled
    }
}

/// Derive a request key from the last path segment of a URL.
pub fn key_for_url(url: &str) -> Result<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let path = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest.split_once('/').map_or("", |(_, path)| path));

    match path.trim_end_matches('/').rsplit('/').next() {
        Some(segment) if !matches!(segment.trim(), "" | "." | "..") => Ok(segment.to_owned()),
        _ => bail!("cannot derive a file name from URL: {url}"),
    }
}

/// Build one request per URL, saved under `dest`.
pub fn plan(urls: &[String], dest: &Path) -> Result<Vec<DownloadRequest>> {
    urls.iter()
        .map(|url| {
            let key = key_for_url(url)?;
            let destination = dest.join(&key);
            Ok(DownloadRequest::new(key, url.clone(), destination))
        })
        .collect()
}

pub async fn execute(args: FetchArgs) -> Result<FetchReport> {
    let config = QueueConfig::new().with_max_concurrent(args.max_concurrent);
    config.validate()?;
    let requests = plan(&args.urls, &args.dest)?;

    // Sized so a subscriber that keeps up at all can never lag
    let capacity = DEFAULT_EVENT_CAPACITY.max(requests.len() * EVENTS_PER_DOWNLOAD);
    let emitter = BroadcastEmitter::new(capacity);
    let mut events = emitter.subscribe();
    let coordinator = DownloadCoordinator::builder()
        .downloader(Arc::new(HttpDownloader::new()?))
        .event_emitter(Arc::new(emitter))
        .config(config)
        .build()
        .context("failed to start download queue")?;

    let mut report = FetchReport::default();
    let mut accepted: u32 = 0;
    for request in requests {
        if coordinator.submit(request.clone()) {
            accepted += 1;
        } else {
            tracing::warn!(key = %request.key, url = %request.source, "Skipping duplicate download");
            report.skipped += 1;
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // Runs can drain and restart while URLs are still being submitted, so
    // keep folding drain summaries until every accepted download is counted.
    while report.settled() < accepted {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::warn!("Interrupted; cancelling downloads");
                report.interrupted = true;
                break;
            }
            received = events.recv() => match received {
                Ok(DownloadEvent::QueueDrained { summary }) => {
                    if summary.all_succeeded() {
                        tracing::info!(completed = summary.completed, "Queue drained");
                    } else {
                        tracing::warn!(
                            completed = summary.completed,
                            failed = summary.failed,
                            cancelled = summary.cancelled,
                            "Queue drained with problems"
                        );
                    }
                    report.add_run(&summary);
                }
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    coordinator.shutdown().await;
    Ok(report)
}

fn log_event(event: &DownloadEvent) {
    match event {
        DownloadEvent::DownloadStarted { entry } => {
            tracing::info!(key = %entry.key, "Downloading {}", entry.request.source);
        }
        DownloadEvent::DownloadCompleted { entry, bytes } => {
            let millis = entry.run_time().map(|d| d.num_milliseconds());
            tracing::info!(
                key = %entry.key,
                bytes,
                millis,
                path = %entry.request.destination.display(),
                "Saved"
            );
        }
        DownloadEvent::DownloadFailed { entry, error } => {
            tracing::error!(
                key = %entry.key,
                retry_may_help = error.is_recoverable(),
                "{}",
                error.user_message()
            );
        }
        DownloadEvent::DownloadCancelled { entry } => {
            tracing::warn!(key = %entry.key, "Cancelled");
        }
        DownloadEvent::QueueStatusChanged { status } => {
            tracing::debug!(queued = status.queued, active = status.active, "Queue status");
        }
        _ => {}
    }
}
