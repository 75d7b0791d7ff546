//! Shared fixtures for coordinator integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pkgshelf_download::{
    CancellationToken, DownloadCoordinator, DownloadError, DownloadEvent,
    DownloadEventEmitterPort, DownloadRequest, DownloadResult, DownloaderPort,
};

/// Downloader whose behaviour is picked by key prefix.
///
/// - `fail*` fails with a network error after `delay`
/// - `panic*` panics
/// - `hold*` runs until `release()` or cancellation
/// - anything else succeeds after `delay` unless cancelled first
pub struct ScriptedDownloader {
    delay: Duration,
    gate: CancellationToken,
    current: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<String>>,
}

impl ScriptedDownloader {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            gate: CancellationToken::new(),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
        })
    }

    /// Let every `hold*` transfer finish successfully.
    pub fn release(&self) {
        self.gate.cancel();
    }

    /// Highest number of transfers observed running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Keys in the order their transfers began.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

struct Running<'a>(&'a AtomicUsize);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DownloaderPort for ScriptedDownloader {
    async fn run(&self, request: DownloadRequest, cancel: CancellationToken) -> DownloadResult<u64> {
        self.started.lock().unwrap().push(request.key.clone());
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _running = Running(&self.current);

        if request.key.starts_with("fail") {
            tokio::time::sleep(self.delay).await;
            return Err(DownloadError::network("connection reset"));
        }
        assert!(!request.key.starts_with("panic"), "downloader blew up");

        if request.key.starts_with("hold") {
            return tokio::select! {
                () = cancel.cancelled() => Err(DownloadError::Cancelled),
                () = self.gate.cancelled() => Ok(0),
            };
        }

        tokio::select! {
            () = cancel.cancelled() => Err(DownloadError::Cancelled),
            () = tokio::time::sleep(self.delay) => Ok(request.size_bytes.unwrap_or(1)),
        }
    }
}

/// Emitter that records every event it receives.
#[derive(Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<DownloadEvent>>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<DownloadEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Events matching `pred`, in delivery order.
    pub fn matching(&self, pred: impl Fn(&DownloadEvent) -> bool) -> Vec<DownloadEvent> {
        self.events().into_iter().filter(|e| pred(e)).collect()
    }
}

impl DownloadEventEmitterPort for RecordingEmitter {
    fn emit(&self, event: DownloadEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

pub fn request(key: &str) -> DownloadRequest {
    DownloadRequest::new(key, format!("https://pkgs.example.test/{key}"), format!("/tmp/{key}"))
}

pub fn coordinator(
    downloader: &Arc<ScriptedDownloader>,
    max_concurrent: u32,
) -> (DownloadCoordinator, RecordingEmitter) {
    let emitter = RecordingEmitter::default();
    let coordinator = DownloadCoordinator::builder()
        .downloader(downloader.clone())
        .event_emitter(Arc::new(emitter.clone()))
        .max_concurrent(max_concurrent)
        .build()
        .unwrap();
    (coordinator, emitter)
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 5s");
}
