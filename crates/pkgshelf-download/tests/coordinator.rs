//! Coordinator behaviour through its public API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingEmitter, ScriptedDownloader, coordinator, eventually, request};
use pkgshelf_download::{
    BroadcastEmitter, BuildError, DownloadCoordinator, DownloadError, DownloadEvent,
    DownloadStatus, QueueStatus,
};

const SHORT: Duration = Duration::from_millis(20);

fn status_events(emitter: &RecordingEmitter) -> Vec<QueueStatus> {
    emitter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            DownloadEvent::QueueStatusChanged { status } => Some(status),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn build_requires_downloader() {
    let result = DownloadCoordinator::builder().max_concurrent(2).build();
    assert!(matches!(result, Err(BuildError::MissingDownloader)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zero_limit_still_runs_downloads() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, _emitter) = coordinator(&downloader, 0);
    assert_eq!(coordinator.max_concurrent(), 1);

    assert!(coordinator.enqueue("pkg-a", request("pkg-a")));
    assert!(coordinator.enqueue("pkg-b", request("pkg-b")));
    assert_eq!(coordinator.active_count(), 1);

    eventually(|| coordinator.status().is_idle()).await;
    assert_eq!(downloader.started(), vec!["pkg-a", "pkg-b"]);
    assert_eq!(downloader.peak(), 1);
}

#[tokio::test]
async fn blank_keys_are_rejected() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    assert!(!coordinator.enqueue("", request("x")));
    assert!(!coordinator.enqueue("   ", request("x")));
    assert_eq!(coordinator.try_enqueue("\t\n", request("x")), Err(DownloadError::InvalidKey));

    assert_eq!(coordinator.queued_count(), 0);
    assert_eq!(coordinator.active_count(), 0);
    tokio::time::sleep(SHORT).await;
    assert_eq!(emitter.len(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn enqueue_into_idle_coordinator_reports_queued_then_started() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 2);

    assert!(coordinator.enqueue("Pkg.1", request("Pkg.1")));
    eventually(|| emitter.len() >= 4).await;

    let events = emitter.events();
    assert!(matches!(&events[0], DownloadEvent::DownloadQueued { entry } if entry.key == "Pkg.1"));
    assert_eq!(
        events[1],
        DownloadEvent::status_changed(QueueStatus {
            queued: 1,
            active: 0,
            max_concurrent: 2,
        })
    );
    assert!(matches!(&events[2], DownloadEvent::DownloadStarted { entry } if entry.key == "Pkg.1"));
    assert_eq!(
        events[3],
        DownloadEvent::status_changed(QueueStatus {
            queued: 0,
            active: 1,
            max_concurrent: 2,
        })
    );

    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn enqueue_behind_saturated_limit_stays_pending() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    assert!(coordinator.enqueue("hold-blocker", request("hold-blocker")));
    assert!(coordinator.enqueue("Pkg.1", request("Pkg.1")));

    assert_eq!(coordinator.queued_count(), 1);
    assert_eq!(coordinator.queued_downloads()[0].key, "Pkg.1");
    assert_eq!(coordinator.queued_downloads()[0].status, DownloadStatus::Queued);

    eventually(|| {
        emitter
            .matching(|e| matches!(e, DownloadEvent::DownloadQueued { entry } if entry.key == "Pkg.1"))
            .len()
            == 1
    })
    .await;
    eventually(|| status_events(&emitter).iter().any(|s| s.queued == 1 && s.active == 1)).await;

    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_keys_are_rejected() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, _emitter) = coordinator(&downloader, 1);

    assert!(coordinator.enqueue("hold-a", request("hold-a")));
    assert!(coordinator.enqueue("Pkg.1", request("Pkg.1")));
    assert!(!coordinator.enqueue("Pkg.1", request("Pkg.1")));
    // Active keys count as duplicates too
    assert!(!coordinator.enqueue("hold-a", request("hold-a")));

    assert_eq!(coordinator.queued_count(), 1);
    assert_eq!(coordinator.active_count(), 1);
    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn remove_from_queue() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    assert!(!coordinator.remove_from_queue("Missing"));

    coordinator.enqueue("hold-a", request("hold-a"));
    coordinator.enqueue("Pkg.1", request("Pkg.1"));
    assert!(coordinator.remove_from_queue("Pkg.1"));
    assert!(!coordinator.remove_from_queue("Pkg.1"));
    assert_eq!(coordinator.queued_count(), 0);

    eventually(|| {
        !emitter
            .matching(|e| matches!(e, DownloadEvent::DownloadRemoved { entry } if entry.key == "Pkg.1"))
            .is_empty()
    })
    .await;
    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clear_queue_reports_empty_queue() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    coordinator.enqueue("hold-a", request("hold-a"));
    for key in ["Pkg.1", "Pkg.2", "Pkg.3"] {
        assert!(coordinator.enqueue(key, request(key)));
    }
    assert_eq!(coordinator.queued_count(), 3);

    assert_eq!(coordinator.clear_queue(), 3);
    assert_eq!(coordinator.queued_count(), 0);
    assert_eq!(coordinator.active_count(), 1);

    eventually(|| status_events(&emitter).last().is_some_and(|s| s.queued == 0 && s.active == 1))
        .await;
    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_ceiling_is_never_exceeded() {
    let downloader = ScriptedDownloader::new(Duration::from_millis(15));
    let (coordinator, _emitter) = coordinator(&downloader, 2);

    for i in 0..10 {
        let key = format!("pkg-{i}");
        assert!(coordinator.enqueue(&key, request(&key)));
        assert!(coordinator.active_count() <= 2);
    }

    eventually(|| {
        assert!(coordinator.active_count() <= 2);
        coordinator.queued_count() == 0 && coordinator.active_count() == 0
    })
    .await;

    assert!(downloader.peak() <= 2);
    assert_eq!(downloader.started().len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn downloads_start_in_fifo_order() {
    let downloader = ScriptedDownloader::new(Duration::from_millis(5));
    let emitter = BroadcastEmitter::new(128);
    let mut rx = emitter.subscribe();
    let coordinator = DownloadCoordinator::builder()
        .downloader(downloader.clone())
        .event_emitter(Arc::new(emitter))
        .max_concurrent(1)
        .build()
        .unwrap();

    let keys: Vec<String> = (0..5).map(|i| format!("pkg-{i}")).collect();
    for key in &keys {
        coordinator.enqueue(key, request(key));
    }

    let mut started = Vec::new();
    while started.len() < keys.len() {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Ok(DownloadEvent::DownloadStarted { entry })) => started.push(entry.key),
            Ok(Ok(_)) => {}
            other => panic!("event stream ended early: {other:?}"),
        }
    }

    assert_eq!(started, keys);
    assert_eq!(downloader.started(), keys);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_unknown_key_returns_false() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, _emitter) = coordinator(&downloader, 1);
    assert!(!coordinator.cancel_download("Missing"));
    assert_eq!(
        coordinator.try_cancel_download("Missing"),
        Err(DownloadError::not_in_queue("Missing"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_pending_removes_it() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    coordinator.enqueue("hold-a", request("hold-a"));
    coordinator.enqueue("Pkg.1", request("Pkg.1"));
    assert!(coordinator.cancel_download("Pkg.1"));
    assert!(!coordinator.contains("Pkg.1"));

    eventually(|| {
        !emitter
            .matching(|e| matches!(e, DownloadEvent::DownloadRemoved { entry } if entry.key == "Pkg.1"))
            .is_empty()
    })
    .await;
    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_active_frees_the_slot() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    coordinator.enqueue("hold-a", request("hold-a"));
    coordinator.enqueue("pkg-b", request("pkg-b"));
    assert!(coordinator.cancel_download("hold-a"));

    eventually(|| coordinator.status().is_idle()).await;

    let cancelled = emitter.matching(|e| matches!(e, DownloadEvent::DownloadCancelled { .. }));
    assert_eq!(cancelled.len(), 1);
    let entry = cancelled[0].entry().unwrap();
    assert_eq!(entry.key, "hold-a");
    assert_eq!(entry.status, DownloadStatus::Cancelled);
    assert!(entry.finished_at.is_some());

    assert_eq!(
        emitter
            .matching(|e| matches!(e, DownloadEvent::DownloadCompleted { entry, .. } if entry.key == "pkg-b"))
            .len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failures_are_isolated() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 2);

    for key in ["fail-a", "panic-b", "pkg-c", "pkg-d"] {
        coordinator.enqueue(key, request(key));
    }
    eventually(|| coordinator.status().is_idle()).await;
    eventually(|| !emitter.matching(|e| matches!(e, DownloadEvent::QueueDrained { .. })).is_empty())
        .await;

    let failed: Vec<_> = emitter
        .matching(|e| matches!(e, DownloadEvent::DownloadFailed { .. }))
        .into_iter()
        .filter_map(|e| match e {
            DownloadEvent::DownloadFailed { entry, error } => Some((entry, error)),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 2);

    let (fail_entry, fail_error) = failed.iter().find(|(e, _)| e.key == "fail-a").unwrap();
    assert_eq!(fail_entry.status, DownloadStatus::Failed);
    assert_eq!(fail_error, &DownloadError::network("connection reset"));
    assert!(fail_entry.error.is_some());

    let (_, panic_error) = failed.iter().find(|(e, _)| e.key == "panic-b").unwrap();
    assert!(matches!(panic_error, DownloadError::Other { .. }));

    let completed = emitter.matching(|e| matches!(e, DownloadEvent::DownloadCompleted { .. }));
    assert_eq!(completed.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn drained_summary_counts_every_outcome() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    for key in ["hold-a", "pkg-b", "fail-c", "pkg-d"] {
        coordinator.enqueue(key, request(key));
    }
    assert!(coordinator.remove_from_queue("pkg-d"));
    assert!(coordinator.cancel_download("hold-a"));

    eventually(|| !emitter.matching(|e| matches!(e, DownloadEvent::QueueDrained { .. })).is_empty())
        .await;
    tokio::time::sleep(SHORT).await;

    let drained = emitter.matching(|e| matches!(e, DownloadEvent::QueueDrained { .. }));
    assert_eq!(drained.len(), 1);
    let DownloadEvent::QueueDrained { summary } = &drained[0] else {
        unreachable!();
    };
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.cancelled, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.total(), 4);
    assert!(summary.finished_at.is_some());

    let json = serde_json::to_value(&drained[0]).unwrap();
    assert_eq!(json["type"], "queue_drained");
    assert_eq!(json["summary"]["removed"], 1);

    // Drained is the last thing a run publishes
    assert!(matches!(emitter.events().last(), Some(DownloadEvent::QueueDrained { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn each_entry_starts_before_it_settles() {
    let downloader = ScriptedDownloader::new(Duration::from_millis(2));
    let (coordinator, emitter) = coordinator(&downloader, 3);

    for i in 0..12 {
        let key = format!("pkg-{i}");
        coordinator.enqueue(&key, request(&key));
    }
    eventually(|| !emitter.matching(|e| matches!(e, DownloadEvent::QueueDrained { .. })).is_empty())
        .await;

    let events = emitter.events();
    for i in 0..12 {
        let key = format!("pkg-{i}");
        let position = |pred: &dyn Fn(&DownloadEvent) -> bool| {
            events
                .iter()
                .position(|e| e.key() == Some(key.as_str()) && pred(e))
                .unwrap()
        };
        let queued = position(&|e| matches!(e, DownloadEvent::DownloadQueued { .. }));
        let started = position(&|e| matches!(e, DownloadEvent::DownloadStarted { .. }));
        let settled = position(&DownloadEvent::is_settlement);
        assert!(queued < started && started < settled, "{key} out of order");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispose_twice_then_silence() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, emitter) = coordinator(&downloader, 1);

    coordinator.enqueue("hold-a", request("hold-a"));
    coordinator.enqueue("pkg-b", request("pkg-b"));

    assert!(coordinator.dispose());
    assert!(!coordinator.dispose());
    coordinator.shutdown().await;

    let seen = emitter.len();
    assert!(!coordinator.enqueue("pkg-c", request("pkg-c")));
    assert!(!coordinator.remove_from_queue("pkg-b"));
    assert!(!coordinator.cancel_download("hold-a"));
    tokio::time::sleep(SHORT * 3).await;

    assert_eq!(emitter.len(), seen);
    assert!(
        emitter
            .matching(|e| matches!(e, DownloadEvent::DownloadCancelled { .. }))
            .is_empty()
    );
    assert!(coordinator.snapshot().is_empty());
    // Only the held transfer ever started
    assert_eq!(downloader.started(), vec!["hold-a"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clones_share_one_queue() {
    let downloader = ScriptedDownloader::new(SHORT);
    let (coordinator, _emitter) = coordinator(&downloader, 1);
    let other = coordinator.clone();

    coordinator.enqueue("hold-a", request("hold-a"));
    assert!(other.contains("hold-a"));
    assert!(!other.enqueue("hold-a", request("hold-a")));

    other.dispose();
    assert!(coordinator.is_disposed());
    coordinator.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribers_may_call_back_into_the_coordinator() {
    let downloader = ScriptedDownloader::new(SHORT);
    let emitter = BroadcastEmitter::default();
    let mut rx = emitter.subscribe();
    let coordinator = DownloadCoordinator::builder()
        .downloader(downloader.clone())
        .event_emitter(Arc::new(emitter))
        .max_concurrent(1)
        .build()
        .unwrap();

    coordinator.enqueue("hold-a", request("hold-a"));
    coordinator.enqueue("pkg-b", request("pkg-b"));

    // Cancel from the subscriber side as soon as the first download starts
    let reentrant = coordinator.clone();
    let listener = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if matches!(&event, DownloadEvent::DownloadStarted { entry } if entry.key == "hold-a") {
                assert!(reentrant.cancel_download("hold-a"));
            }
            if matches!(event, DownloadEvent::QueueDrained { .. }) {
                return;
            }
        }
    });

    tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .unwrap()
        .unwrap();
    assert!(coordinator.status().is_idle());
}
