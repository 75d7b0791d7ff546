//! Ordered event delivery.
//!
//! The coordinator pushes events into an unbounded channel while holding its
//! lock. A single delivery task drains the channel and hands each event to the
//! emitter, so subscriber code never runs inside the critical section and
//! every subscriber sees events in state-change order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use pkgshelf_core::{DownloadEvent, DownloadEventEmitterPort};

/// Spawn the delivery task and return the sender side of the outbox.
///
/// Delivery stops at the first event seen after `closed` is set, and ends for
/// good once every sender is dropped.
pub(crate) fn spawn_delivery(
    emitter: Arc<dyn DownloadEventEmitterPort>,
    closed: Arc<AtomicBool>,
    tasks: &TaskTracker,
    runtime: &Handle,
) -> mpsc::UnboundedSender<DownloadEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DownloadEvent>();

    tasks.spawn_on(
        async move {
            while let Some(event) = rx.recv().await {
                if closed.load(Ordering::Acquire) {
                    tracing::debug!(
                        target: "pkgshelf.download",
                        event = event.event_name(),
                        "Dropping event after dispose"
                    );
                    break;
                }
                deliver(emitter.as_ref(), event);
            }
            tracing::debug!(target: "pkgshelf.download", "Event delivery stopped");
        },
        runtime,
    );

    tx
}

/// Hand one event to the emitter, containing any panic in subscriber code.
fn deliver(emitter: &dyn DownloadEventEmitterPort, event: DownloadEvent) {
    let name = event.event_name();
    if catch_unwind(AssertUnwindSafe(|| emitter.emit(event))).is_err() {
        tracing::warn!(
            target: "pkgshelf.download",
            event = name,
            "Event emitter panicked; continuing with next event"
        );
    }
}
