//! Download event emitter port.
//!
//! This port lets the coordinator publish notifications without coupling to
//! transport details (broadcast channels, UI bridges, log sinks).

use std::sync::Arc;

use crate::download::DownloadEvent;

/// Port for emitting download events.
///
/// Implementations handle the actual event delivery. The coordinator calls
/// `emit` from a single delivery task, in state-change order, and never while
/// holding its own lock.
pub trait DownloadEventEmitterPort: Send + Sync {
    /// Emit a download event.
    ///
    /// This method should not block.
    fn emit(&self, event: DownloadEvent);

    /// Clone this emitter into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn DownloadEventEmitterPort>` without
    /// requiring the underlying type to implement Clone.
    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort>;
}

impl<T: DownloadEventEmitterPort + ?Sized> DownloadEventEmitterPort for Arc<T> {
    fn emit(&self, event: DownloadEvent) {
        (**self).emit(event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        (**self).clone_box()
    }
}

/// A no-op download event emitter for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopDownloadEmitter;

impl NoopDownloadEmitter {
    /// Create a new no-op download emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadEventEmitterPort for NoopDownloadEmitter {
    fn emit(&self, _event: DownloadEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}
