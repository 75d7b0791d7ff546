//! Broadcast event emitter.
//!
//! Fans coordinator events out to any number of in-process subscribers over a
//! `tokio::sync::broadcast` channel. Subscribers that fall behind by more than
//! the channel capacity see `RecvError::Lagged` and skip ahead.

use tokio::sync::broadcast;

use pkgshelf_core::{DownloadEvent, DownloadEventEmitterPort};

/// Default buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Event emitter backed by a broadcast channel.
///
/// Clones share the same channel.
#[derive(Debug, Clone)]
pub struct BroadcastEmitter {
    sender: broadcast::Sender<DownloadEvent>,
}

impl BroadcastEmitter {
    /// Create an emitter buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl DownloadEventEmitterPort for BroadcastEmitter {
    fn emit(&self, event: DownloadEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}
