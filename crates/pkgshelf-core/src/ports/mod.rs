//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces the download queue expects from the outside
//! world. They contain no implementation details and use only domain types.

pub mod download_event_emitter;
pub mod downloader;

pub use download_event_emitter::{DownloadEventEmitterPort, NoopDownloadEmitter};
pub use downloader::DownloaderPort;
