//! Download domain types, events and errors.
//!
//! Pure data types with no I/O or runtime dependencies.
//!
//! # Structure
//!
//! - `types` - `DownloadRequest` and `DownloadStatus`
//! - `queue` - queue entries and snapshot DTOs (`QueueEntry`, `QueueStatus`, `QueueSnapshot`)
//! - `events` - the `DownloadEvent` discriminated union
//! - `errors` - `DownloadError`
//! - `completion` - queue run summaries

pub mod completion;
pub mod errors;
pub mod events;
pub mod queue;
pub mod types;

pub use completion::QueueRunSummary;
pub use errors::{DownloadError, DownloadResult};
pub use events::DownloadEvent;
pub use queue::{QueueEntry, QueueSnapshot, QueueStatus};
pub use types::{DownloadRequest, DownloadStatus};
