//! Download error types.
//!
//! These errors are serializable and do not hold external error types like
//! `std::io::Error`. For I/O errors, the kind and message are captured as
//! strings so the error can travel inside a `DownloadEvent`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for download queue operations and transfers.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// Request key was empty or whitespace-only.
    #[error("Invalid request key")]
    InvalidKey,

    /// A live entry with this key already exists.
    #[error("Already queued: {key}")]
    AlreadyQueued {
        /// The duplicate key.
        key: String,
    },

    /// No pending (or active) entry with this key.
    #[error("Not in queue: {key}")]
    NotInQueue {
        /// The key that wasn't found.
        key: String,
    },

    /// The coordinator has been disposed.
    #[error("Download queue has been shut down")]
    ShutDown,

    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "`NotFound`", "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// Network/HTTP error during download.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// Download was cancelled.
    #[error("Download cancelled")]
    Cancelled,

    /// General/uncategorized error.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl DownloadError {
    /// Create an already queued error.
    pub fn already_queued(key: impl Into<String>) -> Self {
        Self::AlreadyQueued { key: key.into() }
    }

    /// Create a not in queue error.
    pub fn not_in_queue(key: impl Into<String>) -> Self {
        Self::NotInQueue { key: key.into() }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if a caller might reasonably try again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Io { .. })
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidKey => "A download needs a non-empty name.".to_string(),
            Self::AlreadyQueued { key } => format!("'{key}' is already being downloaded."),
            Self::NotInQueue { key } => format!("'{key}' is not in the download queue."),
            Self::ShutDown => "Downloads are shutting down.".to_string(),
            Self::Io { message, .. } => format!("File operation failed: {message}"),
            Self::Network {
                message,
                status_code: Some(code),
            } => format!("Network error (HTTP {code}): {message}"),
            Self::Network { message, .. } => format!("Network error: {message}"),
            Self::Cancelled => "Download was cancelled.".to_string(),
            Self::Other { message } => message.clone(),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;
