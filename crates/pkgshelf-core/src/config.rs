//! Download queue configuration.
//!
//! Plain serde-friendly settings consumed by the coordinator. Loading and
//! persisting them is the host application's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of simultaneous downloads.
pub const DEFAULT_MAX_CONCURRENT: u32 = 2;

/// Upper bound accepted by `QueueConfig::validate`.
pub const MAX_CONCURRENT_LIMIT: u32 = 64;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Concurrency above the supported ceiling.
    #[error("max_concurrent must be at most {MAX_CONCURRENT_LIMIT}, got {0}")]
    TooManyConcurrent(u32),
}

/// Settings for a download coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum downloads allowed to run at once. Zero is treated as one.
    pub max_concurrent: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl QueueConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum concurrent downloads.
    #[must_use]
    pub const fn with_max_concurrent(mut self, max: u32) -> Self {
        self.max_concurrent = max;
        self
    }

    /// The concurrency ceiling actually enforced (never zero).
    #[must_use]
    pub const fn effective_max_concurrent(&self) -> u32 {
        if self.max_concurrent == 0 {
            1
        } else {
            self.max_concurrent
        }
    }

    /// Reject values no desktop host should ever ask for.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent > MAX_CONCURRENT_LIMIT {
            return Err(ConfigError::TooManyConcurrent(self.max_concurrent));
        }
        Ok(())
    }
}
