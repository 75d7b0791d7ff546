//! Progress throttling.

use std::time::{Duration, Instant};

/// Rate-limiter for progress reports.
///
/// `ready` answers at most once per interval; the first check always passes.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    last_report: Option<Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    /// Create a throttle that reports at most once per `min_interval`.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_report: None,
            min_interval,
        }
    }

    /// Throttle with a one second interval, suited to log output.
    pub const fn for_logging() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Check against the current clock.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    /// Check against an explicit instant and record it if a report is due.
    pub fn ready_at(&mut self, now: Instant) -> bool {
        match self.last_report {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::for_logging()
    }
}
