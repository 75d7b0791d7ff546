//! Transfer progress reporting.
//!
//! Downloads can produce thousands of chunks per second; progress is only
//! logged at a bounded rate.

mod throttle;

pub use throttle::ProgressThrottle;
