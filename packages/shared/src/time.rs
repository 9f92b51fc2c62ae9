//! Time-related utilities with clock abstraction for testability.

use chrono::{Local, Utc};

/// Format of the human-readable stamp carried in chat frames, e.g. "10:30 AM".
const CLOCK_TIME_FORMAT: &str = "%I:%M %p";

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp in milliseconds
    fn now_millis(&self) -> i64;

    /// Get the current wall-clock time as a display stamp (e.g. "10:30 AM")
    fn clock_time(&self) -> String;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }

    fn clock_time(&self) -> String {
        current_clock_time()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone)]
pub struct FixedClock {
    fixed_millis: i64,
    fixed_clock_time: String,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp and display stamp
    pub fn new(fixed_millis: i64, fixed_clock_time: impl Into<String>) -> Self {
        Self {
            fixed_millis,
            fixed_clock_time: fixed_clock_time.into(),
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_millis
    }

    fn clock_time(&self) -> String {
        self.fixed_clock_time.clone()
    }
}

/// Get current Unix timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Get the current local wall-clock time as a display stamp (e.g. "10:30 AM")
pub fn current_clock_time() -> String {
    Local::now().format(CLOCK_TIME_FORMAT).to_string()
}
