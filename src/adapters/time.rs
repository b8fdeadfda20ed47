//! Host monotonic clock.
//!
//! Wraps `std::time::Instant`.  Readings are offset by one microsecond so
//! the first tick never sees 0, which the controller reserves for "no
//! previous tick".

use std::time::Instant;

use crate::app::ports::TimeSource;

/// Monotonic clock counting from construction.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds since construction, plus one.
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64 + 1
    }
}

impl TimeSource for MonotonicClock {
    fn micros64(&self) -> u64 {
        self.uptime_us()
    }
}
