//! Port adapters

use chrono::{DateTime, Utc};
use courier_application::ports::Clock;

/// Wall-clock time source for production renders. Tests substitute a
/// pinned implementation instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates the clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
