//! One-shot and periodic deadlines over a monotonic clock.

use std::time::{Duration, Instant};

/// A single scheduled moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    due: Instant,
}

impl Deadline {
    pub fn after(now: Instant, delay: Duration) -> Self {
        Self { due: now + delay }
    }

    pub fn due(&self) -> Instant {
        self.due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }
}

/// A repeating deadline with a fixed period.
///
/// Missed periods are reported individually so callers can replay them in
/// order after a long stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    next: Instant,
    period: Duration,
}

impl Interval {
    /// Creates an interval whose first tick is at `first`.
    pub fn starting_at(first: Instant, period: Duration) -> Self {
        Self {
            next: first,
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Instant {
        self.next
    }

    /// Returns the instants of every tick due at or before `now`, oldest
    /// first, and moves past them.
    pub fn poll(&mut self, now: Instant) -> Vec<Instant> {
        let mut fired = Vec::new();
        while self.next <= now {
            fired.push(self.next);
            self.next += self.period;
        }
        fired
    }
}
