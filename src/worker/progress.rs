//! Attempt aggregation and throughput reporting.

use std::fmt;
use std::time::{Duration, Instant};

/// Running total of attempts reported by the workers of one search.
#[derive(Debug, Clone)]
pub struct Progress {
    started: Instant,
    total_attempts: u64,
}

impl Progress {
    /// Starts a new aggregate at `started`.
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            total_attempts: 0,
        }
    }

    /// Folds one progress report into the total.
    #[inline]
    pub fn record(&mut self, attempts: u64) {
        self.total_attempts = self.total_attempts.saturating_add(attempts);
    }

    /// Returns the total attempts so far.
    pub fn total_attempts(&self) -> u64 {
        self.total_attempts
    }

    /// Takes a snapshot relative to now.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(self.started.elapsed(), self.total_attempts)
    }
}

/// Point-in-time view of a search's throughput.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub elapsed: Duration,
    pub total_attempts: u64,
    /// Overall rate since the search started
    pub attempts_per_second: f64,
}

impl ProgressSnapshot {
    pub fn new(elapsed: Duration, total_attempts: u64) -> Self {
        let secs = elapsed.as_secs_f64();
        let attempts_per_second = if secs > 0.0 {
            total_attempts as f64 / secs
        } else {
            0.0
        };

        Self {
            elapsed,
            total_attempts,
            attempts_per_second,
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>4}s] Total: {} | Overall: {}/s",
            self.elapsed.as_secs(),
            format_number(self.total_attempts),
            format_number(self.attempts_per_second as u64)
        )
    }
}

/// Formats a count with a K/M/B suffix.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
