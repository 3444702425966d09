use std::time::Duration;

use chrono::{DateTime, Utc};

/// Exponential backoff with a dead-letter threshold for queued deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after which a failed message is dead-lettered.
    pub max_attempts: i32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: i32) -> Duration {
        let exponent = attempt.saturating_sub(1).clamp(0, 31) as u32;
        self.base_delay
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// When to retry after `attempts_made` failed attempts, or `None` once exhausted.
    pub fn next_attempt_at(&self, attempts_made: i32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if attempts_made >= self.max_attempts {
            return None;
        }
        let delay = chrono::Duration::from_std(self.delay_for(attempts_made)).ok()?;
        Some(now + delay)
    }

    pub fn is_exhausted(&self, attempts_made: i32) -> bool {
        attempts_made >= self.max_attempts
    }
}
