//! Reconnect backoff

use std::time::Duration;

/// Exponential reconnect schedule with a fixed ceiling
///
/// Attempt `n` (0-based) waits `base_delay * 2^n`. After `max_attempts`
/// scheduled retries no further delay is produced. A successful open resets
/// the counter, so the next failure starts again at `base_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_delay: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl Backoff {
    /// Create a fresh schedule
    #[must_use]
    pub const fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
            attempts: 0,
        }
    }

    /// Delay before the next retry, or `None` once the ceiling is reached
    ///
    /// Consumes one attempt when a delay is returned.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        let factor = 2u32.checked_pow(self.attempts).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        self.attempts += 1;
        Some(delay)
    }

    /// Forget previous failures
    pub const fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Retries scheduled since the last reset
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Configured ceiling
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
