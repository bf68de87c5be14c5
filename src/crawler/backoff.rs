use std::time::Duration;

/// Upper bound on any single retry delay
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry delay schedule: `base * 2^attempt`, capped
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base_ms: u64,
    max_ms: u64,
}

impl ExponentialBackoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Schedule with the crawler's 30 second cap
    pub fn from_base(base: Duration) -> Self {
        Self::new(base.as_millis() as u64, MAX_BACKOFF.as_millis() as u64)
    }

    /// Delay before retry number `attempt + 1` (attempt 0 is the first retry)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(20)));
        Duration::from_millis(exponential.min(self.max_ms))
    }
}
