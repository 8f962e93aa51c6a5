use rand::Rng;
use std::time::Duration;

/// Exponential backoff: `base × 2^attempt`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Add up to 10% random jitter on top of the computed delay
    pub jitter: bool,
}

impl RetryPolicy {
    /// Policy for the discovery endpoint: 4 attempts, 1s..10s.
    pub fn discovery() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            jitter: false,
        }
    }

    /// Delay before retry number `attempt + 1` (`attempt` counts from 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self
            .base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);
        if self.jitter && !delay.is_zero() {
            let extra_ms = rand::thread_rng().gen_range(0..=delay.as_millis() as u64 / 10);
            delay + Duration::from_millis(extra_ms)
        } else {
            delay
        }
    }
}
