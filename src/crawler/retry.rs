//! Retry policy for the fetch client
//!
//! Decides how many attempts a URL gets and how long to wait between them.

use crate::config::{BackoffStrategy, FetchConfig};
use rand::Rng;
use std::time::Duration;

/// Upper bound on the exponent so long retry chains cannot overflow
const MAX_EXPONENT: u32 = 16;

/// Bounded retry with configurable backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_retries: u32,

    /// Base delay the strategy scales from
    pub base_delay: Duration,

    /// Random jitter is drawn from `[0, max_jitter)`
    pub max_jitter: Duration,

    pub strategy: BackoffStrategy,
}

impl RetryPolicy {
    /// Exponential backoff with the given attempt budget and base delay
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_jitter: Duration::from_secs(1),
            strategy: BackoffStrategy::Exponential,
        }
    }

    /// Fixed delay between attempts
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay: delay,
            max_jitter: Duration::ZERO,
            strategy: BackoffStrategy::Fixed,
        }
    }

    /// Overrides the jitter bound
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Delay before the attempt following `attempt` (1-based), without jitter
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT);
                self.base_delay.saturating_mul(1u32 << exponent)
            }
        }
    }

    /// Delay before the attempt following `attempt` (1-based), jitter included
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff(attempt) + self.jitter()
    }

    /// Whether another attempt is allowed after `attempt` (1-based)
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let millis = self.max_jitter.as_millis().min(u64::MAX as u128) as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..millis.max(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
            strategy: config.backoff,
        }
    }
}
