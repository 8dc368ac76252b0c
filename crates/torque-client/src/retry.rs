//! # Retry Policy
//!
//! How many times a controller retries a transient failure, and how long it
//! waits between attempts.
//!
//! ## Delay Schedules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CONSTANT (Default)                 │  EXPONENTIAL (opt-in)             │
//! │  ──────────────────                 │  ────────────────────             │
//! │  retry_delay = 1000ms               │  retry_delay = 500ms, ×2          │
//! │                                     │  capped at max_delay              │
//! │                                     │                                   │
//! │  attempt 1 ─ 1000ms ─ attempt 2     │  attempt 1 ─ 500ms ─ attempt 2    │
//! │  attempt 2 ─ 1000ms ─ attempt 3     │  attempt 2 ─ 1000ms ─ attempt 3   │
//! │                                     │  attempt 3 ─ 2000ms ─ attempt 4   │
//! │                                                                         │
//! │  `retries` counts retries, not attempts: retries = 2 → 3 attempts.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use backoff::backoff::{Backoff, Constant};
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Default wait between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Default ceiling for exponential waits.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Shape of the wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every retry.
    #[default]
    Constant,

    /// Delay doubles after each retry, up to `max_delay`.
    Exponential,
}

impl std::fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackoffStrategy::Constant => write!(f, "constant"),
            BackoffStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

impl std::str::FromStr for BackoffStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "constant" | "fixed" => Ok(BackoffStrategy::Constant),
            "exponential" | "exp" => Ok(BackoffStrategy::Exponential),
            other => Err(ConfigError::Invalid(format!(
                "Unknown retry strategy: '{}'. Valid options: constant, exponential",
                other
            ))),
        }
    }
}

/// Retry configuration for a [`RequestController`](crate::RequestController).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,

    /// Wait before the first retry (every retry when constant).
    pub delay: Duration,

    pub strategy: BackoffStrategy,

    /// Upper bound for exponential waits. Ignored when constant.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 0,
            delay: DEFAULT_RETRY_DELAY,
            strategy: BackoffStrategy::Constant,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::default()
    }

    /// `retries` retries, `delay` apart.
    pub fn constant(retries: u32, delay: Duration) -> Self {
        RetryPolicy {
            retries,
            delay,
            ..Default::default()
        }
    }

    /// `retries` retries starting at `initial` and doubling up to `max_delay`.
    pub fn exponential(retries: u32, initial: Duration, max_delay: Duration) -> Self {
        RetryPolicy {
            retries,
            delay: initial,
            strategy: BackoffStrategy::Exponential,
            max_delay,
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Fresh delay schedule for one `execute()` call.
    ///
    /// The exponential schedule has no jitter so waits are reproducible.
    pub fn schedule(&self) -> Box<dyn Backoff + Send> {
        match self.strategy {
            BackoffStrategy::Constant => Box::new(Constant::new(self.delay)),
            BackoffStrategy::Exponential => {
                let mut backoff = ExponentialBackoff {
                    current_interval: self.delay,
                    initial_interval: self.delay,
                    randomization_factor: 0.0,
                    multiplier: 2.0,
                    max_interval: self.max_delay.max(self.delay),
                    max_elapsed_time: None,
                    ..Default::default()
                };
                backoff.reset();
                Box::new(backoff)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay, Duration::from_millis(1000));
        assert_eq!(policy.strategy, BackoffStrategy::Constant);
    }

    #[test]
    fn test_constant_schedule() {
        let policy = RetryPolicy::constant(2, Duration::from_millis(250));
        assert_eq!(policy.max_attempts(), 3);

        let mut schedule = policy.schedule();
        assert_eq!(schedule.next_backoff(), Some(Duration::from_millis(250)));
        assert_eq!(schedule.next_backoff(), Some(Duration::from_millis(250)));
        assert_eq!(schedule.next_backoff(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_exponential_schedule_is_capped() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_millis(500), Duration::from_millis(1500));
        let mut schedule = policy.schedule();

        assert_eq!(schedule.next_backoff(), Some(Duration::from_millis(500)));
        assert_eq!(schedule.next_backoff(), Some(Duration::from_millis(1000)));
        assert_eq!(schedule.next_backoff(), Some(Duration::from_millis(1500)));
        assert_eq!(schedule.next_backoff(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "constant".parse::<BackoffStrategy>().unwrap(),
            BackoffStrategy::Constant
        );
        assert_eq!(
            "Exponential".parse::<BackoffStrategy>().unwrap(),
            BackoffStrategy::Exponential
        );
        assert!("linear".parse::<BackoffStrategy>().is_err());
    }
}
