//! Interval and retry policies for the check scheduler

use std::time::Duration;

use rand::Rng;

use crate::config::{ScheduleConfig, TargetConfig};
use crate::model::Mode;

/// Chooses the wait before the next check cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    fast: Duration,
    slow_min_secs: u64,
    slow_max_secs: u64,
}

impl IntervalPolicy {
    pub fn new(fast: Duration, slow_min_secs: u64, slow_max_secs: u64) -> Self {
        Self {
            fast,
            slow_min_secs,
            slow_max_secs: slow_max_secs.max(slow_min_secs),
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(
            Duration::from_secs(config.fast_interval_seconds),
            config.slow_min_seconds,
            config.slow_max_seconds,
        )
    }

    /// Interval for the next wait. Slow mode draws whole seconds uniformly
    /// from the inclusive configured range.
    pub fn next_interval<R: Rng + ?Sized>(&self, mode: Mode, rng: &mut R) -> Duration {
        match mode {
            Mode::Fast => self.fast,
            Mode::Slow => {
                Duration::from_secs(rng.random_range(self.slow_min_secs..=self.slow_max_secs))
            }
        }
    }
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self::from_config(&ScheduleConfig::default())
    }
}

/// Bounded retry with doubling delay for reaching the target page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &TargetConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            initial_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TargetConfig::default())
    }
}
