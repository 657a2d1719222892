//! Bounded retry with exponential backoff for generation turns.
//!
//! Stateless apart from its configuration: the agent loop tracks the attempt
//! number and asks the policy whether to go again and how long to wait.

use std::time::Duration;

use writers_room_types::config::RoomConfig;

/// Upper bound on a single backoff delay.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// How many times a turn is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per turn, including the first. Always at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            base_delay,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(MAX_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RoomConfig::default())
    }
}

impl From<&RoomConfig> for RetryPolicy {
    fn from(config: &RoomConfig) -> Self {
        Self::new(config.generation_retries, config.retry_backoff())
    }
}
