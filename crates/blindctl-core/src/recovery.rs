//! Reconnect backoff policy.
//!
//! HTTP commands are never retried; only the long-lived log socket
//! reconnects. The delay between attempts grows exponentially, is capped,
//! and carries ±25% jitter.
//!
//! ```
//! use blindctl_core::recovery::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig {
//!     max_retries: 3,
//!     initial_delay: Duration::from_millis(100),
//!     max_delay: Duration::from_secs(5),
//!     multiplier: 2.0,
//! };
//! assert!(config.allows_attempt(3));
//! assert!(!config.allows_attempt(4));
//! ```

use std::time::Duration;

use rand::Rng;

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first one.
    pub max_retries: u32,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth).
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles each time).
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::for_reconnect()
    }
}

impl RetryConfig {
    /// Reconnect policy for the device log socket.
    pub fn for_reconnect() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    /// No retries at all: one attempt, then give up.
    pub fn single_attempt() -> Self {
        Self {
            max_retries: 0,
            ..Self::for_reconnect()
        }
    }

    /// Returns true if retry number `retry` (1-based) is still allowed.
    pub fn allows_attempt(&self, retry: u32) -> bool {
        retry <= self.max_retries
    }

    /// Calculate delay for a given attempt number with jitter.
    ///
    /// `attempt` is 0-based: attempt 0 waits about `initial_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);

        let capped_delay = base_delay.min(self.max_delay.as_secs_f64());

        let jitter_range = capped_delay * 0.25;
        let jitter = if jitter_range > 0.0 {
            rand::rng().random_range(-jitter_range..jitter_range)
        } else {
            0.0
        };
        let final_delay = (capped_delay + jitter)
            .max(0.0)
            .min(self.max_delay.as_secs_f64());

        Duration::from_secs_f64(final_delay)
    }
}

/// Trait for determining if an error is retryable.
pub trait Retryable {
    /// Returns true if the operation that caused this error should be retried.
    fn is_retryable(&self) -> bool;
}
