//! Client configuration

use std::time::Duration;

/// Retry budget and backoff shape for communication failures
///
/// Applies only to "could not communicate" errors on a send attempt; a remote
/// task that reports failure is data and is never retried. The default budget
/// is zero retries; callers opt in explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial try
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent attempt
    pub base_delay: Duration,

    /// Upper bound on the backoff delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self::default()
    }

    /// Retry up to `max_retries` times with the default backoff shape
    pub fn retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Backoff delay before retry number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Configuration for a node client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint identity of the target node
    pub endpoint: String,

    /// Deadline for one full exchange (send plus tracking to terminal)
    pub timeout: Duration,

    /// How often to poll a non-terminal task
    pub poll_interval: Duration,

    /// Retry budget for communication failures
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(50),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the exchange deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero_retries() {
        assert_eq!(RetryPolicy::default().max_retries, 0);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(450),
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        // Capped from here on
        assert_eq!(policy.delay_for(3), Duration::from_millis(450));
        assert_eq!(policy.delay_for(30), Duration::from_millis(450));
    }
}
