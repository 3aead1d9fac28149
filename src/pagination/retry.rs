use crate::config::CrawlerConfig;
use std::time::Duration;

/// Retry budget and pacing shared by every stream of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures tolerated before a stream is abandoned
    pub max_retry: u32,

    /// Wait after a failed fetch before retrying the same cursor
    pub retry_delay: Duration,

    /// Wait after a successful fetch before requesting the next page
    pub request_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retry: u32, retry_delay: Duration, request_delay: Duration) -> Self {
        Self {
            max_retry,
            retry_delay,
            request_delay,
        }
    }

    /// Policy without any waiting, used by tests and dry runs
    pub fn immediate(max_retry: u32) -> Self {
        Self::new(max_retry, Duration::ZERO, Duration::ZERO)
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_retry,
            Duration::from_millis(config.retry_delay_ms),
            Duration::from_millis(config.request_delay_ms),
        )
    }
}

/// Consecutive failure counter for one stream, in `[0, max_retry]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryCounter {
    count: u32,
    max_retry: u32,
}

impl RetryCounter {
    pub fn new(max_retry: u32) -> Self {
        Self {
            count: 0,
            max_retry,
        }
    }

    /// Records a failure and returns true once the budget is exhausted
    pub fn record_failure(&mut self) -> bool {
        self.count = (self.count + 1).min(self.max_retry);
        self.is_exhausted()
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= self.max_retry
    }
}
