use std::time::Duration;

/// Bounded retry policy for the request/response loop.
///
/// Each attempt transmits the command once and polls the transport for up
/// to `poll_window`. Between attempts the session backs off, doubling from
/// `backoff` up to `max_backoff`. At-least-once delivery is preserved: a
/// command may reach the peripheral more than once, never zero times while
/// attempts remain.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total transmission attempts before giving up.
    pub max_attempts: u32,
    /// How long to poll for a matching response after each transmission.
    pub poll_window: Duration,
    /// Delay before the second attempt.
    pub backoff: Duration,
    /// Ceiling for the exponential backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            poll_window: Duration::from_secs(1),
            backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Policy with a custom polling window.
    pub fn with_poll_window(mut self, poll_window: Duration) -> Self {
        self.poll_window = poll_window;
        self
    }

    /// Backoff delay after the given 1-based attempt number.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let doubled = self
            .backoff
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        doubled.min(self.max_backoff)
    }
}
