//! Retry bound and backoff schedule for upstream fetches.

use std::sync::Arc;
use std::time::Duration;

/// Delay before the retry that follows a failed attempt.
pub trait BackoffStrategy: Send + Sync {
    /// Delay after failed attempt number `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration;
}

/// `attempt × base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    base_delay: Duration,
}

impl LinearBackoff {
    /// Build a linear schedule from its step.
    #[must_use]
    pub const fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }
}

impl BackoffStrategy for LinearBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// How many attempts a fetch gets and how long to wait between them.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Arc<dyn BackoffStrategy>,
}

impl RetryPolicy {
    /// Default attempt bound, counting the first attempt.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Default linear backoff step.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

    /// Build a policy from an explicit backoff strategy.
    ///
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, backoff: Arc<dyn BackoffStrategy>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy using [`LinearBackoff`].
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use backend::domain::RetryPolicy;
    ///
    /// let policy = RetryPolicy::linear(3, Duration::from_millis(100));
    /// assert_eq!(policy.max_attempts(), 3);
    /// assert_eq!(policy.delay_after(2), Duration::from_millis(200));
    /// ```
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self::new(max_attempts, Arc::new(LinearBackoff::new(base_delay)))
    }

    /// Total attempts permitted, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt number `attempt`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_DELAY)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
