use std::num::NonZeroU32;
use std::time::Duration;

/// How a [`Retrier`](super::Retrier) spends its attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Up to `max_attempts` attempts.
    #[default]
    Count,
    /// A single attempt, regardless of `max_attempts`.
    OneTry,
}

/// Retry policy for a [`Retrier`](super::Retrier).
///
/// The policy is fixed at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Label used in log lines and errors.
    pub name: String,
    pub strategy: RetryStrategy,
    pub max_attempts: NonZeroU32,
    /// Minimum spacing callers should leave between two triggers after a failure.
    ///
    /// The retrier never sleeps on its own; see [`Retrier::next_attempt_in`].
    ///
    /// [`Retrier::next_attempt_in`]: super::Retrier::next_attempt_in
    pub delay: Duration,
}

impl RetryConfig {
    pub fn new(name: impl Into<String>, max_attempts: NonZeroU32, delay: Duration) -> Self {
        Self {
            name: name.into(),
            strategy: RetryStrategy::Count,
            max_attempts,
            delay,
        }
    }

    /// A policy that gives the action exactly one chance.
    pub fn one_try(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: RetryStrategy::OneTry,
            max_attempts: NonZeroU32::MIN,
            delay: Duration::ZERO,
        }
    }

    /// Number of attempts after which the retrier gives up for good.
    pub fn attempt_budget(&self) -> u32 {
        match self.strategy {
            RetryStrategy::Count => self.max_attempts.get(),
            RetryStrategy::OneTry => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_budget_follows_strategy() {
        let count = RetryConfig::new("count", NonZeroU32::new(7).unwrap(), Duration::ZERO);
        assert_eq!(count.attempt_budget(), 7);

        let mut one = RetryConfig::one_try("one");
        assert_eq!(one.attempt_budget(), 1);
        one.max_attempts = NonZeroU32::new(9).unwrap();
        assert_eq!(one.attempt_budget(), 1);
    }
}
