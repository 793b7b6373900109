/// Outcome of a failed [`Retrier::trigger`](super::Retrier::trigger).
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The action ran and failed. More attempts remain, or this was the last one.
    #[error("{name}: attempt {attempt}/{max_attempts} failed: {source}")]
    Attempt {
        name: String,
        attempt: u32,
        max_attempts: u32,
        #[source]
        source: E,
    },
    /// Every attempt failed; the action will not run again.
    #[error("{name}: retries exhausted after {attempts} attempts, last error: {last_error}")]
    Exhausted {
        name: String,
        attempts: u32,
        last_error: String,
    },
}

impl<E> RetryError<E> {
    /// Returns true if the retrier has given up permanently.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns true if a later trigger may still run the action.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Attempt {
                attempt,
                max_attempts,
                ..
            } => attempt < max_attempts,
            Self::Exhausted { .. } => false,
        }
    }

    /// The action's own error, if this outcome came from running it.
    pub fn attempt_error(&self) -> Option<&E> {
        match self {
            Self::Attempt { source, .. } => Some(source),
            Self::Exhausted { .. } => None,
        }
    }
}
