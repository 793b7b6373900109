//! Bounded, remember-success initialization.
//!
//! A [`Retrier`] wraps a fallible, zero-argument async action (typically: open a
//! connection and check it answers) and runs it on demand through
//! [`Retrier::trigger`]. The first success is stored and handed out to every later
//! trigger without running the action again. Failures count against a fixed attempt
//! budget; once it is spent the retrier stays exhausted for the rest of its life.
//!
//! The retrier does not sleep between attempts. The configured delay is advisory:
//! callers that poll ask [`Retrier::next_attempt_in`] how long to wait, callers that
//! trigger faster simply get an immediate re-attempt.
//!
//! # Examples
//!
//! ```
//! # use std::num::NonZeroU32;
//! # use std::time::Duration;
//! # use cri_stats::retry::{Retrier, RetryConfig};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = RetryConfig::new("answer", NonZeroU32::new(3).unwrap(), Duration::ZERO);
//! let retrier = Retrier::new(config, || async { Ok::<_, std::io::Error>(42) });
//! assert_eq!(*retrier.trigger().await.unwrap(), 42);
//! # }
//! ```
use std::fmt;
use std::pin::Pin;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};

mod config;
mod error;

pub use config::{RetryConfig, RetryStrategy};
pub use error::RetryError;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type Action<T, E> = Box<dyn Fn() -> BoxFuture<Result<T, E>> + Send + Sync>;

/// Observable state of a [`Retrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStatus {
    /// The action has never run.
    Idle,
    /// An attempt is running right now.
    Bootstrapping,
    /// The last attempt failed; `attempts` failures so far.
    Failing { attempts: u32 },
    /// The action succeeded. Terminal.
    Ready,
    /// The attempt budget is spent. Terminal.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Default)]
struct RetryState {
    attempts: u32,
    last_error: Option<String>,
    last_attempt: Option<Instant>,
}

/// Runs a fallible action until it succeeds once or its attempt budget is spent.
pub struct Retrier<T, E> {
    config: RetryConfig,
    action: Action<T, E>,
    value: OnceLock<T>,
    // Held across the action so concurrent triggers never run it twice at once.
    state: tokio::sync::Mutex<RetryState>,
    // Lock-free mirrors of `state` for `status()`.
    in_flight: AtomicBool,
    failures: AtomicU32,
}

/// Clears the in-flight flag when an attempt finishes or its future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T, E> Retrier<T, E>
where
    T: Send + Sync + 'static,
    E: std::error::Error + 'static,
{
    /// Sets up a retrier over `action` with the given policy. Nothing runs yet.
    pub fn new<F, Fut>(config: RetryConfig, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            config,
            action: Box::new(move || -> BoxFuture<Result<T, E>> { Box::pin(action()) }),
            value: OnceLock::new(),
            state: tokio::sync::Mutex::new(RetryState::default()),
            in_flight: AtomicBool::new(false),
            failures: AtomicU32::new(0),
        }
    }

    /// Runs the action unless it already succeeded or the budget is spent.
    ///
    /// Returns the stored value once the action has succeeded; the action is never
    /// invoked again after that. Concurrent callers wait for an in-flight attempt
    /// and then observe its outcome instead of starting their own.
    ///
    /// # Errors
    ///
    /// * [`RetryError::Attempt`] carrying the action's error if this attempt failed.
    /// * [`RetryError::Exhausted`] if all attempts have already failed. The action is
    ///   not invoked in that case.
    pub async fn trigger(&self) -> Result<&T, RetryError<E>> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let mut state = self.state.lock().await;
        // Someone else may have succeeded while we waited for the lock.
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let budget = self.config.attempt_budget();
        if state.attempts >= budget {
            return Err(RetryError::Exhausted {
                name: self.config.name.clone(),
                attempts: state.attempts,
                last_error: state.last_error.clone().unwrap_or_default(),
            });
        }

        state.last_attempt = Some(Instant::now());
        // Cleared on return, after the outcome is recorded.
        let _attempt = InFlight::start(&self.in_flight);
        let outcome = (self.action)().await;
        if outcome.is_err() {
            state.attempts += 1;
            self.failures.store(state.attempts, Ordering::Release);
        }

        match outcome {
            Ok(value) => {
                state.last_error = None;
                Ok(self.value.get_or_init(|| value))
            }
            Err(err) => {
                state.last_error = Some(err.to_string());
                log::debug!(
                    "{}: attempt {}/{} failed: {}",
                    self.config.name,
                    state.attempts,
                    budget,
                    err
                );
                Err(RetryError::Attempt {
                    name: self.config.name.clone(),
                    attempt: state.attempts,
                    max_attempts: budget,
                    source: err,
                })
            }
        }
    }

    /// Returns the stored value without triggering.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Reports the current state without triggering or waiting.
    ///
    /// [`RetryStatus::Bootstrapping`] means the action itself is running, not merely
    /// that some caller holds the internal lock.
    pub fn status(&self) -> RetryStatus {
        if self.value.get().is_some() {
            return RetryStatus::Ready;
        }
        if self.in_flight.load(Ordering::Acquire) {
            return RetryStatus::Bootstrapping;
        }
        match self.failures.load(Ordering::Acquire) {
            0 => RetryStatus::Idle,
            n if n >= self.config.attempt_budget() => RetryStatus::Exhausted { attempts: n },
            n => RetryStatus::Failing { attempts: n },
        }
    }

    /// How long a caller honoring the configured delay should wait before the next
    /// trigger.
    ///
    /// Returns `None` if triggering now is fine, which includes the ready and
    /// exhausted states where a trigger does not run the action anyway.
    pub async fn next_attempt_in(&self) -> Option<Duration> {
        if self.value.get().is_some() {
            return None;
        }
        let state = self.state.lock().await;
        if state.attempts == 0 || state.attempts >= self.config.attempt_budget() {
            return None;
        }
        let elapsed = state.last_attempt?.elapsed();
        self.config.delay.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    pub fn retry_delay(&self) -> Duration {
        self.config.delay
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Retrier<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("config", &self.config)
            .field("value", &self.value.get())
            .finish_non_exhaustive()
    }
}
