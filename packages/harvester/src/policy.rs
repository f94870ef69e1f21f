//! Per-adapter rate limiting and retry policy.
//!
//! Every network call made by a [`crate::sources::StatuteSource`] goes through
//! [`RetryPolicy::run`], which waits on the adapter's own [`RateLimiter`]
//! before each attempt. Limiters are never shared between adapters, so two
//! jurisdictions cannot throttle each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{
    DEFAULT_MAX_RETRIES, MAX_RATE_LIMIT_SECS, MAX_RETRY_DELAY_MS, RETRY_BASE_DELAY_MS,
};
use crate::error::{FetchFailure, HarvesterError, RequestTarget, Result};

/// Classified outcome of one failed attempt.
#[derive(Debug)]
pub enum Failure {
    /// Worth retrying: timeouts, 5xx, remote rate limiting.
    Transient(FetchFailure),

    /// The requested code or section does not exist.
    NotFound,

    /// Missing or rejected credential.
    Auth(String),

    /// Will not succeed on retry (e.g. other 4xx responses).
    Permanent(FetchFailure),

    /// Any other error, surfaced as-is.
    Other(HarvesterError),
}

impl Failure {
    /// Convert into the public error, attaching the request coordinates.
    #[must_use]
    pub fn into_error(self, target: RequestTarget, attempts: u32) -> HarvesterError {
        match self {
            Self::Transient(source) | Self::Permanent(source) => HarvesterError::Fetch {
                target,
                attempts,
                source,
            },
            Self::NotFound => HarvesterError::NotFound { target },
            Self::Auth(message) => HarvesterError::Auth { target, message },
            Self::Other(err) => err,
        }
    }
}

impl From<HarvesterError> for Failure {
    fn from(err: HarvesterError) -> Self {
        Self::Other(err)
    }
}

/// Cooperative cancellation signal checked between attempts.
///
/// A request already in flight always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop at the next retry boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Enforces a minimum interval between the starts of successive requests.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Create a limiter from a configured number of seconds.
    ///
    /// Negative or non-finite values disable throttling; values above
    /// `MAX_RATE_LIMIT_SECS` are clamped to it.
    #[must_use]
    pub fn from_secs(seconds: f64) -> Self {
        let interval = if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f64(seconds.min(MAX_RATE_LIMIT_SECS))
        } else {
            Duration::ZERO
        };
        Self::new(interval)
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the next request may start, then claim that slot.
    ///
    /// The lock is held while sleeping so concurrent callers on the same
    /// adapter are serialized. Returns how long the caller waited.
    pub fn wait(&self) -> Duration {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut waited = Duration::ZERO;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval - elapsed;
                tracing::debug!(wait_ms = waited.as_millis() as u64, "Rate limit wait");
                thread::sleep(waited);
            }
        }

        *last = Some(Instant::now());
        waited
    }
}

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    cancel: Option<CancelFlag>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` retries after the first attempt.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
            cancel: None,
        }
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the cap on any single backoff wait.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Attach a cancellation flag checked between attempts.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[must_use]
    pub fn cancel_flag(&self) -> Option<&CancelFlag> {
        self.cancel.as_ref()
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff before retry number `retry` (1-based): base, 2×base, 4×base, ...
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    ///
    /// `op` receives the 1-based attempt number. Every attempt waits on
    /// `limiter` first; there is no path to the network that skips it.
    pub fn run<T, F>(&self, limiter: &RateLimiter, target: &RequestTarget, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> std::result::Result<T, Failure>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.check_cancelled(target)?;
            limiter.wait();

            let failure = match op(attempt) {
                Ok(value) => return Ok(value),
                Err(Failure::Transient(failure)) => failure,
                Err(other) => return Err(other.into_error(target.clone(), attempt)),
            };

            if attempt > self.max_retries {
                tracing::warn!(
                    request = %target,
                    attempts = attempt,
                    error = %failure,
                    "Retries exhausted"
                );
                return Err(HarvesterError::Fetch {
                    target: target.clone(),
                    attempts: attempt,
                    source: failure,
                });
            }

            let mut delay = self.backoff_delay(attempt);
            if let FetchFailure::RateLimited {
                retry_after: Some(retry_after),
            } = &failure
            {
                delay = delay.max(*retry_after).min(self.max_delay);
            }

            tracing::warn!(
                request = %target,
                attempt,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Transient failure, will retry"
            );

            self.check_cancelled(target)?;
            thread::sleep(delay);
        }
    }

    fn check_cancelled(&self, target: &RequestTarget) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(HarvesterError::Cancelled {
                target: target.clone(),
            }),
            _ => Ok(()),
        }
    }
}
