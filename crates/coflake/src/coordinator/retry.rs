use core::time::Duration;

use rand::Rng;
#[cfg(feature = "tracing")]
use tracing::warn;

use crate::error::{BoxError, Error, Result};

/// How the generator treats a failed coordinator call.
///
/// The default is fail-fast: one attempt, and the failure surfaces as
/// [`Error::CoordinatorUnavailable`]. Opting into retries sleeps with
/// exponential backoff between attempts. There is never a fallback to local
/// sequencing, which would reintroduce cross-process collisions.
///
/// A retry starts the whole attempt over: the clock is read again and the
/// counter key rebuilt, so a retry never increments the counter of a
/// millisecond whose TTL may have run out during the backoff. A lost response
/// may skip a sequence number but cannot hand the same number out twice.
///
/// ```
/// use coflake::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::exponential(4, Duration::from_millis(2))
///     .with_max_backoff(Duration::from_millis(5))
///     .with_jitter(false);
///
/// assert_eq!(policy.backoff_for(1), Duration::from_millis(2));
/// assert_eq!(policy.backoff_for(2), Duration::from_millis(4));
/// assert_eq!(policy.backoff_for(3), Duration::from_millis(5));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Sleep before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single sleep.
    pub max_backoff: Duration,
    /// Randomize each sleep within `[backoff / 2, backoff]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fail_fast()
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub const fn fail_fast() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter: false,
        }
    }

    /// Up to `max_attempts` attempts, doubling the sleep after each failure
    /// starting from `initial_backoff`, capped at one second, with jitter.
    pub const fn exponential(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: Duration::from_secs(1),
            jitter: true,
        }
    }

    #[must_use]
    pub const fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub(crate) const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// The sleep before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        let base = self
            .initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff);

        if !self.jitter || base.is_zero() {
            return base;
        }

        let nanos = u64::try_from(base.as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(rand::rng().random_range(nanos / 2..=nanos))
    }

    /// Decides what follows failed attempt number `attempt`: the sleep
    /// before the next one, or the error to surface.
    pub(crate) fn next_backoff(&self, attempt: u32, err: AttemptError) -> Result<Duration> {
        match err {
            AttemptError::Fatal(err) => Err(err),
            AttemptError::Coordinator { op, source } if attempt < self.attempts() => {
                let backoff = self.backoff_for(attempt);
                #[cfg(feature = "tracing")]
                warn!(op, attempt, ?backoff, error = %source, "coordinator call failed, retrying");
                #[cfg(not(feature = "tracing"))]
                let _ = (op, source);
                Ok(backoff)
            }
            AttemptError::Coordinator { source, .. } => Err(Error::coordinator(attempt, source)),
        }
    }

    /// Runs `attempt` until it succeeds or the attempts run out, sleeping the
    /// calling thread between attempts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoordinatorUnavailable`] carrying the last coordinator
    /// failure, or the first fatal error unchanged.
    pub(crate) fn run<T, F>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Result<T, AttemptError>,
    {
        let mut n = 1;
        loop {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    std::thread::sleep(self.next_backoff(n, err)?);
                    n += 1;
                }
            }
        }
    }
}

/// Why one generation attempt failed.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// A coordinator call failed. The attempt may be retried from scratch.
    Coordinator { op: &'static str, source: BoxError },
    /// Ends generation without retrying.
    Fatal(Error),
}

impl AttemptError {
    pub(crate) fn coordinator<E>(op: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Coordinator {
            op,
            source: source.into(),
        }
    }
}

impl From<Error> for AttemptError {
    fn from(err: Error) -> Self {
        Self::Fatal(err)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("backend down")]
    struct Down;

    #[test]
    fn fail_fast_makes_one_attempt() {
        let calls = Cell::new(0);
        let err = RetryPolicy::fail_fast()
            .run(|| {
                calls.set(calls.get() + 1);
                Err::<u64, _>(AttemptError::coordinator("increment", Down))
            })
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert!(matches!(err, Error::CoordinatorUnavailable { attempts: 1, .. }));
    }

    #[test]
    fn retries_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::exponential(5, Duration::from_micros(10));
        let value = policy
            .run(|| {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(AttemptError::coordinator("increment", Down))
                } else {
                    Ok(7_u64)
                }
            })
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::exponential(3, Duration::from_micros(10));
        let err = policy
            .run(|| {
                calls.set(calls.get() + 1);
                Err::<(), _>(AttemptError::coordinator("expire", Down))
            })
            .unwrap_err();

        assert_eq!(calls.get(), 3);
        assert!(matches!(err, Error::CoordinatorUnavailable { attempts: 3, .. }));
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("backend down".to_owned())
        );
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let calls = Cell::new(0);
        let err = RetryPolicy::exponential(5, Duration::from_micros(10))
            .run(|| {
                calls.set(calls.get() + 1);
                Err::<u64, _>(Error::ClockMovedBackwards { now: 1, last: 2 }.into())
            })
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert!(matches!(err, Error::ClockMovedBackwards { now: 1, last: 2 }));
    }

    #[test]
    fn zero_attempts_means_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::fail_fast()
        };
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn jitter_stays_within_half_to_full_backoff() {
        let policy = RetryPolicy::exponential(10, Duration::from_millis(8));
        for retry in 1..=6 {
            let full = policy.with_jitter(false).backoff_for(retry);
            let jittered = policy.backoff_for(retry);
            assert!(jittered <= full);
            assert!(jittered >= full / 2);
        }
    }
}
