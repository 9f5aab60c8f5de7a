use core::{fmt, future::Future, pin::pin, time::Duration};

use futures::future::{Either, select};
#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

use crate::{
    coordinator::{AttemptError, SequenceKey},
    error::{BoxError, Error, Result},
    futures::{AsyncSequenceCoordinator, SleepProvider},
    generator::{
        GeneratorConfig, RollbackPolicy, RolloverPolicy,
        state::{ClockCheck, RollbackGuard, Step, pack},
    },
    id::{DecodedId, SnowflakeId},
    time::{Instant, TimeSource},
};

/// Default bound on a single async coordinator call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(250);

/// The async counterpart of [`CoordinatedGenerator`].
///
/// Runs the same generation state machine against an
/// [`AsyncSequenceCoordinator`]. Instead of spinning through a millisecond
/// rollover it sleeps with the chosen [`SleepProvider`], and every
/// coordinator call is raced against a timer so a stalled backend surfaces
/// as [`Error::CoordinatorTimedOut`]. Dropping the returned future cancels
/// the call.
///
/// [`CoordinatedGenerator`]: crate::CoordinatedGenerator
///
/// # Example
/// ```
/// # #[cfg(feature = "async-tokio")]
/// # {
/// use coflake::{AsyncCoordinatedGenerator, GeneratorConfig, MemoryCoordinator, SystemClock, TokioSleep, CUSTOM_EPOCH};
///
/// # tokio_test();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test() {
/// let generator = AsyncCoordinatedGenerator::new(
///     MemoryCoordinator::new(),
///     SystemClock,
///     GeneratorConfig::new(5, CUSTOM_EPOCH, "orders"),
/// )
/// .unwrap();
///
/// let id = generator.generate::<TokioSleep>().await.unwrap();
/// assert_eq!(id.machine_id(), 5);
/// # }
/// # }
/// ```
pub struct AsyncCoordinatedGenerator<C, T>
where
    C: AsyncSequenceCoordinator,
    T: TimeSource,
{
    coordinator: C,
    time: T,
    config: GeneratorConfig,
    machine_id: u64,
    guard: RollbackGuard,
    call_timeout: Duration,
}

impl<C, T> AsyncCoordinatedGenerator<C, T>
where
    C: AsyncSequenceCoordinator,
    T: TimeSource,
{
    /// Creates a generator after validating `config` against the current
    /// time.
    ///
    /// # Errors
    ///
    /// Same as [`CoordinatedGenerator::new`].
    ///
    /// [`CoordinatedGenerator::new`]: crate::CoordinatedGenerator::new
    pub fn new(coordinator: C, time: T, config: GeneratorConfig) -> Result<Self> {
        let machine_id = config.validate(time.current_millis())?;
        let guard = RollbackGuard::new(config.rollback);
        Ok(Self {
            coordinator,
            time,
            config,
            machine_id,
            guard,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        })
    }

    /// Bounds every `increment` and `expire` call.
    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn machine_id(&self) -> u64 {
        self.machine_id
    }

    pub fn epoch(&self) -> u64 {
        self.config.epoch
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn coordinator(&self) -> &C {
        &self.coordinator
    }

    pub fn decode(&self, id: SnowflakeId) -> DecodedId {
        DecodedId::new(id, self.config.epoch)
    }

    /// Resolves to the next ID, sleeping with `S` through a millisecond
    /// rollover.
    ///
    /// # Errors
    ///
    /// - [`Error::CoordinatorUnavailable`] if the coordinator fails (after
    ///   the configured retries)
    /// - [`Error::CoordinatorTimedOut`] if a call outlives the call timeout
    /// - [`Error::ClockWaitTimedOut`] if the clock does not advance within the
    ///   wait timeout
    /// - [`Error::ClockMovedBackwards`] under [`RollbackPolicy::Reject`]
    /// - [`Error::TimestampOverflow`] once the 41-bit field is exhausted
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(prefix = %self.config.prefix, machine_id = self.machine_id)))]
    pub async fn generate<S>(&self) -> Result<SnowflakeId>
    where
        S: SleepProvider,
    {
        // prefix, two dashes, and up to 4 + 20 digits
        let mut key = String::with_capacity(self.config.prefix.len() + 26);
        let mut step = Step::Compute;
        loop {
            step = match step {
                Step::Compute => self.compute::<S>(&mut key).await?,
                Step::Exhausted { timestamp } => self.advance::<S>(timestamp).await?,
                Step::Emit {
                    timestamp,
                    sequence,
                } => {
                    let id = pack(self.config.epoch, self.machine_id, timestamp, sequence)?;
                    self.guard.record(timestamp);
                    return Ok(id);
                }
            };
        }
    }

    async fn compute<S: SleepProvider>(&self, key: &mut String) -> Result<Step> {
        let mut attempt = 1;
        loop {
            match self.attempt::<S>(key).await {
                Ok(step) => return Ok(step),
                Err(err) => {
                    S::timer(self.config.retry.next_backoff(attempt, err)?).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One clock read and one counter round trip, so a retry after a long
    /// backoff lands on the key of the current millisecond.
    async fn attempt<S: SleepProvider>(&self, key: &mut String) -> Result<Step, AttemptError> {
        let now = self.read_clock::<S>().await?;
        SequenceKey::new(&self.config.prefix, self.machine_id, now).write_into(key);

        let raw = self
            .call::<S, _, _>("increment", self.coordinator.increment(key.as_str()))
            .await?;
        self.call::<S, _, _>(
            "expire",
            self.coordinator.expire(key.as_str(), self.config.key_ttl),
        )
        .await?;

        Ok(Step::from_counter(now, raw))
    }

    async fn advance<S: SleepProvider>(&self, timestamp: u64) -> Result<Step> {
        let next = self.wait_until_after::<S>(timestamp).await?;

        #[cfg(feature = "tracing")]
        debug!(from = timestamp, to = next, policy = ?self.config.rollover, "sequence exhausted, rolled over");

        Ok(match self.config.rollover {
            RolloverPolicy::EmitZero => Step::Emit {
                timestamp: next,
                sequence: 0,
            },
            RolloverPolicy::Reacquire => Step::Compute,
        })
    }

    async fn read_clock<S: SleepProvider>(&self) -> Result<u64> {
        let now = self.time.current_millis();
        match self.guard.check(now) {
            ClockCheck::Ok => Ok(now),
            ClockCheck::Behind { last } => {
                #[cfg(feature = "tracing")]
                warn!(now, last, policy = ?self.guard.policy(), "clock moved backwards");

                match self.guard.policy() {
                    RollbackPolicy::Reject => Err(Error::ClockMovedBackwards { now, last }),
                    RollbackPolicy::Stall => self.wait_until_after::<S>(last - 1).await,
                    RollbackPolicy::Ignore => Ok(now),
                }
            }
        }
    }

    /// Sleeps until the clock passes `after`, bounded by the wait timeout.
    async fn wait_until_after<S: SleepProvider>(&self, after: u64) -> Result<u64> {
        let start = Instant::now();
        loop {
            let now = self.time.current_millis();
            if now > after {
                return Ok(now);
            }
            let waited = start.elapsed();
            if waited >= self.config.wait_timeout {
                return Err(Error::ClockWaitTimedOut { after, waited });
            }
            S::sleep_for(Duration::from_millis(after + 1 - now)).await;
        }
    }

    /// Races one coordinator call against the call timeout. A timeout is not
    /// retried.
    async fn call<S, V, E>(
        &self,
        op: &'static str,
        call: impl Future<Output = core::result::Result<V, E>>,
    ) -> Result<V, AttemptError>
    where
        S: SleepProvider,
        E: Into<BoxError>,
    {
        let call = pin!(call);
        let timer = pin!(S::timer(self.call_timeout));
        match select(call, timer).await {
            Either::Left((outcome, _)) => {
                outcome.map_err(|err| AttemptError::coordinator(op, err))
            }
            Either::Right(((), _)) => Err(Error::CoordinatorTimedOut {
                timeout: self.call_timeout,
            }
            .into()),
        }
    }
}

impl<C, T> fmt::Debug for AsyncCoordinatedGenerator<C, T>
where
    C: AsyncSequenceCoordinator,
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCoordinatedGenerator")
            .field("config", &self.config)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
