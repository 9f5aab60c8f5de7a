use core::fmt;

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

use crate::{
    coordinator::{AttemptError, SequenceCoordinator, SequenceKey},
    error::{Error, Result},
    generator::{
        GeneratorConfig, Poll, RollbackPolicy, RolloverPolicy,
        state::{ClockCheck, RollbackGuard, Step, pack},
    },
    id::{DecodedId, SnowflakeId},
    time::TimeSource,
};

/// A Snowflake generator whose per-millisecond sequence comes from a shared
/// [`SequenceCoordinator`].
///
/// The generator itself holds no mutable sequence state. Every call takes the
/// current millisecond, increments the coordinator counter keyed by
/// `"{prefix}-{machine_id}-{millis}"`, and packs the result. Any number of
/// threads, processes or hosts sharing a machine id stay collision-free as long
/// as they share the coordinator.
///
/// ## Features
/// - ✅ Thread-safe (`Send + Sync` when the coordinator and clock are)
/// - ✅ Safe across processes that share a machine id and a coordinator
/// - ⚠️ One coordinator round trip per ID
///
/// ## See Also
/// - [`AsyncCoordinatedGenerator`] for async backends
///
/// [`AsyncCoordinatedGenerator`]: crate::AsyncCoordinatedGenerator
pub struct CoordinatedGenerator<C, T>
where
    C: SequenceCoordinator,
    T: TimeSource,
{
    coordinator: C,
    time: T,
    config: GeneratorConfig,
    machine_id: u64,
    guard: RollbackGuard,
}

impl<C, T> CoordinatedGenerator<C, T>
where
    C: SequenceCoordinator,
    T: TimeSource,
{
    /// Creates a generator after validating `config` against the current
    /// time.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMachineId`] if the machine id is outside 0..=1023
    /// - [`Error::EpochInFuture`] if the epoch is later than `time` reports
    /// - [`Error::InvalidConfig`] for unusable TTL or wait settings
    ///
    /// # Example
    /// ```
    /// use coflake::{
    ///     CoordinatedGenerator, GeneratorConfig, MemoryCoordinator, SystemClock, CUSTOM_EPOCH,
    /// };
    ///
    /// let generator = CoordinatedGenerator::new(
    ///     MemoryCoordinator::new(),
    ///     SystemClock,
    ///     GeneratorConfig::new(5, CUSTOM_EPOCH, "orders"),
    /// )
    /// .unwrap();
    ///
    /// let id = generator.generate().unwrap();
    /// assert_eq!(id.machine_id(), 5);
    /// ```
    pub fn new(coordinator: C, time: T, config: GeneratorConfig) -> Result<Self> {
        let machine_id = config.validate(time.current_millis())?;
        let guard = RollbackGuard::new(config.rollback);
        Ok(Self {
            coordinator,
            time,
            config,
            machine_id,
            guard,
        })
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

    pub fn coordinator(&self) -> &C {
        &self.coordinator
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    /// Resolves an ID's fields against this generator's epoch.
    pub fn decode(&self, id: SnowflakeId) -> DecodedId {
        DecodedId::new(id, self.config.epoch)
    }

    /// Mints one ID, blocking through a millisecond rollover if needed.
    ///
    /// # Errors
    ///
    /// - [`Error::CoordinatorUnavailable`] if the coordinator fails (after
    ///   the configured retries)
    /// - [`Error::ClockWaitTimedOut`] if the clock does not advance within the
    ///   wait timeout
    /// - [`Error::ClockMovedBackwards`] under [`RollbackPolicy::Reject`]
    /// - [`Error::TimestampOverflow`] once the 41-bit field is exhausted
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(prefix = %self.config.prefix, machine_id = self.machine_id)))]
    pub fn generate(&self) -> Result<SnowflakeId> {
        let mut key = self.key_buffer();
        let mut step = Step::Compute;
        loop {
            step = match step {
                Step::Compute => self.compute(&mut key)?,
                Step::Exhausted { timestamp } => self.advance(timestamp)?,
                Step::Emit {
                    timestamp,
                    sequence,
                } => return self.emit(timestamp, sequence),
            };
        }
    }

    /// Makes a single attempt without waiting.
    ///
    /// Returns [`Poll::Exhausted`] instead of blocking when the current
    /// millisecond is full; the caller decides how to wait and calls again.
    /// Repeated polls always take a fresh counter, so this path never emits
    /// the rollover sequence 0.
    ///
    /// # Errors
    ///
    /// Same as [`Self::generate`]. A full millisecond is reported as
    /// [`Poll::Exhausted`] rather than waited out, so the only wait left is
    /// the rollback stall under [`RollbackPolicy::Stall`], which can still
    /// fail with [`Error::ClockWaitTimedOut`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut key = self.key_buffer();
        let mut step = Step::Compute;
        loop {
            step = match step {
                Step::Compute => self.compute(&mut key)?,
                Step::Exhausted { timestamp } => return Ok(Poll::Exhausted { timestamp }),
                Step::Emit {
                    timestamp,
                    sequence,
                } => {
                    return Ok(Poll::Ready {
                        id: self.emit(timestamp, sequence)?,
                    });
                }
            };
        }
    }

    fn key_buffer(&self) -> String {
        // prefix, two dashes, and up to 4 + 20 digits
        String::with_capacity(self.config.prefix.len() + 26)
    }

    /// One clock read and one counter round trip per attempt, so a retry
    /// after a long backoff lands on the key of the current millisecond.
    fn compute(&self, key: &mut String) -> Result<Step> {
        self.config.retry.run(|| {
            let now = self.read_clock()?;
            SequenceKey::new(&self.config.prefix, self.machine_id, now).write_into(key);

            let raw = self
                .coordinator
                .increment(key.as_str())
                .map_err(|err| AttemptError::coordinator("increment", err))?;
            self.coordinator
                .expire(key.as_str(), self.config.key_ttl)
                .map_err(|err| AttemptError::coordinator("expire", err))?;

            Ok(Step::from_counter(now, raw))
        })
    }

    fn advance(&self, timestamp: u64) -> Result<Step> {
        let next = self
            .time
            .wait_until_after(timestamp, self.config.wait_timeout)?;

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

    fn emit(&self, timestamp: u64, sequence: u64) -> Result<SnowflakeId> {
        let id = pack(self.config.epoch, self.machine_id, timestamp, sequence)?;
        self.guard.record(timestamp);
        Ok(id)
    }

    fn read_clock(&self) -> Result<u64> {
        let now = self.time.current_millis();
        match self.guard.check(now) {
            ClockCheck::Ok => Ok(now),
            ClockCheck::Behind { last } => {
                #[cfg(feature = "tracing")]
                warn!(now, last, policy = ?self.guard.policy(), "clock moved backwards");

                match self.guard.policy() {
                    RollbackPolicy::Reject => Err(Error::ClockMovedBackwards { now, last }),
                    // `last - 1` so the wait returns as soon as the clock is back at `last`
                    RollbackPolicy::Stall => self
                        .time
                        .wait_until_after(last - 1, self.config.wait_timeout),
                    RollbackPolicy::Ignore => Ok(now),
                }
            }
        }
    }
}

impl<C, T> fmt::Debug for CoordinatedGenerator<C, T>
where
    C: SequenceCoordinator,
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatedGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
