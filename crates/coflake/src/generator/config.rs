use core::time::Duration;

use crate::{
    coordinator::RetryPolicy,
    error::{Error, Result},
    generator::{RollbackPolicy, RolloverPolicy},
    id::SnowflakeId,
};

/// Default time-to-live for per-millisecond coordinator keys.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(1);

/// Default bound on the rollover and rollback waits.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Immutable configuration owned by one generator.
///
/// `machine_id`, `epoch` and `prefix` are required; everything else has a
/// default. Nothing is validated until a generator is constructed from it.
///
/// ```
/// use coflake::{GeneratorConfig, RolloverPolicy, CUSTOM_EPOCH};
///
/// let config = GeneratorConfig::new(5, CUSTOM_EPOCH, "orders")
///     .with_rollover(RolloverPolicy::Reacquire);
/// assert_eq!(config.prefix, "orders");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Machine slot, 0 to 1023. Signed so that out-of-range input can be
    /// reported instead of wrapping.
    pub machine_id: i64,

    /// Custom epoch in Unix milliseconds. Must not be in the future.
    pub epoch: u64,

    /// Namespace for coordinator keys, so several ID spaces can share one
    /// backend.
    pub prefix: String,

    /// Expiry set on every coordinator key. At least one second.
    #[cfg_attr(feature = "serde", serde(default = "default_key_ttl"))]
    pub key_ttl: Duration,

    /// Bound on the rollover wait (and the rollback stall).
    #[cfg_attr(feature = "serde", serde(default = "default_wait_timeout"))]
    pub wait_timeout: Duration,

    #[cfg_attr(feature = "serde", serde(default))]
    pub rollover: RolloverPolicy,

    #[cfg_attr(feature = "serde", serde(default))]
    pub rollback: RollbackPolicy,

    #[cfg_attr(feature = "serde", serde(default))]
    pub retry: RetryPolicy,
}

#[cfg(feature = "serde")]
fn default_key_ttl() -> Duration {
    DEFAULT_KEY_TTL
}

#[cfg(feature = "serde")]
fn default_wait_timeout() -> Duration {
    DEFAULT_WAIT_TIMEOUT
}

impl GeneratorConfig {
    pub fn new(machine_id: i64, epoch: u64, prefix: impl Into<String>) -> Self {
        Self {
            machine_id,
            epoch,
            prefix: prefix.into(),
            key_ttl: DEFAULT_KEY_TTL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            rollover: RolloverPolicy::default(),
            rollback: RollbackPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_key_ttl(mut self, key_ttl: Duration) -> Self {
        self.key_ttl = key_ttl;
        self
    }

    #[must_use]
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    #[must_use]
    pub fn with_rollover(mut self, rollover: RolloverPolicy) -> Self {
        self.rollover = rollover;
        self
    }

    #[must_use]
    pub fn with_rollback(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Checks the configuration against the current time `now` (Unix ms) and
    /// returns the machine id as the packed field value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMachineId`] if the machine id is outside 0..=1023
    /// - [`Error::EpochInFuture`] if `epoch > now`
    /// - [`Error::InvalidConfig`] if the key TTL is under one second, or a
    ///   stalling rollback policy could outlive the key TTL
    pub fn validate(&self, now: u64) -> Result<u64> {
        let machine_id = u64::try_from(self.machine_id)
            .ok()
            .filter(|id| *id <= SnowflakeId::MACHINE_ID_MASK)
            .ok_or(Error::InvalidMachineId {
                machine_id: self.machine_id,
            })?;

        if self.epoch > now {
            return Err(Error::EpochInFuture {
                epoch: self.epoch,
                now,
            });
        }

        if self.key_ttl < Duration::from_secs(1) {
            return Err(Error::InvalidConfig {
                reason: "key TTL must be at least one second",
            });
        }

        // A stall longer than the TTL could come back to an expired counter
        // and restart it from 1.
        if self.rollback == RollbackPolicy::Stall && self.wait_timeout >= self.key_ttl {
            return Err(Error::InvalidConfig {
                reason: "wait timeout must be shorter than the key TTL when stalling on rollback",
            });
        }

        Ok(machine_id)
    }
}
