use core::time::Duration;

use crate::id::SnowflakeId;

/// A result type that defaults to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A type-erased error raised by a sequence coordinator backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that `coflake` can produce.
///
/// Construction-time failures ([`Error::InvalidMachineId`],
/// [`Error::EpochInFuture`]) never surface from generation. Everything else is
/// a runtime condition the caller decides how to handle; nothing here is
/// silently downgraded to local-only sequencing.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The machine id does not fit the 10-bit machine field.
    #[error("machine id {machine_id} is outside 0..={max}", max = SnowflakeId::MACHINE_ID_MASK)]
    InvalidMachineId { machine_id: i64 },

    /// The custom epoch lies after the current time, so every timestamp delta
    /// would be negative.
    #[error("epoch {epoch}ms is later than the current time {now}ms")]
    EpochInFuture { epoch: u64, now: u64 },

    /// Some other configuration value cannot work, e.g. a key TTL under one
    /// second.
    #[error("invalid generator configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    /// The coordinator could not complete an `increment` or `expire` call.
    #[error("sequence coordinator unavailable after {attempts} attempt(s): {source}")]
    CoordinatorUnavailable {
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// An async coordinator call did not finish within the configured timeout.
    #[error("sequence coordinator call exceeded {timeout:?}")]
    CoordinatorTimedOut { timeout: Duration },

    /// The clock did not advance past `after` within `waited`.
    #[error("clock did not advance past {after}ms within {waited:?}")]
    ClockWaitTimedOut { after: u64, waited: Duration },

    /// The clock reported a time earlier than one already issued by this
    /// generator. Only raised under [`RollbackPolicy::Reject`].
    ///
    /// [`RollbackPolicy::Reject`]: crate::RollbackPolicy::Reject
    #[error("clock moved backwards: now {now}ms, last issued {last}ms")]
    ClockMovedBackwards { now: u64, last: u64 },

    /// `now - epoch` is negative or does not fit the 41-bit timestamp field.
    #[error("timestamp {now}ms cannot be encoded relative to epoch {epoch}ms")]
    TimestampOverflow { now: u64, epoch: u64 },

    /// A Crockford base32 string could not be decoded.
    #[cfg_attr(docsrs, doc(cfg(feature = "base32")))]
    #[cfg(feature = "base32")]
    #[error(transparent)]
    Base32(#[from] crate::base32::Base32Error),

    /// A decimal string could not be parsed into an id.
    #[error("invalid decimal id: {0}")]
    ParseInt(#[from] core::num::ParseIntError),

    /// The decoded value has the reserved bit set.
    #[error("{raw} has the reserved bit set")]
    ReservedBitSet { raw: u64 },
}

impl Error {
    /// Wraps a backend failure, recording how many attempts were made.
    pub fn coordinator<E>(attempts: u32, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::CoordinatorUnavailable {
            attempts,
            source: source.into(),
        }
    }

    /// Returns true for failures that a later attempt may not hit again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::CoordinatorUnavailable { .. }
                | Self::CoordinatorTimedOut { .. }
                | Self::ClockWaitTimedOut { .. }
                | Self::ClockMovedBackwards { .. }
        )
    }
}
