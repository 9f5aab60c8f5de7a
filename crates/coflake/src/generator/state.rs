use portable_atomic::{AtomicU64, Ordering};

use crate::{
    error::{Error, Result},
    generator::RollbackPolicy,
    id::SnowflakeId,
};

/// Outcome of a single non-blocking generation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was minted.
    Ready { id: SnowflakeId },
    /// The sequence space of millisecond `timestamp` (Unix ms) is used up.
    /// Try again once the clock is past it.
    Exhausted { timestamp: u64 },
}

/// The generation state machine.
///
/// ```text
/// Compute --(counter in range)--> Emit
///    |                             ^
///    +--(counter exhausted)--> Exhausted --wait next ms--+
///                                  |                     |
///                                  +-- Reacquire --> Compute
/// ```
///
/// Sync and async generators drive the same transitions; only the way they
/// wait differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Compute,
    Exhausted { timestamp: u64 },
    Emit { timestamp: u64, sequence: u64 },
}

impl Step {
    /// Classifies a raw coordinator counter taken at `timestamp`.
    ///
    /// Counters are unbounded, so anything outside 1..=4095 means this
    /// millisecond has already handed out its whole sequence space. Masking
    /// alone would let the 4097th caller reuse sequence 1.
    pub(crate) const fn from_counter(timestamp: u64, raw: u64) -> Self {
        let sequence = raw & SnowflakeId::SEQUENCE_MASK;
        if sequence == 0 || raw > SnowflakeId::SEQUENCE_MASK {
            Self::Exhausted { timestamp }
        } else {
            Self::Emit {
                timestamp,
                sequence,
            }
        }
    }
}

/// Packs an absolute `timestamp` (Unix ms) against `epoch`.
pub(crate) fn pack(epoch: u64, machine_id: u64, timestamp: u64, sequence: u64) -> Result<SnowflakeId> {
    let delta = timestamp
        .checked_sub(epoch)
        .filter(|delta| *delta <= SnowflakeId::TIMESTAMP_MASK)
        .ok_or(Error::TimestampOverflow {
            now: timestamp,
            epoch,
        })?;
    Ok(SnowflakeId::from_components(delta, machine_id, sequence))
}

/// What the rollback guard thinks of a clock reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClockCheck {
    Ok,
    /// The reading is behind `last`, the highest timestamp already issued.
    Behind { last: u64 },
}

/// Process-local high-water mark of issued timestamps.
#[derive(Debug)]
pub(crate) struct RollbackGuard {
    policy: RollbackPolicy,
    #[cfg(feature = "cache-padded")]
    last: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    last: AtomicU64,
}

impl RollbackGuard {
    pub(crate) fn new(policy: RollbackPolicy) -> Self {
        Self {
            policy,
            last: AtomicU64::new(0).into(),
        }
    }

    pub(crate) const fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    pub(crate) fn check(&self, now: u64) -> ClockCheck {
        if self.policy == RollbackPolicy::Ignore {
            return ClockCheck::Ok;
        }
        let last = self.last.load(Ordering::Acquire);
        if now < last {
            ClockCheck::Behind { last }
        } else {
            ClockCheck::Ok
        }
    }

    pub(crate) fn record(&self, timestamp: u64) {
        if self.policy != RollbackPolicy::Ignore {
            self.last.fetch_max(timestamp, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_classification() {
        assert_eq!(
            Step::from_counter(7, 1),
            Step::Emit {
                timestamp: 7,
                sequence: 1
            }
        );
        assert_eq!(
            Step::from_counter(7, 4095),
            Step::Emit {
                timestamp: 7,
                sequence: 4095
            }
        );
        for raw in [0, 4096, 4097, 8192, 8193, u64::MAX] {
            assert_eq!(
                Step::from_counter(7, raw),
                Step::Exhausted { timestamp: 7 },
                "raw {raw}"
            );
        }
    }

    #[test]
    fn pack_rejects_deltas_outside_the_field() {
        assert!(matches!(
            pack(10, 0, 9, 1),
            Err(Error::TimestampOverflow { now: 9, epoch: 10 })
        ));
        assert!(pack(0, 0, SnowflakeId::TIMESTAMP_MASK, 1).is_ok());
        assert!(matches!(
            pack(0, 0, SnowflakeId::TIMESTAMP_MASK + 1, 1),
            Err(Error::TimestampOverflow { .. })
        ));
    }

    #[test]
    fn ignore_never_reports_behind() {
        let guard = RollbackGuard::new(RollbackPolicy::Ignore);
        guard.record(100);
        assert_eq!(guard.check(1), ClockCheck::Ok);
    }

    #[test]
    fn guard_tracks_the_highest_timestamp() {
        let guard = RollbackGuard::new(RollbackPolicy::Reject);
        guard.record(100);
        guard.record(50);
        assert_eq!(guard.check(99), ClockCheck::Behind { last: 100 });
        assert_eq!(guard.check(100), ClockCheck::Ok);
    }
}
