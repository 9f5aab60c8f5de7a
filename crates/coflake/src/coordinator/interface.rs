use core::time::Duration;
use std::sync::Arc;

/// The shared atomic counter store that makes cross-process uniqueness
/// possible.
///
/// Every process minting IDs for the same machine id must talk to the same
/// backend. The generator keys one counter per (prefix, machine id,
/// millisecond), increments it once per ID, and sets a short expiry so stale
/// counters disappear on their own. A Redis-style `INCR`/`EXPIRE` pair is the
/// canonical backend.
///
/// # Contract
///
/// - [`increment`] atomically increments the counter named `key`, treating an
///   absent key as zero, and returns the post-increment value. The first call
///   for a fresh key returns 1. Increments on one key must be linearizable
///   across every caller system-wide.
/// - [`expire`] sets or refreshes a time-to-live on `key`. Refreshing a key
///   that no longer exists is not an error.
/// - The two calls need not be atomic with each other. A crash between them
///   leaves one key without a TTL, which is a bounded leak.
///
/// [`increment`]: SequenceCoordinator::increment
/// [`expire`]: SequenceCoordinator::expire
///
/// # Example
///
/// ```
/// use coflake::{MemoryCoordinator, SequenceCoordinator};
/// use std::time::Duration;
///
/// let coordinator = MemoryCoordinator::new();
/// assert_eq!(coordinator.increment("ids-1-1700000000000").unwrap(), 1);
/// assert_eq!(coordinator.increment("ids-1-1700000000000").unwrap(), 2);
/// coordinator.expire("ids-1-1700000000000", Duration::from_secs(1)).unwrap();
/// ```
pub trait SequenceCoordinator {
    /// The backend's failure type, surfaced as
    /// [`Error::CoordinatorUnavailable`].
    ///
    /// [`Error::CoordinatorUnavailable`]: crate::Error::CoordinatorUnavailable
    type Error: std::error::Error + Send + Sync + 'static;

    /// Atomically increments `key` and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the call cannot complete.
    fn increment(&self, key: &str) -> Result<u64, Self::Error>;

    /// Sets or refreshes the time-to-live of `key`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the call cannot complete.
    fn expire(&self, key: &str, ttl: Duration) -> Result<(), Self::Error>;
}

impl<C: SequenceCoordinator + ?Sized> SequenceCoordinator for &C {
    type Error = C::Error;

    fn increment(&self, key: &str) -> Result<u64, Self::Error> {
        (**self).increment(key)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<(), Self::Error> {
        (**self).expire(key, ttl)
    }
}

impl<C: SequenceCoordinator + ?Sized> SequenceCoordinator for Arc<C> {
    type Error = C::Error;

    fn increment(&self, key: &str) -> Result<u64, Self::Error> {
        (**self).increment(key)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<(), Self::Error> {
        (**self).expire(key, ttl)
    }
}
