use core::time::Duration;
use std::{collections::HashMap, sync::Arc};

use crate::{
    coordinator::SequenceCoordinator,
    mutex::{Mutex, MutexGuard},
    time::Instant,
};

/// Errors raised by [`MemoryCoordinator`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MemoryCoordinatorError {
    /// A thread panicked while holding the counter map. Never produced with
    /// the `parking-lot` feature.
    #[error("counter map lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
struct Counter {
    value: u64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An in-process [`SequenceCoordinator`] with `INCR`/`EXPIRE` semantics.
///
/// Clones share one counter map, so a single `MemoryCoordinator` handed to
/// several generators (or threads) behaves like one backend shared by several
/// processes. It only coordinates callers inside this process; deployments
/// with several processes per machine id need a networked backend.
///
/// Expired keys are treated as absent on access and are dropped by
/// [`Self::purge_expired`] or opportunistically on writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryCoordinator {
    counters: Arc<Mutex<HashMap<String, Counter>>>,
}

/// Writes between opportunistic sweeps of expired keys.
const SWEEP_INTERVAL: u64 = 4096;

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Counter>>, MemoryCoordinatorError> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.counters.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            self.counters
                .lock()
                .map_err(|_| MemoryCoordinatorError::Poisoned)
        }
    }

    /// Returns the live value of `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryCoordinatorError::Poisoned`] if the lock is poisoned.
    pub fn get(&self, key: &str) -> Result<Option<u64>, MemoryCoordinatorError> {
        let now = Instant::now();
        let counters = self.lock()?;
        Ok(counters
            .get(key)
            .filter(|c| !c.is_expired(now))
            .map(|c| c.value))
    }

    /// Returns the remaining time-to-live of `key`. `None` if the key is
    /// absent, expired, or has no expiry.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryCoordinatorError::Poisoned`] if the lock is poisoned.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>, MemoryCoordinatorError> {
        let now = Instant::now();
        let counters = self.lock()?;
        Ok(counters
            .get(key)
            .filter(|c| !c.is_expired(now))
            .and_then(|c| c.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    /// Drops every expired key and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryCoordinatorError::Poisoned`] if the lock is poisoned.
    pub fn purge_expired(&self) -> Result<usize, MemoryCoordinatorError> {
        let now = Instant::now();
        let mut counters = self.lock()?;
        let before = counters.len();
        counters.retain(|_, c| !c.is_expired(now));
        Ok(before - counters.len())
    }

    /// Number of stored keys, including expired ones not yet purged.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryCoordinatorError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, MemoryCoordinatorError> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    ///
    /// Returns [`MemoryCoordinatorError::Poisoned`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, MemoryCoordinatorError> {
        Ok(self.lock()?.is_empty())
    }
}

impl SequenceCoordinator for MemoryCoordinator {
    type Error = MemoryCoordinatorError;

    fn increment(&self, key: &str) -> Result<u64, Self::Error> {
        let now = Instant::now();
        let mut counters = self.lock()?;

        let value = match counters.get_mut(key) {
            Some(counter) if !counter.is_expired(now) => {
                counter.value += 1;
                counter.value
            }
            Some(counter) => {
                *counter = Counter {
                    value: 1,
                    expires_at: None,
                };
                1
            }
            None => {
                counters.insert(
                    key.to_owned(),
                    Counter {
                        value: 1,
                        expires_at: None,
                    },
                );
                1
            }
        };

        if value == 1 && counters.len() as u64 % SWEEP_INTERVAL == 0 {
            counters.retain(|_, c| !c.is_expired(now));
        }

        Ok(value)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<(), Self::Error> {
        let now = Instant::now();
        let mut counters = self.lock()?;
        let expired = match counters.get_mut(key) {
            Some(counter) if !counter.is_expired(now) => {
                counter.expires_at = Some(now + ttl);
                false
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            counters.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, thread::scope};

    use super::*;

    #[test]
    fn first_increment_returns_one() {
        let coordinator = MemoryCoordinator::new();
        assert_eq!(coordinator.increment("k").unwrap(), 1);
        assert_eq!(coordinator.increment("k").unwrap(), 2);
        assert_eq!(coordinator.increment("other").unwrap(), 1);
        assert_eq!(coordinator.get("k").unwrap(), Some(2));
    }

    #[test]
    fn expired_key_restarts_from_one() {
        let coordinator = MemoryCoordinator::new();
        coordinator.increment("k").unwrap();
        coordinator.increment("k").unwrap();
        coordinator.expire("k", Duration::ZERO).unwrap();

        assert_eq!(coordinator.get("k").unwrap(), None);
        assert_eq!(coordinator.increment("k").unwrap(), 1);
    }

    #[test]
    fn expire_on_missing_key_is_a_noop() {
        let coordinator = MemoryCoordinator::new();
        coordinator.expire("missing", Duration::from_secs(1)).unwrap();
        assert!(coordinator.is_empty().unwrap());
    }

    #[test]
    fn expire_refreshes_ttl() {
        let coordinator = MemoryCoordinator::new();
        coordinator.increment("k").unwrap();
        assert_eq!(coordinator.ttl("k").unwrap(), None);

        coordinator.expire("k", Duration::from_secs(60)).unwrap();
        let ttl = coordinator.ttl("k").unwrap().unwrap();
        assert!(ttl > Duration::from_secs(59));
    }

    #[test]
    fn purge_drops_only_expired_keys() {
        let coordinator = MemoryCoordinator::new();
        coordinator.increment("old").unwrap();
        coordinator.increment("live").unwrap();
        coordinator.expire("old", Duration::ZERO).unwrap();
        coordinator.expire("live", Duration::from_secs(60)).unwrap();

        // `expire` with a zero TTL leaves the key in place until the next sweep
        assert_eq!(coordinator.len().unwrap(), 2);
        assert_eq!(coordinator.purge_expired().unwrap(), 1);
        assert_eq!(coordinator.len().unwrap(), 1);
        assert_eq!(coordinator.get("live").unwrap(), Some(1));
    }

    #[test]
    fn clones_share_counters() {
        let a = MemoryCoordinator::new();
        let b = a.clone();
        a.increment("k").unwrap();
        assert_eq!(b.increment("k").unwrap(), 2);
    }

    #[test]
    fn concurrent_increments_are_distinct() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 2_000;

        let coordinator = MemoryCoordinator::new();
        let seen = std::sync::Mutex::new(HashSet::new());

        scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        let value = coordinator.increment("hot").unwrap();
                        assert!(seen.lock().unwrap().insert(value));
                    }
                });
            }
        });

        assert_eq!(
            coordinator.get("hot").unwrap(),
            Some((THREADS * PER_THREAD) as u64)
        );
    }
}
