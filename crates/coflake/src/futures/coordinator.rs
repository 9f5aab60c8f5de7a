use core::{future::Future, time::Duration};
use std::sync::Arc;

use crate::coordinator::{MemoryCoordinator, MemoryCoordinatorError, SequenceCoordinator};

/// The async counterpart of [`SequenceCoordinator`], for backends reached
/// through an async client.
///
/// The contract is identical: `increment` is an atomic, linearizable
/// post-increment that starts fresh keys at 1, and `expire` sets or refreshes
/// a key's time-to-live.
pub trait AsyncSequenceCoordinator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Atomically increments `key` and resolves to the new value.
    fn increment(&self, key: &str) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Sets or refreshes the time-to-live of `key`.
    fn expire(&self, key: &str, ttl: Duration)
    -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<C: AsyncSequenceCoordinator + Sync + ?Sized> AsyncSequenceCoordinator for &C {
    type Error = C::Error;

    fn increment(&self, key: &str) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        (**self).increment(key)
    }

    fn expire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).expire(key, ttl)
    }
}

impl<C: AsyncSequenceCoordinator + Send + Sync + ?Sized> AsyncSequenceCoordinator for Arc<C> {
    type Error = C::Error;

    fn increment(&self, key: &str) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        (**self).increment(key)
    }

    fn expire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).expire(key, ttl)
    }
}

/// The in-memory backend never suspends, so each call resolves immediately.
impl AsyncSequenceCoordinator for MemoryCoordinator {
    type Error = MemoryCoordinatorError;

    fn increment(&self, key: &str) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        core::future::ready(SequenceCoordinator::increment(self, key))
    }

    fn expire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        core::future::ready(SequenceCoordinator::expire(self, key, ttl))
    }
}
