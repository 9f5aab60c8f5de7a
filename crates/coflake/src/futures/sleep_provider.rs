use core::{future::Future, time::Duration};

/// A trait that abstracts over how to wait in async contexts.
///
/// This allows the async generator to be generic over runtimes like `Tokio`
/// or `Smol`.
pub trait SleepProvider {
    /// Waits before the generator re-checks the clock during a rollover.
    ///
    /// Implementations may return early (e.g. by yielding to the scheduler);
    /// the generator loops until the clock has actually advanced.
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;

    /// A timer that completes no sooner than `dur`. Used for coordinator call
    /// timeouts and retry backoff, where returning early would be wrong.
    fn timer(dur: Duration) -> impl Future<Output = ()> + Send {
        Self::sleep_for(dur)
    }
}
