use core::time::Duration;

use crate::error::{Error, Result};

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH: u64 = 1_735_689_600_000;

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: u64 = 1_288_834_974_657;

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: u64 = 1_420_070_400_000;

/// Instagram epoch: Saturday, January 1, 2011 00:00:00 UTC
pub const INSTAGRAM_EPOCH: u64 = 1_293_840_000_000;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub(crate) use web_time::Instant;

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
pub(crate) use std::time::Instant;

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// The generator subtracts its own custom epoch, so implementations always
/// report absolute Unix milliseconds. This abstraction allows you to plug in
/// the system clock, a monotonic ticker, or a mocked time source in tests.
///
/// # Example
///
/// ```
/// use coflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current Unix time truncated to milliseconds.
    fn current_millis(&self) -> u64;

    /// Spins until the clock strictly exceeds `after` and returns the new
    /// reading.
    ///
    /// The wait polls [`Self::current_millis`] in a tight loop and gives up
    /// once `timeout` has elapsed on the host's monotonic timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockWaitTimedOut`] if the clock does not advance in
    /// time (for instance a frozen or rolled-back clock).
    fn wait_until_after(&self, after: u64, timeout: Duration) -> Result<u64> {
        let start = Instant::now();
        loop {
            let now = self.current_millis();
            if now > after {
                return Ok(now);
            }
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(Error::ClockWaitTimedOut { after, waited });
            }
            core::hint::spin_loop();
        }
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn wait_until_after(&self, after: u64, timeout: Duration) -> Result<u64> {
        (**self).wait_until_after(after, timeout)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn wait_until_after(&self, after: u64, timeout: Duration) -> Result<u64> {
        (**self).wait_until_after(after, timeout)
    }
}
