use core::time::Duration;
use std::{
    sync::{Arc, OnceLock},
    thread::{self, JoinHandle},
};

use portable_atomic::{AtomicU64, Ordering};

use crate::time::{Instant, TimeSource, system::unix_millis};

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A wall-clock-anchored time source that never goes backward.
///
/// The clock reads the system time once at construction and from then on
/// advances with the host's monotonic timer. NTP steps or manual clock changes
/// after construction are not observed, so timestamps are non-decreasing for
/// the lifetime of the clock and all its clones.
///
/// Internally a background thread stores the elapsed milliseconds into a
/// shared atomic once per millisecond, so reads are a single atomic load. The
/// thread exits once the last clone is dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    anchor: u64, // unix milliseconds at construction
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock to the current system time and starts its ticker.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use coflake::{MonotonicClock, TimeSource};
    ///
    /// let clock = MonotonicClock::new();
    /// let before = clock.current_millis();
    /// std::thread::sleep(Duration::from_millis(5));
    ///
    /// // Never behind the first reading, usually 4-6ms ahead of it.
    /// assert!(clock.current_millis() >= before);
    /// ```
    pub fn new() -> Self {
        let start = Instant::now();
        let anchor = unix_millis();

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = start.elapsed().as_millis() as u64;
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                // Align to next tick after the current actual time
                tick = now_ms + 1;
            }
        });

        let _ = inner._handle.set(handle);

        Self { inner, anchor }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.anchor + self.inner.current.load(Ordering::Relaxed)
    }

    fn wait_until_after(&self, after: u64, timeout: Duration) -> crate::Result<u64> {
        let start = Instant::now();
        loop {
            let now = self.current_millis();
            if now > after {
                return Ok(now);
            }
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(crate::Error::ClockWaitTimedOut { after, waited });
            }
            // The ticker thread publishes once per millisecond
            thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backward() {
        let clock = MonotonicClock::new();
        let mut last = clock.current_millis();
        for _ in 0..10_000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn clones_share_one_ticker() {
        let clock = MonotonicClock::new();
        let clone = clock.clone();
        thread::sleep(Duration::from_millis(3));
        let a = clock.current_millis();
        let b = clone.current_millis();
        assert!(a.abs_diff(b) <= 1);
    }

    #[test]
    fn advances_past_a_reading() {
        let clock = MonotonicClock::new();
        let now = clock.current_millis();
        let next = clock.wait_until_after(now, Duration::from_secs(1)).unwrap();
        assert!(next > now);
    }
}
