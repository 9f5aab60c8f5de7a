use crate::time::TimeSource;

/// Reads the operating system's wall clock on every call.
///
/// This clock follows the host time exactly, including NTP corrections, so it
/// can move backward. Pair it with a [`RollbackPolicy`] other than `Ignore`
/// if that matters, or use [`MonotonicClock`].
///
/// [`RollbackPolicy`]: crate::RollbackPolicy
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub const fn new() -> Self {
        Self
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        unix_millis()
    }
}

/// Milliseconds since the Unix epoch, or zero if the host clock reports a time
/// before 1970.
pub(crate) fn unix_millis() -> u64 {
    #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
    let elapsed = web_time::SystemTime::now().duration_since(web_time::UNIX_EPOCH);
    #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
    let elapsed = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH);

    elapsed.map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::CUSTOM_EPOCH;

    #[test]
    fn reports_time_after_custom_epoch() {
        assert!(SystemClock.current_millis() > CUSTOM_EPOCH);
    }

    #[test]
    fn wait_until_after_returns_a_later_millisecond() {
        let clock = SystemClock::new();
        let now = clock.current_millis();
        let next = clock
            .wait_until_after(now, core::time::Duration::from_secs(1))
            .unwrap();
        assert!(next > now);
    }
}
