use core::{future::Future, time::Duration};

use smol::Timer;

use crate::futures::SleepProvider;

/// An implementation of [`SleepProvider`] using Smol's timer.
///
/// This is the default provider for use in async applications built on Smol.
pub struct SmolSleep;
impl SleepProvider for SmolSleep {
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send {
        async move {
            Timer::after(dur).await;
        }
    }
}

/// An implementation of [`SleepProvider`] using Smol's yield.
///
/// A rollover wait yields to the executor instead of arming a timer. Timeouts
/// and backoff still use Smol's timer.
pub struct SmolYield;
impl SleepProvider for SmolYield {
    fn sleep_for(_dur: Duration) -> impl Future<Output = ()> + Send {
        smol::future::yield_now()
    }

    fn timer(dur: Duration) -> impl Future<Output = ()> + Send {
        SmolSleep::sleep_for(dur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsyncCoordinatedGenerator, GeneratorConfig, MemoryCoordinator, MonotonicClock};

    #[test]
    fn generates_on_smol() {
        smol::block_on(async {
            let generator = AsyncCoordinatedGenerator::new(
                MemoryCoordinator::new(),
                MonotonicClock::new(),
                GeneratorConfig::new(9, 0, "ids"),
            )
            .unwrap();

            let first = generator.generate::<SmolSleep>().await.unwrap();
            let second = generator.generate::<SmolYield>().await.unwrap();
            assert_eq!(first.machine_id(), 9);
            assert!(second > first);
        });
    }
}
