use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use coflake::{
    CoordinatedGenerator, GeneratorConfig, MemoryCoordinator, MonotonicClock, RolloverPolicy,
    SnowflakeId, TimeSource,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Fits in one millisecond of a fixed clock, so the mock benches never roll
// over.
const TOTAL_IDS: usize = 4095;

fn config() -> GeneratorConfig {
    GeneratorConfig::new(1, 0, "bench").with_rollover(RolloverPolicy::Reacquire)
}

fn mock_generator() -> CoordinatedGenerator<MemoryCoordinator, FixedMockTime> {
    CoordinatedGenerator::new(
        MemoryCoordinator::new(),
        FixedMockTime { millis: 1 },
        config(),
    )
    .unwrap()
}

fn mono_generator() -> CoordinatedGenerator<MemoryCoordinator, MonotonicClock> {
    CoordinatedGenerator::new(MemoryCoordinator::new(), MonotonicClock::new(), config()).unwrap()
}

/// Benchmarks one caller minting from a fresh generator per iteration.
fn bench_sequential<T: TimeSource>(
    c: &mut Criterion,
    group_name: &str,
    generator_factory: impl Fn() -> CoordinatedGenerator<MemoryCoordinator, T>,
) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.generate().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks one generator shared across threads. Every call still goes
/// through the coordinator, so this measures contention on its counter map.
fn bench_contended<T: TimeSource + Send + Sync>(
    c: &mut Criterion,
    group_name: &str,
    generator_factory: impl Fn() -> CoordinatedGenerator<MemoryCoordinator, T>,
) {
    let mut group = c.benchmark_group(group_name);

    for thread_count in [1, 2, 4, 8] {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements((ids_per_thread * thread_count) as u64));
        group.bench_function(
            format!("elems/{}/threads/{}", TOTAL_IDS, thread_count),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let generator = Arc::new(generator_factory());
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for _ in 0..thread_count {
                                let generator = Arc::clone(&generator);
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for _ in 0..ids_per_thread {
                                        black_box(generator.generate().unwrap());
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

fn benchmark_mock_sequential(c: &mut Criterion) {
    bench_sequential(c, "mock/sequential", mock_generator);
}

fn benchmark_mock_contended(c: &mut Criterion) {
    bench_contended(c, "mock/contended", mock_generator);
}

fn benchmark_mono_sequential(c: &mut Criterion) {
    bench_sequential(c, "mono/sequential", mono_generator);
}

fn benchmark_mono_contended(c: &mut Criterion) {
    bench_contended(c, "mono/contended", mono_generator);
}

fn benchmark_decimal_parse(c: &mut Criterion) {
    let text = SnowflakeId::from_components(100_000_000_000, 5, 1).to_string();
    c.bench_function("text/decimal_parse", |b| {
        b.iter(|| black_box(text.parse::<SnowflakeId>().unwrap()));
    });
}

#[cfg(feature = "base32")]
fn benchmark_base32(c: &mut Criterion) {
    let id = SnowflakeId::from_components(100_000_000_000, 5, 1);
    let encoded = id.encode();
    c.bench_function("text/base32_encode", |b| {
        b.iter(|| black_box(black_box(id).encode()));
    });
    c.bench_function("text/base32_decode", |b| {
        b.iter(|| black_box(SnowflakeId::decode(black_box(encoded)).unwrap()));
    });
}

#[cfg(feature = "async-tokio")]
fn benchmark_mono_tokio(c: &mut Criterion) {
    use coflake::{AsyncCoordinatedGenerator, TokioSleep};
    use tokio::runtime::Builder;

    let runtime = Builder::new_multi_thread().enable_all().build().unwrap();
    let mut group = c.benchmark_group("mono/tokio");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{}", TOTAL_IDS), |b| {
        b.to_async(&runtime).iter_custom(|iters| async move {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = AsyncCoordinatedGenerator::new(
                    MemoryCoordinator::new(),
                    MonotonicClock::new(),
                    config(),
                )
                .unwrap();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.generate::<TokioSleep>().await.unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_mock_sequential,
    benchmark_mock_contended,
    benchmark_mono_sequential,
    benchmark_mono_contended,
    benchmark_decimal_parse,
);

#[cfg(feature = "base32")]
criterion_group!(base32_benches, benchmark_base32);

#[cfg(feature = "async-tokio")]
criterion_group!(async_benches, benchmark_mono_tokio);

#[cfg(all(feature = "base32", feature = "async-tokio"))]
criterion_main!(benches, base32_benches, async_benches);
#[cfg(all(feature = "base32", not(feature = "async-tokio")))]
criterion_main!(benches, base32_benches);
#[cfg(all(not(feature = "base32"), feature = "async-tokio"))]
criterion_main!(benches, async_benches);
#[cfg(not(any(feature = "base32", feature = "async-tokio")))]
criterion_main!(benches);
