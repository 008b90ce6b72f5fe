//! Keyed LRU workload driver
//!
//! Exercises the keyed locks and the memoizing store under contention and
//! reports the results through tracing.

use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keyed_lru::{
    cached_with, AsyncKeyLock, CacheConfig, CacheError, CacheStats, KeyLock, Kwargs, LruStore,
};

/// Main entry point for the workload driver.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Run per-key counter increments on OS threads under `KeyLock`
/// 4. Run the same workload on tokio tasks under `AsyncKeyLock`
/// 5. Run a memoized function over a store sized from configuration
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyed_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::try_from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: maxsize={}, workers={}, keys={}, rounds={}",
        config.maxsize, config.workers, config.keys, config.rounds
    );
    let sizes = WorkloadSizes::from_config(&config)?;

    let threaded_config = config.clone();
    let threaded = tokio::task::spawn_blocking(move || run_threaded(&threaded_config))
        .await
        .context("threaded workload panicked")?;
    verify_counts("threaded", &config, sizes.expected_per_key, &threaded)?;

    let tasked = run_async(&config).await?;
    verify_counts("async", &config, sizes.expected_per_key, &tasked)?;

    let stats = run_memoized(&config, sizes.memo_span);
    info!("Memoized store stats: {}", serde_json::to_string(&stats)?);

    Ok(())
}

/// Totals derived from configuration, checked for overflow up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WorkloadSizes {
    /// Increments every key must reach
    expected_per_key: u64,
    /// Inputs fed through the memoized function per pass
    memo_span: u64,
}

impl WorkloadSizes {
    fn from_config(config: &CacheConfig) -> Result<Self> {
        let expected_per_key = config
            .workers
            .checked_mul(config.rounds)
            .and_then(|total| u64::try_from(total).ok());
        let Some(expected_per_key) = expected_per_key else {
            bail!(CacheError::Configuration(format!(
                "workers ({}) * rounds ({}) overflows",
                config.workers, config.rounds
            )));
        };

        let memo_span = config
            .keys
            .max(1)
            .checked_mul(4)
            .and_then(|span| u64::try_from(span).ok());
        let Some(memo_span) = memo_span else {
            bail!(CacheError::Configuration(format!(
                "keys ({}) is too large for the memoized pass",
                config.keys
            )));
        };

        Ok(Self {
            expected_per_key,
            memo_span,
        })
    }
}

/// Increments one counter per key from every worker thread.
///
/// The store never overwrites on `put`, so each increment is a
/// remove-then-put pair that only the key lock makes atomic.
fn run_threaded(config: &CacheConfig) -> LruStore<usize, u64> {
    let locks = KeyLock::new();
    let counters = LruStore::unbounded();

    thread::scope(|scope| {
        for worker in 0..config.workers {
            let locks = &locks;
            let counters = &counters;
            scope.spawn(move || {
                for _ in 0..config.rounds {
                    for key in 0..config.keys {
                        let _guard = locks.acquire(key);
                        let current = counters.remove(&key).unwrap_or(0);
                        thread::yield_now();
                        counters.put(key, current + 1);
                    }
                }
                debug!(worker, "thread worker finished");
            });
        }
    });

    counters
}

/// Same workload as [`run_threaded`], on tokio tasks.
async fn run_async(config: &CacheConfig) -> Result<LruStore<usize, u64>> {
    let locks = Arc::new(AsyncKeyLock::new());
    let counters = Arc::new(LruStore::unbounded());

    let mut handles = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let locks = Arc::clone(&locks);
        let counters = Arc::clone(&counters);
        let (rounds, keys) = (config.rounds, config.keys);
        handles.push(tokio::spawn(async move {
            for _ in 0..rounds {
                for key in 0..keys {
                    let _guard = locks.acquire(key).await;
                    let current = counters.remove(&key).unwrap_or(0);
                    tokio::task::yield_now().await;
                    counters.put(key, current + 1);
                }
            }
            debug!(worker, "task worker finished");
        }));
    }

    for handle in handles {
        handle.await.context("async worker panicked")?;
    }

    match Arc::try_unwrap(counters) {
        Ok(counters) => Ok(counters),
        Err(_) => bail!("async counters still shared after workers finished"),
    }
}

fn verify_counts(
    label: &str,
    config: &CacheConfig,
    expected: u64,
    counters: &LruStore<usize, u64>,
) -> Result<()> {
    for key in 0..config.keys {
        let actual = counters.peek(&key).unwrap_or(0);
        if actual != expected {
            bail!(
                "{} workload lost updates on key {}: expected {}, got {}",
                label,
                key,
                expected,
                actual
            );
        }
    }
    info!(
        "{} workload: {} keys each reached {} increments",
        label, config.keys, expected
    );
    Ok(())
}

/// Memoizes Collatz sequence lengths over a store sized from configuration.
fn run_memoized(config: &CacheConfig, span: u64) -> CacheStats {
    let memo = cached_with(LruStore::from_config(config))
        .wrap(|n: &u64, _: &Kwargs<()>| collatz_len(*n));

    for pass in 0..2 {
        let longest = (1..=span).map(|n| memo.call(n)).max().unwrap_or(0);
        debug!(pass, longest, "memoized pass finished");
    }

    memo.store().stats()
}

fn collatz_len(mut n: u64) -> u32 {
    let mut steps = 0;
    while n > 1 {
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
        steps += 1;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_sizes_from_default_config() {
        let sizes = WorkloadSizes::from_config(&CacheConfig::default()).unwrap();
        assert_eq!(sizes.expected_per_key, 800);
        assert_eq!(sizes.memo_span, 64);
    }

    #[test]
    fn test_workload_sizes_reject_overflowing_totals() {
        let config = CacheConfig {
            workers: usize::MAX,
            rounds: 2,
            ..CacheConfig::default()
        };
        let err = WorkloadSizes::from_config(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CacheError>(),
            Some(CacheError::Configuration(_))
        ));

        let config = CacheConfig {
            keys: usize::MAX,
            ..CacheConfig::default()
        };
        let err = WorkloadSizes::from_config(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CacheError>(),
            Some(CacheError::Configuration(_))
        ));
    }

    #[test]
    fn test_collatz_len() {
        assert_eq!(collatz_len(1), 0);
        assert_eq!(collatz_len(6), 8);
    }
}
