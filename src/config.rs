//! # Construction settings for the cache and the worker pool.
//!
//! Provides [`CacheConfig`] and [`PoolConfig`], plus the crate-wide tuning constants.
//!
//! Config is used in two ways:
//! 1. **Explicit**: `LiveValueCache::with_config(cfg, fetch)` / `WorkerPool::with_config(f, cfg)`
//! 2. **Shorthand**: `LiveValueCache::new(delay, fetch)` / `WorkerPool::new(f, backlog, workers)`
//!    build the config internally.
//!
//! ## Sentinel values
//! - `backlog = 0` → synchronous handoff (`post()` waits for a worker, a worker
//!   waits for `result()`)
//! - `subscriber_capacity = 0` → synchronous delivery (broadcast waits for the receiver)

use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::ConfigError;

/// Smallest refresh delay accepted by [`LiveValueCache`](crate::LiveValueCache).
pub const MIN_REFRESH_DELAY: Duration = Duration::from_millis(100);

/// Absolute tolerance used when comparing `f64` values for change detection.
pub const F64_EPSILON: f64 = 1e-8;

/// Absolute tolerance used when comparing `f32` values for change detection.
pub const F32_EPSILON: f32 = 1e-5;

/// Settings for a [`LiveValueCache`](crate::LiveValueCache).
///
/// ## Field semantics
/// - `delay`: minimum time between two refreshes (must be `>= 100ms`)
/// - `subscriber_capacity`: buffer size of channels handed out by `register()`
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Minimum delay between fetches; also the background refresh period.
    pub delay: Duration,

    /// Buffer capacity of every subscriber channel.
    ///
    /// A subscriber that does not drain its channel stalls the refresh task once
    /// the buffer is full.
    pub subscriber_capacity: usize,
}

impl CacheConfig {
    /// Creates a config with the given delay and the default subscriber capacity.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Checks the delay against [`MIN_REFRESH_DELAY`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay < MIN_REFRESH_DELAY {
            return Err(ConfigError::DelayTooShort {
                delay: self.delay,
                min: MIN_REFRESH_DELAY,
            });
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    /// Default configuration:
    ///
    /// - `delay = 1s`
    /// - `subscriber_capacity = 1`
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            subscriber_capacity: 1,
        }
    }
}

/// Settings for a [`WorkerPool`](crate::WorkerPool).
///
/// ## Field semantics
/// - `backlog`: capacity of both the work queue and the result queue
/// - `workers`: number of worker tasks spawned up front (`>= 1`)
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Capacity of the work and result queues.
    pub backlog: usize,

    /// Number of concurrent workers.
    pub workers: usize,
}

impl PoolConfig {
    /// Returns the channel capacity backing `backlog`.
    ///
    /// tokio channels need `1..=Semaphore::MAX_PERMITS` slots; `backlog = 0`
    /// maps to one slot plus a handoff wait (see [`is_synchronous`](Self::is_synchronous)).
    #[inline]
    pub fn backlog_clamped(&self) -> usize {
        self.backlog.clamp(1, Semaphore::MAX_PERMITS)
    }

    /// Returns true if `backlog = 0` (no buffering between stages).
    #[inline]
    pub fn is_synchronous(&self) -> bool {
        self.backlog == 0
    }

    /// Checks the worker count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers < 1 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// Default configuration:
    ///
    /// - `backlog = 0` (synchronous handoff)
    /// - `workers = available parallelism` (falls back to 1)
    fn default() -> Self {
        Self {
            backlog: 0,
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_delay_floor() {
        assert!(CacheConfig::with_delay(Duration::from_millis(100)).validate().is_ok());
        assert_eq!(
            CacheConfig::with_delay(Duration::from_millis(99)).validate(),
            Err(ConfigError::DelayTooShort {
                delay: Duration::from_millis(99),
                min: MIN_REFRESH_DELAY,
            })
        );
    }

    #[test]
    fn test_pool_defaults_are_valid() {
        let cfg = PoolConfig::default();
        assert!(cfg.workers >= 1);
        assert_eq!(cfg.backlog_clamped(), 1);
        assert!(cfg.is_synchronous());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_pool_rejects_zero_workers() {
        let cfg = PoolConfig {
            backlog: 4,
            workers: 0,
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoWorkers));
    }

    #[test]
    fn test_pool_backlog_clamped_to_channel_limits() {
        let huge = PoolConfig {
            backlog: usize::MAX,
            workers: 1,
        };
        assert_eq!(huge.backlog_clamped(), Semaphore::MAX_PERMITS);
        assert!(!huge.is_synchronous());
    }
}
