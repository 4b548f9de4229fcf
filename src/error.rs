//! Error types used by the relaykit primitives.
//!
//! This module defines the error enums shared across the crate:
//!
//! - [`ConfigError`]: invalid construction parameters (delay, worker count).
//! - [`FetchError`]: a fetch function failed to produce a value.
//! - [`PoolError`]: lifecycle misuse of a [`WorkerPool`](crate::WorkerPool).
//! - [`StaleValue`]: a failed synchronous refresh, carrying the last good value.
//!
//! The enums provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// # Errors raised when a primitive is constructed with invalid parameters.
///
/// These are surfaced immediately by the constructor; no instance exists afterwards.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Refresh delay is below the supported floor.
    #[error("refresh delay {delay:?} is below the minimum of {min:?}")]
    DelayTooShort {
        /// The requested delay.
        delay: Duration,
        /// The minimum accepted delay.
        min: Duration,
    },

    /// A worker pool needs at least one worker.
    #[error("worker pool requires at least one worker")]
    NoWorkers,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use relaykit::ConfigError;
    ///
    /// assert_eq!(ConfigError::NoWorkers.as_label(), "config_no_workers");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::DelayTooShort { .. } => "config_delay_too_short",
            ConfigError::NoWorkers => "config_no_workers",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigError::DelayTooShort { delay, min } => {
                format!("delay {delay:?} < {min:?}")
            }
            ConfigError::NoWorkers => "workers=0".to_string(),
        }
    }
}

/// # Errors produced by a fetch function.
///
/// Fetch errors are recoverable: caches keep serving the last good value.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The fetch failed; a later attempt may succeed.
    #[error("fetch failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl FetchError {
    /// Builds a [`FetchError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use relaykit::FetchError;
    ///
    /// let err = FetchError::fail("upstream unavailable");
    /// assert_eq!(err.to_string(), "fetch failed: upstream unavailable");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        FetchError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Fail { .. } => "fetch_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FetchError::Fail { error } => format!("error: {error}"),
        }
    }
}

/// # Errors produced by worker pool lifecycle misuse.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Work was posted after [`WorkerPool::close`](crate::WorkerPool::close).
    #[error("worker pool is closed")]
    Closed,

    /// [`WorkerPool::close`](crate::WorkerPool::close) was called twice.
    #[error("worker pool was already closed")]
    AlreadyClosed,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use relaykit::PoolError;
    ///
    /// assert_eq!(PoolError::Closed.as_label(), "pool_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::Closed => "pool_closed",
            PoolError::AlreadyClosed => "pool_already_closed",
        }
    }
}

/// A synchronous refresh failed; the cache still holds `value`.
///
/// Returned by [`LiveValueCache::get_value`](crate::LiveValueCache::get_value) so
/// callers can decide whether a stale value is good enough:
///
/// ```
/// use relaykit::{FetchError, StaleValue};
///
/// let res: Result<u32, StaleValue<u32>> = Err(StaleValue {
///     value: 7,
///     error: FetchError::fail("timeout"),
/// });
/// let v = res.unwrap_or_else(|stale| stale.value);
/// assert_eq!(v, 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StaleValue<T> {
    /// The cached value at the time of the failed refresh.
    pub value: T,
    /// The error returned by the fetch function.
    pub error: FetchError,
}

impl<T> StaleValue<T> {
    /// Discards the error and returns the stale value.
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> fmt::Display for StaleValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serving stale value: {}", self.error)
    }
}

impl<T: fmt::Debug> std::error::Error for StaleValue<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
