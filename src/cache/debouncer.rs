//! # Single-owner debounced value.
//!
//! [`Debouncer`] refreshes a value on demand, at most once per delay window.
//! Unlike [`LiveValueCache`](crate::LiveValueCache) it has no subscribers, no
//! background task and no lock: it is owned by one caller (`&mut self`).
//!
//! ## Rules
//! - First call always fetches
//! - Calls inside the window return the cached value without fetching
//! - Fetch errors are logged and swallowed; the last good value is returned
//!   and the next call retries

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use super::fetch::{FetchFn, FetchRef};
use crate::error::FetchError;

/// Caches a fetched value for `delay` between refreshes.
pub struct Debouncer<T> {
    fetcher: FetchRef<T>,
    last: T,
    deadline: Instant,
    delay: Duration,
}

impl<T: Clone + Default + Send + 'static> Debouncer<T> {
    /// Creates a debouncer around a fetch closure.
    pub fn new<F, Fut>(delay: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        Self::with_fetcher(delay, FetchFn::arc(fetch))
    }

    /// Creates a debouncer around an existing fetcher.
    pub fn with_fetcher(delay: Duration, fetcher: FetchRef<T>) -> Self {
        Self {
            fetcher,
            last: T::default(),
            deadline: Instant::now(),
            delay,
        }
    }

    /// Returns the cached value, refreshing it first if the window elapsed.
    pub async fn get_value(&mut self) -> T {
        if Instant::now() >= self.deadline {
            match self.fetcher.fetch().await {
                Ok(value) => {
                    self.last = value;
                    self.deadline = Instant::now() + self.delay;
                }
                Err(e) => warn!(error = %e, label = e.as_label(), "debounced fetch failed"),
            }
        }
        self.last.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn test_caches_within_delay_and_refetches_after() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let mut d = Debouncer::new(Duration::from_millis(50), move || {
            let c = Arc::clone(&c);
            async move { Ok::<_, FetchError>(c.fetch_add(1, Ordering::SeqCst) + 1) }
        });

        assert_eq!(d.get_value().await, 1);
        assert_eq!(d.get_value().await, 1);

        time::sleep(Duration::from_millis(20)).await;
        assert_eq!(d.get_value().await, 1);

        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(d.get_value().await, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_keep_last_value() {
        let fail = Arc::new(AtomicBool::new(false));
        let current = Arc::new(AtomicU32::new(0));
        let (f, c) = (Arc::clone(&fail), Arc::clone(&current));
        let mut d = Debouncer::new(Duration::from_millis(30), move || {
            let (f, c) = (Arc::clone(&f), Arc::clone(&c));
            async move {
                if f.load(Ordering::SeqCst) {
                    return Err(FetchError::fail("boom"));
                }
                Ok(c.fetch_add(1, Ordering::SeqCst) + 1)
            }
        });

        assert_eq!(d.get_value().await, 1);

        time::sleep(Duration::from_millis(35)).await;
        fail.store(true, Ordering::SeqCst);
        assert_eq!(d.get_value().await, 1);

        fail.store(false, Ordering::SeqCst);
        assert_eq!(d.get_value().await, 2);
    }
}
