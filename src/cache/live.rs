//! # LiveValueCache: debounced value with change broadcasting.
//!
//! Holds the last fetched value and refreshes it:
//! - **on demand** through [`LiveValueCache::get_value`], at most once per delay window,
//! - **in the background** while at least one subscriber is registered.
//!
//! ## Architecture
//! ```text
//! get_value() ──► deadline passed? ──► fetch() ──► store value, deadline = now + delay
//!
//! register() ──► Broadcaster::register(1)
//!          └──► no refresh task? ──► spawn refresh_loop()
//!
//! refresh_loop:
//! loop {
//!   ├─► fetch()
//!   │     ├─ Ok(v)  ──► set_value(v) ──► changed? ──► Broadcaster::broadcast(v)
//!   │     └─ Err(e) ──► warn!, keep old value
//!   ├─► select { cancelled ─► exit, sleep(delay) }
//!   └─► no subscribers? ──► exit
//! }
//! ```
//!
//! ## Rules
//! - Delay below [`MIN_REFRESH_DELAY`](crate::MIN_REFRESH_DELAY) is rejected at construction
//! - One synchronous fetch per delay window (callers racing past the deadline wait for it)
//! - Cancellation is observed between cycles only; a running fetch is never aborted
//! - The subscriber check happens after the sleep, so one more fetch (and possibly a
//!   broadcast) can happen after the last `unregister()`
//! - Cancelling is permanent: later `register()` calls do not restart the task

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::select;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::fetch::{FetchFn, FetchRef};
use super::nearly_equal::NearlyEqual;
use crate::broadcast::{Broadcaster, Subscription};
use crate::config::CacheConfig;
use crate::error::{ConfigError, FetchError, StaleValue};

/// Cached value and the earliest time it may be refreshed.
struct State<T> {
    value: T,
    deadline: Instant,
}

struct Inner<T> {
    state: RwLock<State<T>>,
    delay: Duration,
    subscriber_capacity: usize,
    fetcher: FetchRef<T>,
    listeners: Broadcaster<T>,
    token: CancellationToken,
    /// Handle of the running refresh task; `None` when idle.
    refresher: Mutex<Option<JoinHandle<()>>>,
}

/// Self-refreshing cached value that notifies subscribers on change.
///
/// Cheap to clone: clones share the same value, subscribers and refresh task.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use relaykit::{FetchError, LiveValueCache};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (cache, cancel) = LiveValueCache::new(Duration::from_millis(200), || async {
///         Ok::<_, FetchError>(21.5f64)
///     })?;
///
///     assert_eq!(cache.get_value().await?, 21.5);
///
///     let mut updates = cache.register().await;
///     cache.set_value(22.0).await;
///     assert_eq!(updates.recv().await, Some(22.0));
///
///     cache.unregister(&updates).await;
///     cancel.cancel();
///     Ok(())
/// }
/// ```
pub struct LiveValueCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for LiveValueCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> LiveValueCache<T>
where
    T: NearlyEqual + Clone + Default + Send + Sync + 'static,
{
    /// Creates a cache refreshed by `fetch` at most once per `delay`.
    ///
    /// Returns the cache and the token that stops its background refresh.
    /// Fails with [`ConfigError::DelayTooShort`] if `delay < 100ms`.
    pub fn new<F, Fut>(
        delay: Duration,
        fetch: F,
    ) -> Result<(Self, CancellationToken), ConfigError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        Self::with_config(CacheConfig::with_delay(delay), FetchFn::arc(fetch))
    }

    /// Creates a cache from an explicit config and fetcher.
    pub fn with_config(
        cfg: CacheConfig,
        fetcher: FetchRef<T>,
    ) -> Result<(Self, CancellationToken), ConfigError> {
        cfg.validate()?;

        let token = CancellationToken::new();
        let inner = Arc::new(Inner {
            state: RwLock::new(State {
                value: T::default(),
                deadline: Instant::now(),
            }),
            delay: cfg.delay,
            subscriber_capacity: cfg.subscriber_capacity,
            fetcher,
            listeners: Broadcaster::new(),
            token: token.clone(),
            refresher: Mutex::new(None),
        });
        Ok((Self { inner }, token))
    }

    /// Returns the cached value, refreshing it first if the deadline passed.
    ///
    /// ### Errors
    /// If the refresh fails the cached value is kept and returned inside
    /// [`StaleValue`] together with the error. The deadline is not moved, so the
    /// next call tries again.
    pub async fn get_value(&self) -> Result<T, StaleValue<T>> {
        {
            let state = self.inner.state.read().await;
            if Instant::now() < state.deadline {
                return Ok(state.value.clone());
            }
        }

        let mut state = self.inner.state.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if Instant::now() < state.deadline {
            return Ok(state.value.clone());
        }

        match self.inner.fetcher.fetch().await {
            Ok(value) => {
                state.value = value;
                state.deadline = Instant::now() + self.inner.delay;
                Ok(state.value.clone())
            }
            Err(error) => Err(StaleValue {
                value: state.value.clone(),
                error,
            }),
        }
    }

    /// Like [`get_value`](Self::get_value), but serves the cached value when the
    /// refresh fails. The error is logged.
    pub async fn get_value_or_stale(&self) -> T {
        match self.get_value().await {
            Ok(value) => value,
            Err(stale) => {
                warn!(
                    error = %stale.error,
                    label = stale.error.as_label(),
                    "refresh failed, serving stale value"
                );
                stale.into_value()
            }
        }
    }

    /// Stores `value` and broadcasts it if it differs from the cached value.
    ///
    /// The deadline is pushed back by one delay either way. Returns `true` if
    /// the value changed.
    pub async fn set_value(&self, value: T) -> bool {
        self.inner.set_value(value).await
    }

    /// Registers a subscriber and starts the refresh task if none is running.
    pub async fn register(&self) -> Subscription<T> {
        let sub = self
            .inner
            .listeners
            .register(self.inner.subscriber_capacity)
            .await;

        let mut refresher = self.inner.refresher.lock().await;
        let idle = refresher.as_ref().is_none_or(JoinHandle::is_finished);
        if idle && !self.inner.token.is_cancelled() {
            let inner = Arc::clone(&self.inner);
            *refresher = Some(tokio::spawn(inner.refresh_loop()));
        }
        sub
    }

    /// Removes a subscriber.
    ///
    /// The refresh task notices an empty subscriber set at the end of its
    /// current cycle and exits by itself.
    pub async fn unregister(&self, sub: &Subscription<T>) -> bool {
        self.inner.listeners.unregister(sub).await
    }

    /// Number of registered subscribers.
    pub async fn subscribers(&self) -> usize {
        self.inner.listeners.size().await
    }

    /// Returns true while the background refresh task is running.
    pub async fn is_refreshing(&self) -> bool {
        self.inner
            .refresher
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Returns true once the cancellation token fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// The configured refresh delay.
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }
}

impl<T> Inner<T>
where
    T: NearlyEqual + Clone + Send + Sync + 'static,
{
    async fn set_value(&self, value: T) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            let changed = !state.value.nearly_equal(&value);
            if changed {
                state.value = value.clone();
            }
            state.deadline = Instant::now() + self.delay;
            changed
        };

        if changed {
            self.listeners.broadcast(value).await;
        }
        changed
    }

    async fn refresh_loop(self: Arc<Self>) {
        debug!(delay = ?self.delay, "refresh task started");

        loop {
            match self.fetcher.fetch().await {
                Ok(value) => {
                    self.set_value(value).await;
                }
                Err(e) => warn!(error = %e, label = e.as_label(), "background fetch failed"),
            }

            select! {
                _ = self.token.cancelled() => {
                    self.refresher.lock().await.take();
                    debug!("refresh task cancelled");
                    return;
                }
                _ = time::sleep(self.delay) => {}
            }

            // Decided under the refresher lock so a concurrent register() either
            // sees this task still running or sees it gone and spawns a new one.
            let mut refresher = self.refresher.lock().await;
            if !self.listeners.is_active().await {
                refresher.take();
                debug!("no subscribers left, refresh task exiting");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn counting_fetch(calls: &Arc<AtomicU32>) -> FetchRef<u32> {
        let calls = Arc::clone(calls);
        FetchFn::arc(move || {
            let calls = Arc::clone(&calls);
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }
        })
    }

    fn counting_cache(
        delay_ms: u64,
        calls: &Arc<AtomicU32>,
    ) -> (LiveValueCache<u32>, CancellationToken) {
        LiveValueCache::with_config(
            CacheConfig::with_delay(Duration::from_millis(delay_ms)),
            counting_fetch(calls),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_short_delay() {
        let res = LiveValueCache::new(Duration::from_millis(50), || async {
            Ok::<_, FetchError>(0u32)
        });
        assert!(matches!(res, Err(ConfigError::DelayTooShort { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_value_respects_delay_and_errors() {
        let fail = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicU32::new(0));
        let value = Arc::new(AtomicU32::new(0));
        let (f, c, v) = (Arc::clone(&fail), Arc::clone(&calls), Arc::clone(&value));

        let (cache, _cancel) = LiveValueCache::new(Duration::from_millis(120), move || {
            let (f, c, v) = (Arc::clone(&f), Arc::clone(&c), Arc::clone(&v));
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                if f.load(Ordering::SeqCst) {
                    return Err(FetchError::fail("fail"));
                }
                Ok(v.fetch_add(1, Ordering::SeqCst) + 1)
            }
        })
        .unwrap();

        assert_eq!(cache.get_value().await, Ok(1));
        assert_eq!(cache.get_value().await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_millis(130)).await;
        fail.store(true, Ordering::SeqCst);
        let stale = cache.get_value().await.unwrap_err();
        assert_eq!(stale.value, 1);
        assert_eq!(stale.error, FetchError::fail("fail"));

        // Deadline untouched by the failure: the next call retries right away.
        fail.store(false, Ordering::SeqCst);
        assert_eq!(cache.get_value().await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_get_value_fetches_once_per_window() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let (cache, _cancel) = LiveValueCache::new(Duration::from_millis(100), move || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                time::sleep(Duration::from_millis(20)).await;
                Ok::<_, FetchError>(n)
            }
        })
        .unwrap();

        let callers: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_value().await })
            })
            .collect();
        for h in futures::future::join_all(callers).await {
            assert_eq!(h.unwrap(), Ok(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_millis(110)).await;
        let callers: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_value().await })
            })
            .collect();
        for h in futures::future::join_all(callers).await {
            assert_eq!(h.unwrap(), Ok(2));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_value_or_stale_serves_last_value() {
        let fail = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fail);
        let (cache, _cancel) = LiveValueCache::new(Duration::from_millis(100), move || {
            let f = Arc::clone(&f);
            async move {
                if f.load(Ordering::SeqCst) {
                    Err(FetchError::fail("down"))
                } else {
                    Ok(3u32)
                }
            }
        })
        .unwrap();

        assert_eq!(cache.get_value_or_stale().await, 3);
        fail.store(true, Ordering::SeqCst);
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get_value_or_stale().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_fetches_and_publishes() {
        let calls = Arc::new(AtomicU32::new(0));
        let (cache, cancel) = counting_cache(120, &calls);

        let mut sub = cache.register().await;
        assert_eq!(sub.recv().await, Some(1));
        assert_eq!(sub.recv().await, Some(2));
        assert!(cache.is_refreshing().await);

        cache.unregister(&sub).await;
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_value_epsilon() {
        let (cache, cancel) = LiveValueCache::new(Duration::from_millis(100), || async {
            Ok::<_, FetchError>(0.0f64)
        })
        .unwrap();
        let mut sub = cache.register().await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert!(!cache.set_value(1e-9).await);
        assert!(sub.try_recv().is_err());

        assert!(cache.set_value(0.5).await);
        assert_eq!(sub.try_recv(), Ok(0.5));
        assert!(sub.try_recv().is_err());

        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_broadcasts() {
        let calls = Arc::new(AtomicU32::new(0));
        let (cache, cancel) = counting_cache(120, &calls);

        let mut sub = cache.register().await;
        assert_eq!(sub.recv().await, Some(1));

        cancel.cancel();
        cancel.cancel();
        time::sleep(Duration::from_millis(500)).await;

        assert!(sub.try_recv().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cache.is_refreshing().await);

        // Cancellation is permanent.
        let _again = cache.register().await;
        assert!(!cache.is_refreshing().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_exits_without_subscribers_and_restarts() {
        let calls = Arc::new(AtomicU32::new(0));
        let (cache, cancel) = counting_cache(100, &calls);

        let mut sub = cache.register().await;
        assert_eq!(sub.recv().await, Some(1));
        cache.unregister(&sub).await;

        time::sleep(Duration::from_millis(350)).await;
        assert!(!cache.is_refreshing().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let mut sub = cache.register().await;
        assert_eq!(sub.recv().await, Some(2));
        assert!(cache.is_refreshing().await);

        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_fetch_errors_are_swallowed() {
        let fail = Arc::new(AtomicBool::new(true));
        let f = Arc::clone(&fail);
        let (cache, cancel) = LiveValueCache::new(Duration::from_millis(100), move || {
            let f = Arc::clone(&f);
            async move {
                if f.load(Ordering::SeqCst) {
                    Err(FetchError::fail("down"))
                } else {
                    Ok(7u32)
                }
            }
        })
        .unwrap();

        let mut sub = cache.register().await;
        time::sleep(Duration::from_millis(250)).await;
        assert!(sub.try_recv().is_err());
        assert!(cache.is_refreshing().await);

        fail.store(false, Ordering::SeqCst);
        assert_eq!(sub.recv().await, Some(7));

        cancel.cancel();
    }
}
