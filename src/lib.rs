//! # relaykit
//!
//! **relaykit** is a small set of generic concurrency primitives meant to be
//! embedded inside larger async services.
//!
//! It provides a fan-out broadcaster, a self-refreshing cached value that
//! notifies subscribers on change, a bounded worker pool and a thread-safe bag
//! with random removal. Each primitive is independent; only the cache builds on
//! the broadcaster.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!              ┌──────────────────────────────────────────────┐
//!  get_value() │  LiveValueCache<T>                           │
//!  ───────────►│  - RwLock<{ value, deadline }>               │
//!  set_value() │  - Fetch<T> (user supplied, fallible)        │
//!  ───────────►│  - CancellationToken                         │
//!              │  - refresh task (spawned on first register)  │
//!              └──────────────┬───────────────────────────────┘
//!                             │ changed value
//!                             ▼
//!              ┌──────────────────────────────────────────────┐
//!              │  Broadcaster<T>                              │
//!              │  snapshot senders ─► send to each (awaits)   │
//!              └───────┬──────────────┬──────────────┬────────┘
//!                      ▼              ▼              ▼
//!                Subscription   Subscription   Subscription
//!
//!  post() ──► [work queue] ──► worker × N ──► [result queue] ──► result()   WorkerPool<W, R>
//!
//!  add() ──► Vec<T> ──► swap_remove(random) ──► get_and_remove()           RandomRemovalSet<T>
//! ```
//!
//! ### Refresh task lifecycle
//! ```text
//! register() ──► first subscriber? ──► spawn refresh_loop
//!
//! loop {
//!   ├─► fetch()
//!   │     ├─ Ok  ──► set_value ──► broadcast if changed beyond NearlyEqual
//!   │     └─ Err ──► warn!, keep value
//!   ├─► select { token.cancelled() ─► exit, sleep(delay) }
//!   └─► subscribers left? no ─► exit
//! }
//! ```
//!
//! ## Features
//! | Area             | Description                                                  | Key types                                   |
//! |------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Fan-out**      | Per-subscriber bounded queues with backpressure.             | [`Broadcaster`], [`Subscription`]           |
//! | **Caching**      | Debounced values, background refresh, change notification.   | [`LiveValueCache`], [`Debouncer`], [`Fetch`]|
//! | **Change checks**| Float tolerance, exact equality for everything else.         | [`NearlyEqual`], [`Exact`]                  |
//! | **Work**         | Fixed worker count, bounded queues, in-flight tracking.      | [`WorkerPool`]                              |
//! | **Collections**  | O(1) uniformly random removal.                               | [`RandomRemovalSet`]                        |
//! | **Errors**       | Typed errors for construction, fetches and pool lifecycle.   | [`ConfigError`], [`FetchError`], [`PoolError`] |
//! | **Configuration**| Construction settings and tuning constants.                  | [`CacheConfig`], [`PoolConfig`]             |
//!
//! ## Logging
//! Background activity (refresh task start/stop, swallowed fetch errors, worker
//! panics) is reported through [`tracing`]. Install any subscriber to see it.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use relaykit::{FetchError, LiveValueCache};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (temperature, cancel) = LiveValueCache::new(Duration::from_millis(500), || async {
//!         // read a sensor...
//!         Ok::<_, FetchError>(20.0f64)
//!     })?;
//!
//!     // Pull: refreshes at most once per 500ms.
//!     let now = temperature.get_value().await?;
//!     assert_eq!(now, 20.0);
//!
//!     // Push: the refresh task runs while someone listens.
//!     let mut updates = temperature.register().await;
//!     temperature.set_value(21.0).await;
//!     assert_eq!(updates.recv().await, Some(21.0));
//!
//!     temperature.unregister(&updates).await;
//!     cancel.cancel();
//!     Ok(())
//! }
//! ```
mod broadcast;
mod cache;
mod collections;
mod config;
mod error;
mod pool;

// ---- Public re-exports ----

pub use broadcast::{Broadcaster, Subscription, SubscriptionId};
pub use cache::{Debouncer, Exact, Fetch, FetchFn, FetchRef, LiveValueCache, NearlyEqual};
pub use collections::RandomRemovalSet;
pub use config::{CacheConfig, F32_EPSILON, F64_EPSILON, MIN_REFRESH_DELAY, PoolConfig};
pub use error::{ConfigError, FetchError, PoolError, StaleValue};
pub use pool::WorkerPool;
