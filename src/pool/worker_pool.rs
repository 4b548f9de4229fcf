//! # Bounded pool of concurrent workers.
//!
//! Provides [`WorkerPool`] - a fixed set of worker tasks draining a bounded work
//! queue into a bounded result queue.
//!
//! ## Architecture
//! ```text
//! post(item) ──► [work queue] (cap = backlog, 0 = handoff)
//!                     │
//!          ┌──────────┼──────────┐
//!          ▼          ▼          ▼
//!       worker 1   worker 2   worker N     f(item).await
//!          │          │          │         └──► panic → error!, item dropped
//!          └──────────┼──────────┘
//!                     ▼
//!             [result queue] (cap = backlog, 0 = handoff) ──► result()
//! ```
//!
//! ## Rules
//! - **Backpressure**: `post()` waits while the work queue is full
//! - **Handoff**: with `backlog = 0` nothing is buffered; `post()` returns once a
//!   worker took the item, and a worker moves on once `result()` took its output
//! - **No global ordering**: results arrive in completion order, not post order
//! - **In-flight counter**: incremented by `post()`, decremented by `result()`
//! - **Close once**: `close()` lets workers drain the queue and exit; posting or
//!   closing again afterwards is an error
//!
//! ## Panic handling
//! Each item runs under `catch_unwind`. A panicking work function loses that one
//! item (it is taken off the in-flight count) and the worker keeps going.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::PoolConfig;
use crate::error::{ConfigError, PoolError};

/// Fixed-size pool of workers applying one async function to posted items.
///
/// Must be created inside a tokio runtime (workers are spawned immediately).
///
/// # Example
/// ```rust
/// use relaykit::WorkerPool;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = WorkerPool::new(|n: u64| async move { n * n }, 4, 2)?;
///
///     pool.post(3).await?;
///     pool.post(4).await?;
///     pool.close()?;
///
///     let mut squares = vec![pool.result().await, pool.result().await];
///     squares.sort();
///     assert_eq!(squares, vec![Some(9), Some(16)]);
///     assert!(!pool.is_active());
///     Ok(())
/// }
/// ```
pub struct WorkerPool<W, R> {
    work: parking_lot::Mutex<Option<mpsc::Sender<W>>>,
    handoff: bool,
    results: Mutex<mpsc::Receiver<R>>,
    in_flight: Arc<AtomicUsize>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl<W, R> WorkerPool<W, R>
where
    W: Send + 'static,
    R: Send + 'static,
{
    /// Creates a pool with `workers` workers and queues of `backlog` items.
    ///
    /// Fails with [`ConfigError::NoWorkers`] if `workers == 0`.
    pub fn new<F, Fut>(f: F, backlog: usize, workers: usize) -> Result<Self, ConfigError>
    where
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        Self::with_config(f, PoolConfig { backlog, workers })
    }

    /// Creates a pool from an explicit config.
    pub fn with_config<F, Fut>(f: F, cfg: PoolConfig) -> Result<Self, ConfigError>
    where
        F: Fn(W) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        cfg.validate()?;

        let cap = cfg.backlog_clamped();
        let handoff = cfg.is_synchronous();
        let (work_tx, work_rx) = mpsc::channel::<W>(cap);
        let (result_tx, result_rx) = mpsc::channel::<R>(cap);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let f = Arc::new(f);

        let mut workers = Vec::with_capacity(cfg.workers);
        for id in 0..cfg.workers {
            let work_rx = Arc::clone(&work_rx);
            let result_tx = result_tx.clone();
            let in_flight = Arc::clone(&in_flight);
            let f = Arc::clone(&f);

            workers.push(tokio::spawn(async move {
                loop {
                    let item = work_rx.lock().await.recv().await;
                    let Some(item) = item else { break };

                    let fut = async { f(item).await };
                    match AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(res) => {
                            if result_tx.send(res).await.is_err() {
                                break;
                            }
                            // The slot frees up once result() took the value.
                            if handoff && result_tx.reserve().await.is_err() {
                                break;
                            }
                        }
                        Err(panic_err) => {
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                            error!(
                                worker = id,
                                panic = %panic_message(&*panic_err),
                                "work function panicked, item dropped"
                            );
                        }
                    }
                }
                debug!(worker = id, "worker exiting");
            }));
        }

        Ok(Self {
            work: parking_lot::Mutex::new(Some(work_tx)),
            handoff,
            results: Mutex::new(result_rx),
            in_flight,
            workers: parking_lot::Mutex::new(workers),
        })
    }

    /// Queues one item, waiting while the work queue is full.
    ///
    /// With `backlog = 0` it waits until a worker took the item. Returns [`PoolError::Closed`] after [`close`](Self::close).
    pub async fn post(&self, item: W) -> Result<(), PoolError> {
        let sender = self.work.lock().clone().ok_or(PoolError::Closed)?;

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if sender.send(item).await.is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(PoolError::Closed);
        }
        if self.handoff {
            // Workers only exit after the work queue closed, and `sender` keeps it open.
            let _ = sender.reserve().await;
        }
        Ok(())
    }

    /// Waits for the next result.
    ///
    /// Returns `None` once the pool is closed, every worker exited and all
    /// results were taken.
    pub async fn result(&self) -> Option<R> {
        let res = self.results.lock().await.recv().await?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(res)
    }

    /// Signals that no more items will be posted.
    ///
    /// Workers finish the queued items and exit. Calling it twice returns
    /// [`PoolError::AlreadyClosed`].
    pub fn close(&self) -> Result<(), PoolError> {
        match self.work.lock().take() {
            Some(_sender) => Ok(()),
            None => Err(PoolError::AlreadyClosed),
        }
    }

    /// Returns true once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.work.lock().is_none()
    }

    /// Items posted but whose results were not taken yet.
    pub fn len(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns true if any posted item has not been returned by [`result`](Self::result).
    pub fn is_active(&self) -> bool {
        self.len() > 0
    }

    /// Waits for every worker to exit.
    ///
    /// Only returns after [`close`](Self::close) and once workers are no longer
    /// blocked on a full result queue, so drain results first.
    pub async fn join(&self) {
        let handles = std::mem::take(&mut *self.workers.lock());
        for (worker, h) in handles.into_iter().enumerate() {
            if let Err(e) = h.await {
                error!(worker, error = %e, "worker task failed");
            }
        }
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
