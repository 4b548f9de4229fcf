//! # Concurrent work distribution.
//!
//! - [`WorkerPool`] - fixed workers, bounded work/result queues, in-flight counter

mod worker_pool;

pub use worker_pool::WorkerPool;
