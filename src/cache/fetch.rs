//! # Fetch abstraction and function-backed fetcher.
//!
//! This module defines the [`Fetch`] trait (async, fallible) and a convenient
//! function-backed implementation [`FetchFn`]. The common handle type is
//! [`FetchRef`], an `Arc<dyn Fetch<T>>` shared by a cache and its refresh task.
//!
//! ## Concurrency semantics
//! - Each call to [`Fetch::fetch`] creates a **new** future owning its state.
//! - A fetch is never cancelled once started; the refresh task waits for it.
//!
//! ## Example
//! ```rust
//! use relaykit::{FetchError, FetchFn, FetchRef};
//!
//! let f: FetchRef<u64> = FetchFn::arc(|| async {
//!     // query something...
//!     Ok::<_, FetchError>(42)
//! });
//! # let _ = f;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;

/// Shared handle to a fetcher.
pub type FetchRef<T> = Arc<dyn Fetch<T>>;

/// # Source of fresh values for a cache.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use relaykit::{Fetch, FetchError};
///
/// struct Uptime;
///
/// #[async_trait]
/// impl Fetch<u64> for Uptime {
///     async fn fetch(&self) -> Result<u64, FetchError> {
///         Ok(17)
///     }
/// }
/// ```
#[async_trait]
pub trait Fetch<T>: Send + Sync + 'static {
    /// Produces the current value.
    async fn fetch(&self) -> Result<T, FetchError>;
}

/// Function-backed fetcher.
///
/// Wraps a closure that *creates* a new future per call.
#[derive(Debug)]
pub struct FetchFn<F> {
    f: F,
}

impl<F> FetchFn<F> {
    /// Creates a new function-backed fetcher.
    ///
    /// Prefer [`FetchFn::arc`] when you immediately need a [`FetchRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the fetcher and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, Fut> Fetch<T> for FetchFn<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<T, FetchError> {
        (self.f)().await
    }
}
