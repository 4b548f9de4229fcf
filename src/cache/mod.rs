//! # Debounced values and their fetch sources.
//!
//! This module provides the caching types:
//! - [`LiveValueCache`] - shared, self-refreshing value that broadcasts changes
//! - [`Debouncer`] - single-owner value refreshed on demand
//! - [`Fetch`] / [`FetchFn`] / [`FetchRef`] - where fresh values come from
//! - [`NearlyEqual`] / [`Exact`] - what counts as a change

mod debouncer;
mod fetch;
mod live;
mod nearly_equal;

pub use debouncer::Debouncer;
pub use fetch::{Fetch, FetchFn, FetchRef};
pub use live::LiveValueCache;
pub use nearly_equal::{Exact, NearlyEqual};
