//! # Thread-safe collections.
//!
//! - [`RandomRemovalSet`] - bag with O(1) uniformly random removal

mod random_set;

pub use random_set::RandomRemovalSet;
