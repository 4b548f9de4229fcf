//! # Unordered collection with uniformly random removal.
//!
//! [`RandomRemovalSet`] hands items back in random order: every removal picks
//! one of the `n` stored items with probability `1/n`.
//!
//! Removal is O(1): the chosen slot is overwritten by the last item and the
//! vector shrinks by one (`Vec::swap_remove`), so no items are shifted.
//!
//! ```text
//! [a, b, c, d, e]   pick index 1 (b)
//! [a, e, c, d]      e moved into the hole, len - 1
//! ```

use parking_lot::Mutex;
use rand::Rng;

/// Thread-safe bag that removes a uniformly random item.
///
/// Share it behind an `Arc`; all methods take `&self`.
///
/// # Example
/// ```
/// use relaykit::RandomRemovalSet;
///
/// let set = RandomRemovalSet::new();
/// set.add(1);
/// set.add(2);
/// set.add(3);
///
/// let x = set.get_and_remove();
/// assert!((1..=3).contains(&x));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug)]
pub struct RandomRemovalSet<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Default for RandomRemovalSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RandomRemovalSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Adds one item.
    pub fn add(&self, item: T) {
        self.items.lock().push(item);
    }

    /// Removes and returns a uniformly random item.
    ///
    /// # Panics
    /// Panics if the set is empty. Check [`len`](Self::len) first, or use
    /// [`try_get_and_remove`](Self::try_get_and_remove).
    pub fn get_and_remove(&self) -> T {
        match self.try_get_and_remove() {
            Some(item) => item,
            None => panic!("get_and_remove called on an empty RandomRemovalSet"),
        }
    }

    /// Removes and returns a uniformly random item, or `None` if empty.
    pub fn try_get_and_remove(&self) -> Option<T> {
        let mut items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        let offset = rand::rng().random_range(0..items.len());
        Some(items.swap_remove(offset))
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns true if no items are stored.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> FromIterator<T> for RandomRemovalSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}
