//! # Fan-out of values to independently buffered subscribers.
//!
//! Provides [`Broadcaster`] - delivers every broadcast value to each registered
//! [`Subscription`], one bounded channel per subscriber.
//!
//! ## Architecture
//! ```text
//! broadcast(value)
//!     │  read lock: snapshot senders, release
//!     │
//!     ├──► [queue 1] (cap 4) ──► subscription 1
//!     ├──► [queue 2] (cap 1) ──► subscription 2
//!     └──► [queue N] (cap 0) ──► subscription N   (waits until received)
//! ```
//!
//! ## Rules
//! - **Snapshot delivery**: a subscriber registered or unregistered during a
//!   broadcast either gets that value or does not; never half of it
//! - **Backpressure**: `broadcast()` waits on a full queue, so a stalled
//!   subscriber stalls the caller's later broadcasts
//! - **Per-subscriber FIFO**: each subscriber sees values in broadcast order
//! - **No cross-subscriber ordering**: delivery walks the snapshot in order
//! - **Subscriber-owned close**: the broadcaster never closes a channel; a dropped
//!   [`Subscription`] is skipped and pruned
//!
//! ## Synchronous delivery
//! tokio channels cannot have zero capacity. A capacity-0 subscriber gets a one
//! slot channel and the broadcaster waits for that slot to free up again after
//! each send, which only happens once the subscriber took the value.

use tokio::sync::{RwLock, Semaphore, mpsc};
use tracing::debug;

use super::subscription::{Subscription, SubscriptionId, next_id};

/// Sending half kept by the broadcaster.
struct Slot<T> {
    id: SubscriptionId,
    sender: mpsc::Sender<T>,
    rendezvous: bool,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sender: self.sender.clone(),
            rendezvous: self.rendezvous,
        }
    }
}

impl<T> Slot<T> {
    /// Sends one value; `false` if the subscriber dropped its handle.
    async fn deliver(&self, value: T) -> bool {
        if self.sender.send(value).await.is_err() {
            return false;
        }
        if self.rendezvous {
            // The slot frees up once the receiver took the value.
            return self.sender.reserve().await.is_ok();
        }
        true
    }
}

/// Fan-out register/unregister/broadcast primitive.
///
/// Wrap in an `Arc` to share between producers and the code that registers
/// subscribers.
///
/// # Example
/// ```rust
/// use relaykit::Broadcaster;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let bus = Broadcaster::new();
///     let mut a = bus.register(1).await;
///     let mut b = bus.register(1).await;
///
///     bus.broadcast("tick").await;
///     assert_eq!(a.recv().await, Some("tick"));
///     assert_eq!(b.recv().await, Some("tick"));
///
///     bus.unregister(&a).await;
///     assert_eq!(bus.size().await, 1);
/// }
/// ```
pub struct Broadcaster<T> {
    slots: RwLock<Vec<Slot<T>>>,
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Broadcaster<T> {
    /// Creates a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Registers a new subscriber channel with the given buffer capacity.
    ///
    /// `capacity = 0` means synchronous delivery: `broadcast()` returns only after
    /// this subscriber received the value. Capacities above
    /// [`Semaphore::MAX_PERMITS`] are clamped to it.
    pub async fn register(&self, capacity: usize) -> Subscription<T> {
        let (sender, rx) = mpsc::channel(capacity.clamp(1, Semaphore::MAX_PERMITS));
        let id = next_id();

        self.slots.write().await.push(Slot {
            id,
            sender,
            rendezvous: capacity == 0,
        });
        Subscription::new(id, rx)
    }

    /// Removes a subscriber. Unknown handles are ignored.
    ///
    /// The channel stays readable: buffered values can still be drained from `sub`.
    /// Returns `true` if the subscriber was registered.
    pub async fn unregister(&self, sub: &Subscription<T>) -> bool {
        self.remove(sub.id()).await
    }

    /// Number of registered subscribers.
    pub async fn size(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Returns true if at least one subscriber is registered.
    pub async fn is_active(&self) -> bool {
        !self.slots.read().await.is_empty()
    }

    async fn remove(&self, id: SubscriptionId) -> bool {
        let mut slots = self.slots.write().await;
        match slots.iter().position(|s| s.id == id) {
            Some(i) => {
                slots.swap_remove(i);
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> Broadcaster<T> {
    /// Sends `value` to every subscriber registered when the call started.
    ///
    /// - Waits on each full queue in turn (backpressure)
    /// - Subscribers that dropped their handle are skipped and pruned afterwards
    pub async fn broadcast(&self, value: T) {
        let snapshot: Vec<Slot<T>> = self.slots.read().await.clone();

        let mut gone = Vec::new();
        for slot in &snapshot {
            if !slot.deliver(value.clone()).await {
                gone.push(slot.id);
            }
        }

        for id in gone {
            if self.remove(id).await {
                debug!(subscription = id, "pruned dropped subscriber");
            }
        }
    }
}
