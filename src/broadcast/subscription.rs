//! # Receiving end of a broadcaster channel.
//!
//! A [`Subscription`] wraps the receiver half of a bounded [`tokio::sync::mpsc`]
//! channel together with a process-unique id. The id is what the
//! [`Broadcaster`](crate::Broadcaster) uses to find the matching sender on
//! [`unregister`](crate::Broadcaster::unregister); the channel is never looked up by position.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Global id counter for subscriptions.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a subscription.
pub type SubscriptionId = u64;

pub(crate) fn next_id() -> SubscriptionId {
    SUBSCRIPTION_SEQ.fetch_add(1, AtomicOrdering::Relaxed) + 1
}

/// Receive handle returned by [`Broadcaster::register`](crate::Broadcaster::register).
///
/// ### Properties
/// - **FIFO**: values arrive in the order they were broadcast.
/// - **Owned by the subscriber**: dropping the handle closes the channel; later
///   broadcasts skip it instead of failing.
/// - **Drainable after unregister**: buffered values stay readable; [`recv`](Self::recv)
///   returns `None` once no in-flight broadcast still holds the sender.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriptionId,
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(id: SubscriptionId, rx: mpsc::Receiver<T>) -> Self {
        Self { id, rx }
    }

    /// Returns the identity used by the broadcaster.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next value.
    ///
    /// Returns `None` after the subscription was unregistered (or the broadcaster
    /// dropped) and every buffered value has been consumed.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Takes a buffered value without waiting.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.rx.try_recv()
    }

    /// Number of values waiting in the buffer.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if no value is buffered.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
