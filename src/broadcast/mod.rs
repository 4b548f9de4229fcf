//! Fan-out notification: the broadcaster and its subscription handle.
//!
//! ## Contents
//! - [`Broadcaster`] register/unregister/broadcast over per-subscriber bounded queues
//! - [`Subscription`] receive handle owned by the subscriber
//!
//! ## Quick reference
//! - **Publishers**: any caller of [`Broadcaster::broadcast`], and
//!   [`LiveValueCache`](crate::LiveValueCache) on value change.
//! - **Consumers**: holders of a [`Subscription`].

mod broadcaster;
mod subscription;

pub use broadcaster::Broadcaster;
pub use subscription::{Subscription, SubscriptionId};
