//! Entity lifecycle events: a per-kind [`EventHub`] and the
//! [`LifecycleEventBroadcaster`] that feeds it from store hooks.

pub mod broadcaster;
pub mod hub;

pub use broadcaster::LifecycleEventBroadcaster;
pub use hub::{EventHandler, EventHub, SubscriptionHandle};
