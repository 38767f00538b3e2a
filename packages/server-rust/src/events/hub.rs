//! Named-channel publish/subscribe hub for entity events.
//!
//! One hub exists per entity kind. Subscribers register a handler against an
//! event name and receive every entity emitted under that exact name. There
//! is no cap on the number of subscribers per name.
//!
//! Emission is synchronous and fire-and-forget: nothing is buffered for
//! subscribers that register later, and a panicking handler is logged and
//! skipped without affecting the emitter or the other handlers.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tutorhub_core::Entity;

/// Callback invoked with each entity emitted on a subscribed event name.
pub type EventHandler = Arc<dyn Fn(&Entity) + Send + Sync>;

/// Token returned by [`EventHub::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    event: String,
}

impl SubscriptionHandle {
    /// Event name this subscription listens on.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }
}

#[derive(Clone)]
enum Delivery {
    Callback(EventHandler),
    Channel(mpsc::UnboundedSender<Entity>),
}

#[derive(Clone)]
struct Subscriber {
    id: u64,
    delivery: Delivery,
}

impl Subscriber {
    /// A channel subscription dies with its receiver.
    fn is_live(&self) -> bool {
        match &self.delivery {
            Delivery::Callback(_) => true,
            Delivery::Channel(tx) => !tx.is_closed(),
        }
    }

    /// Returns `false` when there was nobody left to deliver to.
    fn deliver(&self, entity: &Entity) -> bool {
        match &self.delivery {
            Delivery::Callback(handler) => {
                handler(entity);
                true
            }
            Delivery::Channel(tx) => tx.send(entity.clone()).is_ok(),
        }
    }
}

/// Publish/subscribe hub scoped to one entity kind.
pub struct EventHub {
    name: &'static str,
    next_id: AtomicU64,
    channels: RwLock<HashMap<String, Vec<Subscriber>>>,
}

impl EventHub {
    /// Creates an empty hub. `name` labels log lines and metrics.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Label this hub was created with.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `handler` for every future emission of `event`.
    pub fn subscribe<F>(&self, event: impl Into<String>, handler: F) -> SubscriptionHandle
    where
        F: Fn(&Entity) + Send + Sync + 'static,
    {
        self.register(event.into(), Delivery::Callback(Arc::new(handler)))
    }

    /// Subscribes to `event` and forwards each entity into an unbounded
    /// channel, for consumers running on their own task.
    ///
    /// Dropping the receiver ends the subscription: it stops being counted
    /// and is pruned on the next emission of `event`.
    pub fn subscribe_channel(
        &self,
        event: impl Into<String>,
    ) -> (SubscriptionHandle, mpsc::UnboundedReceiver<Entity>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.register(event.into(), Delivery::Channel(tx));
        (handle, rx)
    }

    fn register(&self, event: String, delivery: Delivery) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.channels
            .write()
            .entry(event.clone())
            .or_default()
            .push(Subscriber { id, delivery });
        SubscriptionHandle { id, event }
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut channels = self.channels.write();
        let Some(subscribers) = channels.get_mut(&handle.event) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != handle.id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            channels.remove(&handle.event);
        }
        removed
    }

    /// Delivers `entity` to every subscriber of `event`.
    ///
    /// Returns the number of deliveries that completed: panicking handlers
    /// and closed channels are not counted, and closed channels are pruned.
    /// Handlers run outside the hub's lock, so they may subscribe or
    /// unsubscribe re-entrantly.
    pub fn emit(&self, event: &str, entity: &Entity) -> usize {
        let subscribers: Vec<Subscriber> = match self.channels.read().get(event) {
            Some(subscribers) => subscribers.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for subscriber in subscribers {
            match catch_unwind(AssertUnwindSafe(|| subscriber.deliver(entity))) {
                Ok(true) => delivered += 1,
                Ok(false) => closed.push(subscriber.id),
                Err(_) => warn!(
                    hub = self.name,
                    event,
                    subscription = subscriber.id,
                    "event subscriber panicked"
                ),
            }
        }

        if !closed.is_empty() {
            self.prune(event, &closed);
        }
        delivered
    }

    fn prune(&self, event: &str, ids: &[u64]) {
        let mut channels = self.channels.write();
        if let Some(subscribers) = channels.get_mut(event) {
            subscribers.retain(|s| !ids.contains(&s.id));
            if subscribers.is_empty() {
                channels.remove(event);
            }
        }
        debug!(
            hub = self.name,
            event,
            pruned = ids.len(),
            "closed channel subscriptions removed"
        );
    }

    /// Number of live subscriptions on `event`.
    #[must_use]
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.channels
            .read()
            .get(event)
            .map_or(0, |subscribers| subscribers.iter().filter(|s| s.is_live()).count())
    }

    /// Number of live subscriptions across all event names.
    #[must_use]
    pub fn total_subscribers(&self) -> usize {
        self.channels
            .read()
            .values()
            .flatten()
            .filter(|s| s.is_live())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    fn entity(id: &str) -> Entity {
        Entity::from_value(json!({ "_id": id })).unwrap()
    }

    #[test]
    fn emit_without_subscribers_is_dropped() {
        let hub = EventHub::new("Test");
        assert_eq!(hub.emit("save", &entity("a")), 0);
    }

    #[test]
    fn subscribers_only_receive_their_event_name() {
        let hub = EventHub::new("Test");
        let saves = Arc::new(AtomicUsize::new(0));
        let removes = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&saves);
        hub.subscribe("save", move |_| {
            s.fetch_add(1, Ordering::Relaxed);
        });
        let r = Arc::clone(&removes);
        hub.subscribe("remove", move |_| {
            r.fetch_add(1, Ordering::Relaxed);
        });

        hub.emit("save", &entity("a"));
        hub.emit("save:a", &entity("a"));

        assert_eq!(saves.load(Ordering::Relaxed), 1);
        assert_eq!(removes.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn no_subscriber_ceiling() {
        let hub = EventHub::new("Test");
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..500 {
            let h = Arc::clone(&hits);
            hub.subscribe("save", move |_| {
                h.fetch_add(1, Ordering::Relaxed);
            });
        }

        assert_eq!(hub.subscriber_count("save"), 500);
        assert_eq!(hub.emit("save", &entity("a")), 500);
        assert_eq!(hits.load(Ordering::Relaxed), 500);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = EventHub::new("Test");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let handle = hub.subscribe("save", move |e: &Entity| s.lock().push(e.id().to_string()));

        hub.emit("save", &entity("a"));
        assert!(hub.unsubscribe(&handle));
        assert!(!hub.unsubscribe(&handle));
        hub.emit("save", &entity("b"));

        assert_eq!(*seen.lock(), vec!["a".to_string()]);
        assert_eq!(hub.total_subscribers(), 0);
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let hub = EventHub::new("Test");
        let hits = Arc::new(AtomicUsize::new(0));
        hub.subscribe("save", |_| panic!("bad subscriber"));
        let h = Arc::clone(&hits);
        hub.subscribe("save", move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(hub.emit("save", &entity("a")), 1);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn handlers_may_subscribe_reentrantly() {
        let hub = Arc::new(EventHub::new("Test"));
        let inner = Arc::clone(&hub);
        hub.subscribe("save", move |_| {
            inner.subscribe("remove", |_| {});
        });

        hub.emit("save", &entity("a"));
        assert_eq!(hub.subscriber_count("remove"), 1);
    }

    #[tokio::test]
    async fn channel_subscription_forwards_entities() {
        let hub = EventHub::new("Test");
        let (handle, mut rx) = hub.subscribe_channel("remove:a");
        assert_eq!(handle.event(), "remove:a");

        hub.emit("remove:a", &entity("a"));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id().as_str(), "a");

        drop(rx);
        assert_eq!(hub.subscriber_count("remove:a"), 0);
        assert_eq!(hub.emit("remove:a", &entity("a")), 0);
        assert!(!hub.unsubscribe(&handle));
    }

    #[test]
    fn dropped_receivers_are_pruned_on_emit() {
        let hub = EventHub::new("Test");
        let receivers: Vec<_> = (0..1000).map(|_| hub.subscribe_channel("save").1).collect();
        let (_kept, mut kept_rx) = hub.subscribe_channel("save");
        hub.subscribe("save", |_| {});
        assert_eq!(hub.total_subscribers(), 1002);

        drop(receivers);
        assert_eq!(hub.subscriber_count("save"), 2);

        assert_eq!(hub.emit("save", &entity("a")), 2);
        assert_eq!(hub.channels.read().get("save").map(Vec::len), Some(2));
        assert_eq!(hub.total_subscribers(), 2);
        assert_eq!(kept_rx.try_recv().unwrap().id().as_str(), "a");
    }
}
