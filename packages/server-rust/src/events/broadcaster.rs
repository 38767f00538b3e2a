//! Republishes store lifecycle hooks onto an [`EventHub`].
//!
//! Every hook invocation is emitted twice, synchronously and in this order:
//!
//! 1. `<event>:<_id>` for subscribers following a single entity
//! 2. `<event>` for subscribers following the whole kind
//!
//! where `<event>` is `save` for creates and updates and `remove` for
//! deletes.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;
use tutorhub_core::{Entity, LifecycleHook};

use super::hub::EventHub;
use crate::storage::LifecycleObserver;
use crate::traits::EntityStore;

/// Lifecycle observer that fans store writes out to an [`EventHub`].
pub struct LifecycleEventBroadcaster {
    hub: Arc<EventHub>,
}

impl LifecycleEventBroadcaster {
    /// Creates a broadcaster publishing onto `hub`.
    #[must_use]
    pub fn new(hub: Arc<EventHub>) -> Self {
        Self { hub }
    }

    /// Creates a hub for `store`'s entity kind and hooks a broadcaster into
    /// the store's create, update and destroy notifications.
    pub fn attach(store: &dyn EntityStore) -> Arc<EventHub> {
        let hub = Arc::new(EventHub::new(store.kind().name));
        store.hook(Arc::new(Self::new(Arc::clone(&hub))));
        debug!(kind = %store.kind(), "lifecycle broadcaster attached");
        hub
    }

    fn broadcast(&self, hook: LifecycleHook, entity: &Entity) {
        let event = hook.event();
        let scoped = self.hub.emit(&event.scoped(entity.id()), entity);
        let general = self.hub.emit(event.as_str(), entity);

        counter!(
            "tutorhub_lifecycle_events_total",
            "kind" => self.hub.name(),
            "event" => event.as_str()
        )
        .increment(1);
        debug!(
            kind = self.hub.name(),
            hook = hook.as_str(),
            id = %entity.id(),
            scoped,
            general,
            "lifecycle event emitted"
        );
    }
}

impl LifecycleObserver for LifecycleEventBroadcaster {
    fn after_create(&self, entity: &Entity) {
        self.broadcast(LifecycleHook::AfterCreate, entity);
    }

    fn after_update(&self, entity: &Entity) {
        self.broadcast(LifecycleHook::AfterUpdate, entity);
    }

    fn after_destroy(&self, entity: &Entity) {
        self.broadcast(LifecycleHook::AfterDestroy, entity);
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;
    use tutorhub_core::{EntityId, EntityKind};

    use super::*;
    use crate::storage::MemoryStore;

    /// Subscribes a recorder to each name, logging `(name, id)` per delivery.
    fn record(hub: &EventHub, names: &[&str]) -> Arc<Mutex<Vec<(String, String)>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in names {
            let log = Arc::clone(&log);
            let label = (*name).to_string();
            hub.subscribe(*name, move |e: &Entity| {
                log.lock().push((label.clone(), e.id().to_string()));
            });
        }
        log
    }

    #[tokio::test]
    async fn create_emits_scoped_then_general_save() {
        let store = MemoryStore::new(EntityKind::TUTOR_STUDENT);
        let hub = LifecycleEventBroadcaster::attach(&store);
        let log = record(&hub, &["save", "save:ts-1", "remove", "remove:ts-1"]);

        store
            .create(json!({"_id": "ts-1", "tutor": "t", "student": "s"}))
            .await
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                ("save:ts-1".to_string(), "ts-1".to_string()),
                ("save".to_string(), "ts-1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn update_is_indistinguishable_from_create() {
        let store = MemoryStore::new(EntityKind::TUTOR_STUDENT);
        let hub = LifecycleEventBroadcaster::attach(&store);
        let id = EntityId::from("ts-2");

        store.upsert(&id, json!({"n": 1})).await.unwrap();
        let log = record(&hub, &["save", "save:ts-2"]);
        store.upsert(&id, json!({"n": 2})).await.unwrap();

        let names: Vec<String> = log.lock().iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["save:ts-2", "save"]);
    }

    #[tokio::test]
    async fn destroy_emits_remove_pair_with_entity_payload() {
        let store = MemoryStore::new(EntityKind::TUTOR_STUDENT);
        let hub = LifecycleEventBroadcaster::attach(&store);
        let entity = store.create(json!({"_id": "ts-3", "n": 7})).await.unwrap();

        let payloads = Arc::new(Mutex::new(Vec::new()));
        for name in ["remove:ts-3", "remove"] {
            let payloads = Arc::clone(&payloads);
            hub.subscribe(name, move |e: &Entity| payloads.lock().push(e.clone()));
        }

        store.destroy(&entity).await.unwrap();
        assert_eq!(*payloads.lock(), vec![entity.clone(), entity]);
    }

    #[tokio::test]
    async fn late_subscribers_get_no_replay() {
        let store = MemoryStore::new(EntityKind::TUTOR_STUDENT);
        let hub = LifecycleEventBroadcaster::attach(&store);

        store.create(json!({"_id": "ts-4"})).await.unwrap();
        let (_handle, mut rx) = hub.subscribe_channel("save");

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn subscriber_panic_does_not_fail_the_write() {
        let store = MemoryStore::new(EntityKind::TUTOR_STUDENT);
        let hub = LifecycleEventBroadcaster::attach(&store);
        hub.subscribe("save", |_| panic!("subscriber bug"));

        let created = store.create(json!({"_id": "ts-5"})).await;
        assert!(created.is_ok());
        assert!(store.find(&EntityId::from("ts-5")).await.unwrap().is_some());
    }
}
