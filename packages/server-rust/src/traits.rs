use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tutorhub_core::{Entity, EntityId, EntityKind};

use crate::storage::{LifecycleObserver, StoreError};

/// Pluggable persistence backend for one entity kind.
/// Implementations: in-memory (default, tests), `PostgreSQL` (`postgres` feature).
///
/// Every successful write fires the matching lifecycle hook on all observers
/// registered through [`hook`](EntityStore::hook). Observers run after the
/// write has been applied and cannot fail it.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Entity kind this store persists.
    fn kind(&self) -> EntityKind;

    /// Load every entity, in insertion order.
    async fn find_all(&self) -> Result<Vec<Entity>, StoreError>;

    /// Load a single entity by `_id`.
    async fn find(&self, id: &EntityId) -> Result<Option<Entity>, StoreError>;

    /// Insert a new entity. A missing `_id` is generated.
    /// Fires `after_create`.
    async fn create(&self, body: Value) -> Result<Entity, StoreError>;

    /// Insert or replace the entity stored at `id`. The body's own `_id`, if
    /// any, is overridden by `id`.
    /// Fires `after_create` when `id` was absent, otherwise `after_update`.
    async fn upsert(&self, id: &EntityId, body: Value) -> Result<Entity, StoreError>;

    /// Persist new contents for an existing entity.
    /// Fires `after_update`.
    async fn save(&self, entity: &Entity) -> Result<Entity, StoreError>;

    /// Delete an existing entity.
    /// Fires `after_destroy`.
    async fn destroy(&self, entity: &Entity) -> Result<(), StoreError>;

    /// Register a lifecycle observer. There is no limit on the number of
    /// observers.
    fn hook(&self, observer: Arc<dyn LifecycleObserver>);

    /// One-time initialization (e.g., create tables).
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
