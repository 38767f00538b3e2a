//! In-memory [`EntityStore`] implementation backed by [`DashMap`].
//!
//! Provides concurrent read/write access without external locking.
//! Suitable for development, testing, and deployments where losing data on
//! restart is acceptable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use tutorhub_core::{Entity, EntityId, EntityKind, LifecycleHook};
use uuid::Uuid;

use crate::storage::error::StoreError;
use crate::storage::observer::{LifecycleHooks, LifecycleObserver};
use crate::traits::EntityStore;

/// Stored document plus its insertion sequence number, used to keep
/// `find_all` ordered.
#[derive(Debug, Clone)]
struct StoredEntity {
    seq: u64,
    entity: Entity,
}

/// In-memory store backed by [`DashMap`] for concurrent access.
///
/// Shard guards are always released before lifecycle hooks fire, so
/// observers may call back into the store.
pub struct MemoryStore {
    kind: EntityKind,
    entries: DashMap<EntityId, StoredEntity>,
    next_seq: AtomicU64,
    hooks: LifecycleHooks,
}

impl MemoryStore {
    /// Creates a new, empty store for `kind`.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
            hooks: LifecycleHooks::new(),
        }
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn stamp(&self, entity: Entity) -> StoredEntity {
        StoredEntity {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            entity,
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn find_all(&self) -> Result<Vec<Entity>, StoreError> {
        let mut stored: Vec<StoredEntity> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        stored.sort_by_key(|s| s.seq);
        Ok(stored.into_iter().map(|s| s.entity).collect())
    }

    async fn find(&self, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self.entries.get(id).map(|stored| stored.entity.clone()))
    }

    async fn create(&self, body: Value) -> Result<Entity, StoreError> {
        let entity = Entity::with_default_id(body, || EntityId::new(Uuid::new_v4().to_string()))?;

        match self.entries.entry(entity.id().clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict {
                    kind: self.kind,
                    id: entity.id().clone(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(self.stamp(entity.clone()));
            }
        }

        debug!(kind = %self.kind, id = %entity.id(), "entity created");
        self.hooks.fire(LifecycleHook::AfterCreate, &entity);
        Ok(entity)
    }

    async fn upsert(&self, id: &EntityId, body: Value) -> Result<Entity, StoreError> {
        let entity = Entity::with_id(body, id)?;

        let created = match self.entries.entry(id.clone()) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().entity = entity.clone();
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(self.stamp(entity.clone()));
                true
            }
        };

        let hook = if created {
            LifecycleHook::AfterCreate
        } else {
            LifecycleHook::AfterUpdate
        };
        debug!(kind = %self.kind, id = %id, created, "entity upserted");
        self.hooks.fire(hook, &entity);
        Ok(entity)
    }

    async fn save(&self, entity: &Entity) -> Result<Entity, StoreError> {
        {
            let Some(mut stored) = self.entries.get_mut(entity.id()) else {
                return Err(StoreError::Missing {
                    kind: self.kind,
                    id: entity.id().clone(),
                });
            };
            stored.entity = entity.clone();
        }

        debug!(kind = %self.kind, id = %entity.id(), "entity saved");
        self.hooks.fire(LifecycleHook::AfterUpdate, entity);
        Ok(entity.clone())
    }

    async fn destroy(&self, entity: &Entity) -> Result<(), StoreError> {
        let (_, removed) = self
            .entries
            .remove(entity.id())
            .ok_or_else(|| StoreError::Missing {
                kind: self.kind,
                id: entity.id().clone(),
            })?;

        debug!(kind = %self.kind, id = %entity.id(), "entity destroyed");
        self.hooks.fire(LifecycleHook::AfterDestroy, &removed.entity);
        Ok(())
    }

    fn hook(&self, observer: Arc<dyn LifecycleObserver>) {
        self.hooks.register(observer);
    }
}
