//! Test double that fails chosen operations with a backend error.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tutorhub_core::{Entity, EntityId, EntityKind};

use super::MemoryStore;
use crate::storage::error::StoreError;
use crate::storage::observer::LifecycleObserver;
use crate::traits::EntityStore;

/// Store operations a [`FlakyStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    FindAll,
    Find,
    Create,
    Upsert,
    Save,
    Destroy,
}

/// Delegates to a [`MemoryStore`] except for the operations in `failing`.
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: Vec<Op>,
}

impl FlakyStore {
    pub fn new(kind: EntityKind, failing: &[Op]) -> Self {
        Self {
            inner: MemoryStore::new(kind),
            failing: failing.to_vec(),
        }
    }

    fn check(&self, op: Op) -> Result<(), StoreError> {
        if self.failing.contains(&op) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "connection reset during {op:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for FlakyStore {
    fn kind(&self) -> EntityKind {
        self.inner.kind()
    }

    async fn find_all(&self) -> Result<Vec<Entity>, StoreError> {
        self.check(Op::FindAll)?;
        self.inner.find_all().await
    }

    async fn find(&self, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        self.check(Op::Find)?;
        self.inner.find(id).await
    }

    async fn create(&self, body: Value) -> Result<Entity, StoreError> {
        self.check(Op::Create)?;
        self.inner.create(body).await
    }

    async fn upsert(&self, id: &EntityId, body: Value) -> Result<Entity, StoreError> {
        self.check(Op::Upsert)?;
        self.inner.upsert(id, body).await
    }

    async fn save(&self, entity: &Entity) -> Result<Entity, StoreError> {
        self.check(Op::Save)?;
        self.inner.save(entity).await
    }

    async fn destroy(&self, entity: &Entity) -> Result<(), StoreError> {
        self.check(Op::Destroy)?;
        self.inner.destroy(entity).await
    }

    fn hook(&self, observer: Arc<dyn LifecycleObserver>) {
        self.inner.hook(observer);
    }
}
