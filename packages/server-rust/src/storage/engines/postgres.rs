//! `PostgreSQL` [`EntityStore`] implementation.
//!
//! Stores each entity kind in its own table as a JSONB document keyed by
//! `_id`. A `BIGSERIAL` column preserves insertion order for `find_all`.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info};
use tutorhub_core::{Entity, EntityId, EntityKind, LifecycleHook};
use uuid::Uuid;

use crate::storage::error::StoreError;
use crate::storage::observer::{LifecycleHooks, LifecycleObserver};
use crate::traits::EntityStore;

/// SQL statements for one table, rendered once at construction.
#[derive(Debug, Clone)]
struct Statements {
    create_table: String,
    select_all: String,
    select_one: String,
    insert: String,
    upsert: String,
    update: String,
    delete: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (\
                 seq BIGSERIAL, \
                 id TEXT PRIMARY KEY, \
                 doc JSONB NOT NULL)"
            ),
            select_all: format!("SELECT doc FROM {table} ORDER BY seq"),
            select_one: format!("SELECT doc FROM {table} WHERE id = $1"),
            insert: format!(
                "INSERT INTO {table} (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING"
            ),
            upsert: format!(
                "INSERT INTO {table} (id, doc) VALUES ($1, $2) \
                 ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc \
                 RETURNING (xmax = 0) AS inserted"
            ),
            update: format!("UPDATE {table} SET doc = $2 WHERE id = $1"),
            delete: format!("DELETE FROM {table} WHERE id = $1 RETURNING doc"),
        }
    }
}

/// JSONB-document store over a shared [`PgPool`].
pub struct PostgresStore {
    kind: EntityKind,
    pool: PgPool,
    sql: Statements,
    hooks: LifecycleHooks,
}

impl PostgresStore {
    /// Creates a store for `kind` over an existing pool.
    #[must_use]
    pub fn new(kind: EntityKind, pool: PgPool) -> Self {
        Self {
            kind,
            pool,
            sql: Statements::for_table(kind.collection),
            hooks: LifecycleHooks::new(),
        }
    }

    /// Opens a connection pool to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    pub async fn connect_pool(url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("failed to connect to PostgreSQL")?;
        info!(max_connections, "PostgreSQL pool connected");
        Ok(pool)
    }
}

#[async_trait]
impl EntityStore for PostgresStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn find_all(&self) -> Result<Vec<Entity>, StoreError> {
        let rows = sqlx::query(&self.sql.select_all)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("loading all {}", self.kind.collection))?;

        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: Value = row.try_get("doc").context("decoding doc column")?;
            entities.push(Entity::from_value(doc)?);
        }
        Ok(entities)
    }

    async fn find(&self, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        let row = sqlx::query(&self.sql.select_one)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading {} {id}", self.kind))?;

        match row {
            Some(row) => {
                let doc: Value = row.try_get("doc").context("decoding doc column")?;
                Ok(Some(Entity::from_value(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, body: Value) -> Result<Entity, StoreError> {
        let entity = Entity::with_default_id(body, || EntityId::new(Uuid::new_v4().to_string()))?;

        let inserted = sqlx::query(&self.sql.insert)
            .bind(entity.id().as_str())
            .bind(entity.to_value())
            .execute(&self.pool)
            .await
            .with_context(|| format!("inserting {} {}", self.kind, entity.id()))?
            .rows_affected();

        if inserted == 0 {
            return Err(StoreError::Conflict {
                kind: self.kind,
                id: entity.id().clone(),
            });
        }

        debug!(kind = %self.kind, id = %entity.id(), "entity created");
        self.hooks.fire(LifecycleHook::AfterCreate, &entity);
        Ok(entity)
    }

    async fn upsert(&self, id: &EntityId, body: Value) -> Result<Entity, StoreError> {
        let entity = Entity::with_id(body, id)?;

        let row = sqlx::query(&self.sql.upsert)
            .bind(id.as_str())
            .bind(entity.to_value())
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("upserting {} {id}", self.kind))?;
        let created: bool = row.try_get("inserted").context("decoding upsert flag")?;

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
        let updated = sqlx::query(&self.sql.update)
            .bind(entity.id().as_str())
            .bind(entity.to_value())
            .execute(&self.pool)
            .await
            .with_context(|| format!("updating {} {}", self.kind, entity.id()))?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::Missing {
                kind: self.kind,
                id: entity.id().clone(),
            });
        }

        debug!(kind = %self.kind, id = %entity.id(), "entity saved");
        self.hooks.fire(LifecycleHook::AfterUpdate, entity);
        Ok(entity.clone())
    }

    async fn destroy(&self, entity: &Entity) -> Result<(), StoreError> {
        let row = sqlx::query(&self.sql.delete)
            .bind(entity.id().as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("deleting {} {}", self.kind, entity.id()))?;

        let Some(row) = row else {
            return Err(StoreError::Missing {
                kind: self.kind,
                id: entity.id().clone(),
            });
        };
        let doc: Value = row.try_get("doc").context("decoding doc column")?;
        let removed = Entity::from_value(doc)?;

        debug!(kind = %self.kind, id = %entity.id(), "entity destroyed");
        self.hooks.fire(LifecycleHook::AfterDestroy, &removed);
        Ok(())
    }

    fn hook(&self, observer: Arc<dyn LifecycleObserver>) {
        self.hooks.register(observer);
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(&self.sql.create_table)
            .execute(&self.pool)
            .await
            .with_context(|| format!("creating table {}", self.kind.collection))?;
        Ok(())
    }
}
