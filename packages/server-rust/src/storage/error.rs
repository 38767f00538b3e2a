//! Persistence-layer errors.

use tutorhub_core::{EntityError, EntityId, EntityKind};

/// Failure reported by an [`EntityStore`](crate::EntityStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} with _id {id} already exists")]
    Conflict { kind: EntityKind, id: EntityId },
    #[error("{kind} with _id {id} no longer exists")]
    Missing { kind: EntityKind, id: EntityId },
    #[error("invalid document: {0}")]
    InvalidDocument(#[from] EntityError),
    #[error("storage backend failure: {0:#}")]
    Backend(#[from] anyhow::Error),
}
