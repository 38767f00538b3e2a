//! tutorhub core: entity documents, identifiers and lifecycle event naming.

pub mod entity;
pub mod lifecycle;
pub mod types;

pub use entity::{normalize_id, strip_id, Entity, EntityError, ID_FIELD};
pub use lifecycle::{LifecycleEvent, LifecycleHook};
pub use types::{EntityId, EntityKind};
