//! JSON Patch (RFC 6902) application onto entity documents.

use serde_json::Value;
use tutorhub_core::{Entity, EntityError, EntityId, ID_FIELD};

/// Why a patch document could not be applied to an entity.
#[derive(Debug, thiserror::Error)]
pub enum PatchApplicationError {
    #[error("malformed patch document: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("patch rejected: {0}")]
    Rejected(#[from] json_patch::PatchError),
    #[error("patch would change `_id` of {id}")]
    IdentityChanged { id: EntityId },
    #[error("patched document is invalid: {0}")]
    InvalidResult(#[from] EntityError),
}

/// Validates `document` as a JSON Patch and applies it to a copy of
/// `entity`, operation by operation.
///
/// The input entity is never modified: on any failure the caller still holds
/// the untouched original.
///
/// # Errors
///
/// Fails if `document` is not a well-formed patch, any operation cannot be
/// applied (including a failing `test`), or the result no longer carries the
/// entity's `_id`.
pub fn apply_patch(entity: &Entity, document: Value) -> Result<Entity, PatchApplicationError> {
    let patch: json_patch::Patch =
        serde_json::from_value(document).map_err(PatchApplicationError::Malformed)?;

    let mut doc = entity.to_value();
    json_patch::patch(&mut doc, &patch.0)?;

    if doc.get(ID_FIELD).and_then(Value::as_str) != Some(entity.id().as_str()) {
        return Err(PatchApplicationError::IdentityChanged {
            id: entity.id().clone(),
        });
    }

    Ok(Entity::from_value(doc)?)
}
