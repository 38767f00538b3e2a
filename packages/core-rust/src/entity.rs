//! JSON document entities.
//!
//! An [`Entity`] is an arbitrary JSON object that always carries a string
//! `_id`. Everything else about its shape belongs to the persistence layer.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::EntityId;

/// Name of the identifying field on every entity document.
pub const ID_FIELD: &str = "_id";

/// Errors raised when a JSON value cannot be treated as an entity document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    #[error("entity document must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
    #[error("entity document has no `_id` field")]
    MissingId,
    #[error("`_id` must be a non-empty string or an integer, got {found}")]
    InvalidId { found: String },
}

/// A persisted JSON document with a normalised `_id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Entity {
    id: EntityId,
    doc: Map<String, Value>,
}

impl Entity {
    /// Parses a document that must already carry an `_id`.
    ///
    /// # Errors
    ///
    /// Fails if `value` is not an object, or its `_id` is missing or invalid.
    pub fn from_value(value: Value) -> Result<Self, EntityError> {
        let doc = into_object(value)?;
        let raw = doc.get(ID_FIELD).ok_or(EntityError::MissingId)?;
        let id = normalize_id(raw)?;
        Ok(Self::assemble(id, doc))
    }

    /// Parses a new document, assigning `generate()` as its id when the
    /// document does not supply one. A null `_id` counts as absent.
    ///
    /// # Errors
    ///
    /// Fails if `value` is not an object or supplies an invalid `_id`.
    pub fn with_default_id(
        value: Value,
        generate: impl FnOnce() -> EntityId,
    ) -> Result<Self, EntityError> {
        let doc = into_object(value)?;
        let id = match doc.get(ID_FIELD) {
            None | Some(Value::Null) => generate(),
            Some(raw) => normalize_id(raw)?,
        };
        Ok(Self::assemble(id, doc))
    }

    /// Parses a document and pins its `_id` to `id`, overriding whatever the
    /// document carried.
    ///
    /// # Errors
    ///
    /// Fails if `value` is not an object.
    pub fn with_id(value: Value, id: &EntityId) -> Result<Self, EntityError> {
        let doc = into_object(value)?;
        Ok(Self::assemble(id.clone(), doc))
    }

    fn assemble(id: EntityId, mut doc: Map<String, Value>) -> Self {
        doc.insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));
        Self { id, doc }
    }

    /// The entity's identifier.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Looks up a top-level attribute.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.doc.get(field)
    }

    /// Clones the document into a standalone JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.doc.clone())
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.doc.serialize(serializer)
    }
}

impl TryFrom<Value> for Entity {
    type Error = EntityError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Removes a client-supplied `_id` from a request body, returning it.
///
/// Non-object bodies (for example a JSON Patch array) are left untouched.
pub fn strip_id(body: &mut Value) -> Option<Value> {
    body.as_object_mut().and_then(|doc| doc.remove(ID_FIELD))
}

/// Normalises a raw `_id` value into an [`EntityId`].
///
/// # Errors
///
/// Strings must be non-empty; numbers must be integers. Anything else is
/// rejected.
pub fn normalize_id(raw: &Value) -> Result<EntityId, EntityError> {
    match raw {
        Value::String(s) if !s.is_empty() => Ok(EntityId::new(s.clone())),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(EntityId::new(n.to_string())),
        other => Err(EntityError::InvalidId {
            found: other.to_string(),
        }),
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, EntityError> {
    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(EntityError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn from_value_requires_id() {
        let err = Entity::from_value(json!({"name": "x"})).unwrap_err();
        assert_eq!(err, EntityError::MissingId);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        let err = Entity::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err, EntityError::NotAnObject { found: "array" });
    }

    #[test]
    fn integer_ids_are_stored_as_strings() {
        let entity = Entity::from_value(json!({"_id": 7, "name": "x"})).unwrap();
        assert_eq!(entity.id().as_str(), "7");
        assert_eq!(entity.get(ID_FIELD), Some(&json!("7")));
    }

    #[test]
    fn invalid_id_types_are_rejected() {
        for raw in [json!(true), json!(1.5), json!(""), json!({"a": 1}), json!(null)] {
            let result = Entity::from_value(json!({ "_id": raw.clone() }));
            assert!(
                matches!(result, Err(EntityError::InvalidId { .. })),
                "expected InvalidId for {raw}"
            );
        }
    }

    #[test]
    fn with_default_id_only_generates_when_missing() {
        let generated = Entity::with_default_id(json!({"a": 1}), || EntityId::from("gen")).unwrap();
        assert_eq!(generated.id().as_str(), "gen");

        let supplied =
            Entity::with_default_id(json!({"_id": "own", "a": 1}), || EntityId::from("gen"))
                .unwrap();
        assert_eq!(supplied.id().as_str(), "own");

        let null = Entity::with_default_id(json!({"_id": null, "a": 1}), || EntityId::from("gen"))
            .unwrap();
        assert_eq!(null.id().as_str(), "gen");
        assert_eq!(null.get(ID_FIELD), Some(&json!("gen")));
        assert_eq!(null.get("a"), Some(&json!(1)));
    }

    #[test]
    fn with_id_overrides_document_id() {
        let entity = Entity::with_id(json!({"_id": "other", "a": 1}), &EntityId::from("path")).unwrap();
        assert_eq!(entity.id().as_str(), "path");
        assert_eq!(entity.get(ID_FIELD), Some(&json!("path")));
        assert_eq!(entity.get("a"), Some(&json!(1)));
    }

    #[test]
    fn serializes_as_the_bare_document() {
        let entity = Entity::from_value(json!({"_id": "a", "n": 1})).unwrap();
        assert_eq!(serde_json::to_value(&entity).unwrap(), json!({"_id": "a", "n": 1}));

        let back: Entity = serde_json::from_value(json!({"_id": "a", "n": 1})).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn strip_id_only_touches_objects() {
        let mut body = json!({"_id": "x", "name": "n"});
        assert_eq!(strip_id(&mut body), Some(json!("x")));
        assert_eq!(body, json!({"name": "n"}));

        let mut patch = json!([{"op": "remove", "path": "/_id"}]);
        assert_eq!(strip_id(&mut patch), None);
        assert_eq!(patch.as_array().map(Vec::len), Some(1));
    }

    proptest! {
        #[test]
        fn integer_ids_normalise_to_decimal(n in any::<i64>()) {
            let id = normalize_id(&json!(n)).unwrap();
            prop_assert_eq!(id.as_str(), n.to_string());
        }

        #[test]
        fn non_empty_string_ids_are_kept_verbatim(s in ".{1,40}") {
            let id = normalize_id(&Value::String(s.clone())).unwrap();
            prop_assert_eq!(id.into_string(), s);
        }
    }
}
