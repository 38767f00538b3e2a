//! Response-shaping stages shared by every CRUD handler.
//!
//! A handler threads an [`Outcome`] through a fixed sequence of stages and
//! always ends with [`handle_error`], which turns the final outcome into
//! exactly one HTTP response:
//!
//! ```text
//! lookup -> handle_entity_not_found -> mutate -> respond_with_result -> handle_error
//! ```
//!
//! `NotFound` and `Failed` pass through every intermediate stage untouched,
//! so once a lookup misses or any call fails, no later stage can run a
//! mutation or produce a second response.

use std::future::Future;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;
use tutorhub_core::Entity;

use super::patch::{apply_patch, PatchApplicationError};
use crate::storage::StoreError;
use crate::traits::EntityStore;

/// Any failure a CRUD chain can end in. All variants render identically
/// apart from the `name` field of the payload.
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    #[error(transparent)]
    PatchApplication(#[from] PatchApplicationError),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl CrudError {
    /// Error kind reported in the response payload.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PatchApplication(_) => "PatchApplicationError",
            Self::Persistence(_) => "PersistenceError",
        }
    }

    /// Body sent to the client. Not redacted.
    #[must_use]
    pub fn payload(&self) -> Value {
        json!({
            "name": self.name(),
            "message": self.to_string(),
        })
    }
}

/// State threaded between responder stages.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The chain is still carrying a value.
    Found(T),
    /// A lookup by id found nothing. Rendered as 404 with an empty body.
    NotFound,
    /// A call failed. Rendered by [`handle_error`].
    Failed(CrudError),
}

impl<T> Outcome<T> {
    /// Lifts a call that always yields a value on success.
    pub fn from_result<E: Into<CrudError>>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(err) => Self::Failed(err.into()),
        }
    }

    /// Transforms a `Found` value; other states pass through.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Found(value) => Outcome::Found(f(value)),
            Self::NotFound => Outcome::NotFound,
            Self::Failed(err) => Outcome::Failed(err),
        }
    }

    /// Runs a fallible async step on a `Found` value; other states pass
    /// through without running it.
    pub async fn and_then<U, F, Fut>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<U, CrudError>>,
    {
        match self {
            Self::Found(value) => Outcome::from_result(f(value).await),
            Self::NotFound => Outcome::NotFound,
            Self::Failed(err) => Outcome::Failed(err),
        }
    }
}

/// Guards a lookup by id. Must directly follow every lookup and precede any
/// mutation stage.
pub fn handle_entity_not_found<T, E: Into<CrudError>>(lookup: Result<Option<T>, E>) -> Outcome<T> {
    match lookup {
        Ok(Some(value)) => Outcome::Found(value),
        Ok(None) => Outcome::NotFound,
        Err(err) => Outcome::Failed(err.into()),
    }
}

/// Serializes a `Found` value as the JSON body with `status`.
pub fn respond_with_result<T: Serialize>(outcome: Outcome<T>, status: StatusCode) -> Outcome<Response> {
    outcome.map(|value| (status, Json(value)).into_response())
}

/// Applies `patch` to a `Found` entity and persists the result.
///
/// A patch that fails validation or application ends the chain as
/// `Failed(PatchApplication)` before anything is saved.
pub async fn patch_updates(
    store: &dyn EntityStore,
    outcome: Outcome<Entity>,
    patch: Value,
) -> Outcome<Entity> {
    outcome
        .and_then(|entity| async move {
            let patched = apply_patch(&entity, patch)?;
            Ok::<_, CrudError>(store.save(&patched).await?)
        })
        .await
}

/// Deletes a `Found` entity and yields a 204 with an empty body.
pub async fn remove_entity(store: &dyn EntityStore, outcome: Outcome<Entity>) -> Outcome<Response> {
    outcome
        .and_then(|entity| async move {
            store.destroy(&entity).await?;
            Ok::<_, CrudError>(StatusCode::NO_CONTENT.into_response())
        })
        .await
}

/// Terminal stage: renders the chain's final outcome as the response.
///
/// Failures are logged and sent with `status` and the raw error payload.
pub fn handle_error(outcome: Outcome<Response>, status: StatusCode) -> Response {
    match outcome {
        Outcome::Found(response) => response,
        Outcome::NotFound => StatusCode::NOT_FOUND.into_response(),
        Outcome::Failed(err) => {
            error!(kind = err.name(), error = %err, "request failed");
            (status, Json(err.payload())).into_response()
        }
    }
}
