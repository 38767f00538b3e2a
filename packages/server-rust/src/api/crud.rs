//! Generic CRUD actions over any [`EntityStore`].
//!
//! Each action composes responder stages in a fixed order. Entity-specific
//! controllers only have to supply the store.

use axum::http::StatusCode;
use axum::response::Response;
use metrics::counter;
use serde_json::Value;
use tutorhub_core::{strip_id, EntityId};

use super::responder::{
    handle_entity_not_found, handle_error, patch_updates, remove_entity, respond_with_result,
    Outcome,
};
use crate::traits::EntityStore;

/// Lists every entity.
pub async fn index(store: &dyn EntityStore) -> Response {
    let all = Outcome::from_result(store.find_all().await);
    let response = handle_error(
        respond_with_result(all, StatusCode::OK),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    record(store, "index", response)
}

/// Fetches one entity by id.
pub async fn show(store: &dyn EntityStore, id: &EntityId) -> Response {
    let found = handle_entity_not_found(store.find(id).await);
    let response = handle_error(
        respond_with_result(found, StatusCode::OK),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    record(store, "show", response)
}

/// Creates an entity from the request body.
pub async fn create(store: &dyn EntityStore, body: Value) -> Response {
    let created = Outcome::from_result(store.create(body).await);
    let response = handle_error(
        respond_with_result(created, StatusCode::CREATED),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    record(store, "create", response)
}

/// Creates or replaces the entity at `id`. A body `_id` is discarded.
pub async fn upsert(store: &dyn EntityStore, id: &EntityId, mut body: Value) -> Response {
    strip_id(&mut body);
    let upserted = Outcome::from_result(store.upsert(id, body).await);
    let response = handle_error(
        respond_with_result(upserted, StatusCode::OK),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    record(store, "upsert", response)
}

/// Applies a JSON Patch document to the entity at `id`.
pub async fn patch(store: &dyn EntityStore, id: &EntityId, mut body: Value) -> Response {
    strip_id(&mut body);
    let found = handle_entity_not_found(store.find(id).await);
    let patched = patch_updates(store, found, body).await;
    let response = handle_error(
        respond_with_result(patched, StatusCode::OK),
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    record(store, "patch", response)
}

/// Deletes the entity at `id`.
pub async fn destroy(store: &dyn EntityStore, id: &EntityId) -> Response {
    let found = handle_entity_not_found(store.find(id).await);
    let response = handle_error(
        remove_entity(store, found).await,
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    record(store, "destroy", response)
}

fn record(store: &dyn EntityStore, action: &'static str, response: Response) -> Response {
    counter!(
        "tutorhub_http_responses_total",
        "collection" => store.kind().collection,
        "action" => action,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    response
}
