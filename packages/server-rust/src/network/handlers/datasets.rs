//! `/api/datasets` routes.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tutorhub_core::EntityId;

use super::AppState;
use crate::api::crud;

/// Dataset CRUD routes under `/api/datasets`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/datasets", get(index).post(create))
        .route(
            "/api/datasets/{id}",
            get(show).put(upsert).patch(patch).delete(destroy),
        )
}

async fn index(State(state): State<AppState>) -> Response {
    crud::index(state.services.stores.datasets.as_ref()).await
}

async fn show(State(state): State<AppState>, Path(id): Path<EntityId>) -> Response {
    crud::show(state.services.stores.datasets.as_ref(), &id).await
}

async fn create(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    crud::create(state.services.stores.datasets.as_ref(), body).await
}

async fn upsert(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(body): Json<Value>,
) -> Response {
    crud::upsert(state.services.stores.datasets.as_ref(), &id, body).await
}

async fn patch(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(body): Json<Value>,
) -> Response {
    crud::patch(state.services.stores.datasets.as_ref(), &id, body).await
}

async fn destroy(State(state): State<AppState>, Path(id): Path<EntityId>) -> Response {
    crud::destroy(state.services.stores.datasets.as_ref(), &id).await
}
