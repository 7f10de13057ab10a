//! Packing item HTTP handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use packmate_core::PackingItemRepository;

use crate::auth::AuthUser;
use crate::handlers::{log_degraded, ActionResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddItemsBody {
    /// One item per non-blank line.
    pub text: String,
    pub category: Option<String>,
}

/// Bulk add: every non-blank line of the body becomes one item, all with the
/// same category and attributed to the caller.
pub async fn add_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<AddItemsBody>,
) -> Json<ActionResponse> {
    if body.text.trim().is_empty() {
        return Json(ActionResponse::failed("Nothing to add."));
    }

    let result = state
        .db
        .items
        .insert_bulk(
            trip_id,
            &body.text,
            body.category.as_deref(),
            user.email.as_deref(),
            user.name.as_deref(),
        )
        .await;

    match result {
        Ok(ids) => Json(ActionResponse::ok_with(format!("Added {} item(s).", ids.len()))),
        Err(e) => {
            log_degraded("add_items", &e);
            Json(ActionResponse::failed("Could not add items."))
        }
    }
}

pub async fn toggle_item(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Json<ActionResponse> {
    match state.db.items.toggle(item_id).await {
        Ok(()) => Json(ActionResponse::ok()),
        Err(e) => {
            log_degraded("toggle_item", &e);
            Json(ActionResponse::failed("Could not update item."))
        }
    }
}

pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Json<ActionResponse> {
    match state.db.items.delete(item_id).await {
        Ok(()) => Json(ActionResponse::ok()),
        Err(e) => {
            log_degraded("delete_item", &e);
            Json(ActionResponse::failed("Could not delete item."))
        }
    }
}
