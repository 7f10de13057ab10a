//! Private note HTTP handlers.
//!
//! Notes are strictly per (trip, user): the handlers always key on the
//! authenticated caller, never on a user id from the request body.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use packmate_core::{PrivateNote, PrivateNoteRepository};

use crate::auth::AuthUser;
use crate::handlers::{log_degraded, ActionResponse};
use crate::AppState;

/// Fetch the caller's note list for a trip. A missing document or a fetch
/// error both read as an empty list.
pub async fn get_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
) -> Json<PrivateNote> {
    match state.db.private_notes.get(trip_id, &user.id).await {
        Ok(note) => Json(note),
        Err(e) => {
            log_degraded("get_note", &e);
            Json(PrivateNote::default())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppendNoteBody {
    pub text: String,
}

pub async fn append_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<AppendNoteBody>,
) -> Json<ActionResponse> {
    if body.text.trim().is_empty() {
        return Json(ActionResponse::failed("A note needs some text."));
    }

    match state
        .db
        .private_notes
        .append(trip_id, &user.id, body.text.trim())
        .await
    {
        Ok(entry) => Json(ActionResponse::ok_with(entry.id.to_string())),
        Err(e) => {
            log_degraded("append_note", &e);
            Json(ActionResponse::failed("Could not save note."))
        }
    }
}
