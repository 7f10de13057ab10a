//! Assistant chat, confirmation, and calendar reminder handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use packmate_assistant::apply_actions;
use packmate_core::{AssistantAction, AssistantReply, PackingItemRepository, TripRepository};

use crate::auth::AuthUser;
use crate::calendar::CALENDAR_TOKEN_HEADER;
use crate::handlers::{log_degraded, ActionResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
}

/// One assistant turn for a trip. The thread is keyed by (trip, caller), so
/// collaborators on the same trip never see each other's messages.
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<ChatBody>,
) -> Json<AssistantReply> {
    let Some(bridge) = &state.assistant else {
        // No backend configured; degrade the same way a failed turn does.
        return Json(AssistantReply::fallback());
    };

    // Visibility gate: the assistant sees exactly what the caller sees.
    match state.db.trips.get(trip_id).await {
        Ok(trip) if trip.is_visible_to(&user.id, user.email.as_deref()) => {}
        Ok(_) => return Json(AssistantReply::fallback()),
        Err(e) => {
            log_degraded("chat", &e);
            return Json(AssistantReply::fallback());
        }
    }

    let items = match state.db.items.list(trip_id).await {
        Ok(items) => items,
        Err(e) => {
            log_degraded("chat_items", &e);
            Vec::new()
        }
    };

    let reply = bridge
        .chat(trip_id, &user.id, &items, body.message.trim())
        .await;
    Json(reply)
}

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    pub actions: Vec<AssistantAction>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub applied: usize,
}

/// Apply a confirmed action list. Nothing the assistant proposes touches the
/// list until it arrives here.
pub async fn confirm(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<ConfirmBody>,
) -> Json<ConfirmResponse> {
    let applied = apply_actions(&state.db.items, trip_id, &body.actions, &user).await;
    Json(ConfirmResponse { applied })
}

/// Drop the caller's conversation history for a trip, starting a fresh
/// thread.
pub async fn reset(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
) -> Json<ActionResponse> {
    if let Some(bridge) = &state.assistant {
        bridge.reset(trip_id, &user.id).await;
    }
    Json(ActionResponse::ok())
}

#[derive(Debug, Deserialize)]
pub struct ReminderBody {
    pub title: String,
    /// Local wall-clock start, "%Y-%m-%dT%H:%M".
    pub start: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create a one-hour calendar reminder for the trip. The caller supplies a
/// provider access token per request; nothing is stored.
pub async fn reminder(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(trip_id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ReminderBody>,
) -> Json<ActionResponse> {
    let Some(token) = headers
        .get(CALENDAR_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    else {
        return Json(ActionResponse::failed(
            "Connect your calendar to set reminders.",
        ));
    };

    let trip = match state.db.trips.get(trip_id).await {
        Ok(trip) => trip,
        Err(e) => {
            log_degraded("reminder", &e);
            return Json(ActionResponse::failed("Could not set reminder."));
        }
    };

    let summary = format!("{}: {}", trip.name, body.title.trim());
    let description = body.description.as_deref().unwrap_or("");
    let result = state
        .calendar
        .create_event(token, &summary, description, &body.start)
        .await;

    match result {
        Ok(link) => Json(ActionResponse::ok_with(format!(
            "Reminder set! View it here: {}",
            link
        ))),
        Err(e) => {
            log_degraded("reminder_create", &e);
            Json(ActionResponse::failed("Could not set reminder."))
        }
    }
}
