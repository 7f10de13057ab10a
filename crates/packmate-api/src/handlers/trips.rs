//! Trip HTTP handlers: listing, creation, detail, sharing, categories.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use packmate_core::{
    category_options, filter_by_contributor, group_by_category, CreateTripRequest, PackingItem,
    PackingItemRepository, Trip, TripRepository, TripSummary,
};

use crate::handlers::{log_degraded, ActionResponse};
use crate::auth::AuthUser;
use crate::AppState;

/// List every trip visible to the caller: owned plus shared, deduplicated.
pub async fn list_trips(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<Vec<TripSummary>> {
    match state
        .db
        .trips
        .list_for_user(&user.id, user.email.as_deref())
        .await
    {
        Ok(trips) => Json(trips),
        Err(e) => {
            log_degraded("list_trips", &e);
            Json(Vec::new())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTripBody {
    pub name: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn create_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateTripBody>,
) -> Json<ActionResponse> {
    if body.name.trim().is_empty() {
        // Blank required field: skip the operation rather than erroring.
        return Json(ActionResponse::failed("A trip needs a name."));
    }

    let req = CreateTripRequest {
        user_id: user.id,
        owner_email: user.email,
        name: body.name.trim().to_string(),
        location: body.location,
        start_date: body.start_date,
        end_date: body.end_date,
    };

    match state.db.trips.create(req).await {
        Ok(id) => Json(ActionResponse::ok_with(id.to_string())),
        Err(e) => {
            log_degraded("create_trip", &e);
            Json(ActionResponse::failed("Could not create trip."))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TripDetailQuery {
    /// Exact display-name filter over item attribution.
    pub contributor: Option<String>,
}

/// Trip detail view model: the trip, its items grouped by category, and the
/// category options for the add-item form.
#[derive(Debug, Serialize)]
pub struct TripDetail {
    pub trip: Trip,
    pub is_owner: bool,
    pub groups: Vec<CategoryGroup>,
    pub category_options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<PackingItem>,
}

pub async fn trip_detail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Query(query): Query<TripDetailQuery>,
) -> Result<Json<TripDetail>, StatusCode> {
    let trip = match state.db.trips.get(trip_id).await {
        Ok(trip) => trip,
        Err(e) => {
            log_degraded("trip_detail", &e);
            return Err(StatusCode::NOT_FOUND);
        }
    };

    if !trip.is_visible_to(&user.id, user.email.as_deref()) {
        return Err(StatusCode::NOT_FOUND);
    }

    // A failed item fetch renders an empty list, not an error page.
    let items = match state.db.items.list(trip_id).await {
        Ok(items) => items,
        Err(e) => {
            log_degraded("trip_detail_items", &e);
            Vec::new()
        }
    };

    let category_options = category_options(&trip, &items);
    let visible: Vec<PackingItem> = match &query.contributor {
        Some(name) => filter_by_contributor(&items, name)
            .into_iter()
            .cloned()
            .collect(),
        None => items,
    };

    let groups = group_by_category(&visible)
        .into_iter()
        .map(|(category, members)| CategoryGroup {
            category,
            items: members.into_iter().cloned().collect(),
        })
        .collect();

    let is_owner = trip.is_owned_by(&user.id);
    Ok(Json(TripDetail {
        trip,
        is_owner,
        groups,
        category_options,
    }))
}

pub async fn delete_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<Uuid>,
) -> Json<ActionResponse> {
    // Only the owner may delete. Items and private notes are left behind
    // deliberately (no cascade).
    match state.db.trips.get(trip_id).await {
        Ok(trip) if !trip.is_owned_by(&user.id) => {
            return Json(ActionResponse::failed("Only the owner can delete a trip."));
        }
        Ok(_) => {}
        Err(e) => {
            log_degraded("delete_trip", &e);
            return Json(ActionResponse::failed("Could not delete trip."));
        }
    }

    match state.db.trips.delete(trip_id).await {
        Ok(()) => Json(ActionResponse::ok()),
        Err(e) => {
            log_degraded("delete_trip", &e);
            Json(ActionResponse::failed("Could not delete trip."))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShareBody {
    pub email: String,
}

pub async fn share_trip(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<ShareBody>,
) -> Json<ActionResponse> {
    let email = body.email.trim();
    if email.is_empty() {
        return Json(ActionResponse::failed("An email is required to share."));
    }

    match state.db.trips.share(trip_id, email).await {
        Ok(()) => Json(ActionResponse::ok_with(format!(
            "Access granted to {}. They can now log in to see this trip!",
            email
        ))),
        Err(e) => {
            log_degraded("share_trip", &e);
            Json(ActionResponse::failed("Error sharing trip."))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: String,
}

pub async fn add_category(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<CategoryBody>,
) -> Json<ActionResponse> {
    let name = body.name.trim();
    if name.is_empty() {
        return Json(ActionResponse::failed("A category needs a name."));
    }

    match state.db.trips.add_category(trip_id, name).await {
        Ok(()) => Json(ActionResponse::ok()),
        Err(e) => {
            log_degraded("add_category", &e);
            Json(ActionResponse::failed("Could not add category."))
        }
    }
}

pub async fn remove_category(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<CategoryBody>,
) -> Json<ActionResponse> {
    match state.db.trips.remove_category(trip_id, body.name.trim()).await {
        Ok(()) => Json(ActionResponse::ok()),
        Err(e) => {
            log_degraded("remove_category", &e);
            Json(ActionResponse::failed("Could not remove category."))
        }
    }
}
