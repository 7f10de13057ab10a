//! Core traits for packmate abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// TRIP REPOSITORY
// =============================================================================

/// Request for creating a new trip.
#[derive(Debug, Clone)]
pub struct CreateTripRequest {
    /// Identity-provider subject id of the owner.
    pub user_id: String,
    pub owner_email: Option<String>,
    pub name: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Repository for trip CRUD and sharing operations.
#[async_trait]
pub trait TripRepository: Send + Sync {
    /// List the union of trips owned by `user_id` and trips shared with
    /// `email`, deduplicated by id, each tagged with the viewer's ownership.
    /// Full collection scan, no pagination.
    async fn list_for_user(&self, user_id: &str, email: Option<&str>) -> Result<Vec<TripSummary>>;

    /// Fetch a trip by id. A stored trip with no category list gets the
    /// default set backfilled in the returned value only; the stored row is
    /// not rewritten.
    async fn get(&self, id: Uuid) -> Result<Trip>;

    /// Create a trip seeded with the default category list.
    async fn create(&self, req: CreateTripRequest) -> Result<Uuid>;

    /// Delete a trip. Does not cascade to packing items or private notes.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Add a category name (set union; adding an existing name is a no-op).
    async fn add_category(&self, id: Uuid, category: &str) -> Result<()>;

    /// Remove a category name (set difference).
    async fn remove_category(&self, id: Uuid, category: &str) -> Result<()>;

    /// Idempotently add `email` to the trip's collaborator set.
    async fn share(&self, id: Uuid, email: &str) -> Result<()>;
}

// =============================================================================
// PACKING ITEM REPOSITORY
// =============================================================================

/// Request for creating a single packing item.
#[derive(Debug, Clone)]
pub struct CreateItemRequest {
    pub trip_id: Uuid,
    pub text: String,
    /// Defaults to "General" when absent. Not validated against the trip's
    /// category set.
    pub category: Option<String>,
    pub note: Option<String>,
    pub added_by_email: Option<String>,
    pub added_by_name: Option<String>,
}

/// Repository for packing item operations.
#[async_trait]
pub trait PackingItemRepository: Send + Sync {
    /// List a trip's items ordered by creation time (missing timestamps
    /// first), with display timestamps rendered.
    async fn list(&self, trip_id: Uuid) -> Result<Vec<PackingItem>>;

    /// Insert a single item.
    async fn insert(&self, req: CreateItemRequest) -> Result<Uuid>;

    /// Insert one item per non-blank line of `block`, in order, all with the
    /// same category and attribution, in a single transaction.
    async fn insert_bulk(
        &self,
        trip_id: Uuid,
        block: &str,
        category: Option<&str>,
        added_by_email: Option<&str>,
        added_by_name: Option<&str>,
    ) -> Result<Vec<Uuid>>;

    /// Flip an item's completion flag.
    async fn toggle(&self, id: Uuid) -> Result<()>;

    /// Delete an item by id.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Best-effort delete by exact label text within a trip: removes at most
    /// one item (the oldest match). Returns whether anything was deleted.
    /// Siblings with the same text are left intact.
    async fn delete_by_text(&self, trip_id: Uuid, text: &str) -> Result<bool>;
}

// =============================================================================
// PRIVATE NOTE REPOSITORY
// =============================================================================

/// Repository for per-user private notes. Strictly scoped to
/// (trip id, user id); other collaborators never see these.
#[async_trait]
pub trait PrivateNoteRepository: Send + Sync {
    /// Fetch the note list for a (trip, user). Legacy single-note documents
    /// are upgraded to a one-element list in the returned value. A missing
    /// document reads as an empty list.
    async fn get(&self, trip_id: Uuid, user_id: &str) -> Result<PrivateNote>;

    /// Append a new entry with a fresh id and a creation timestamp assigned
    /// at call time. Entries are never edited in place.
    async fn append(&self, trip_id: Uuid, user_id: &str, text: &str) -> Result<NoteEntry>;
}

// =============================================================================
// GENERATION BACKEND
// =============================================================================

/// Text generation backend for the assistant bridge.
///
/// One synchronous call per turn, no retry, no streaming. The bridge layers
/// its own JSON contract on top; this trait only promises text back.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model name for logging.
    fn model_name(&self) -> &str;
}
