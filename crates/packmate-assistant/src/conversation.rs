//! In-memory conversation store.
//!
//! Histories are keyed per (trip, user): collaborators on one trip each get
//! their own thread, decoupled from any transport-level session. Writes are
//! last-write-wins per key: two tabs chatting as the same user on the same
//! trip can interleave and overwrite each other's stored history, matching
//! the store's contract.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use packmate_core::models::ConversationHistory;

/// Conversation histories for all active (trip, user) threads, capped per
/// entry at the history limit.
#[derive(Default)]
pub struct ConversationStore {
    histories: RwLock<HashMap<(Uuid, String), ConversationHistory>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the history for a thread. Unknown keys read as empty.
    pub async fn get(&self, trip_id: Uuid, user_id: &str) -> ConversationHistory {
        self.histories
            .read()
            .await
            .get(&(trip_id, user_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the stored history for a thread (last write wins).
    pub async fn put(&self, trip_id: Uuid, user_id: &str, history: ConversationHistory) {
        self.histories
            .write()
            .await
            .insert((trip_id, user_id.to_string()), history);
    }

    /// Drop a thread's history.
    pub async fn clear(&self, trip_id: Uuid, user_id: &str) {
        self.histories
            .write()
            .await
            .remove(&(trip_id, user_id.to_string()));
    }
}
