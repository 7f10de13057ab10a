//! Core data models for packmate.
//!
//! These types are shared across all packmate crates and represent the core
//! domain entities: trips, packing items, private notes, and the assistant
//! conversation types.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// TRIP TYPES
// =============================================================================

/// A named collection of packing items and collaborators, owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    /// Identity-provider subject id of the owner. Set at creation, immutable.
    pub user_id: String,
    pub owner_email: Option<String>,
    pub name: String,
    pub location: Option<String>,
    /// Free-text dates as entered by the user.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Ordered category set. Append/remove only, no duplicates.
    pub categories: Vec<String>,
    /// Collaborator emails. Grows via share, never shrinks automatically.
    pub shared_with: Vec<String>,
    pub created_at_utc: DateTime<Utc>,
}

impl Trip {
    /// True iff `user_id` matches the stored owner.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// A trip is visible to its owner and to every email in its share set.
    pub fn is_visible_to(&self, user_id: &str, email: Option<&str>) -> bool {
        if self.is_owned_by(user_id) {
            return true;
        }
        match email {
            Some(email) => self.shared_with.iter().any(|e| e == email),
            None => false,
        }
    }
}

/// A trip tagged with the viewer's ownership flag, as returned by list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSummary {
    #[serde(flatten)]
    pub trip: Trip,
    pub is_owner: bool,
}

/// The default category list seeded onto new trips and backfilled onto trips
/// stored without one.
pub fn default_categories() -> Vec<String> {
    defaults::DEFAULT_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

// =============================================================================
// PACKING ITEM TYPES
// =============================================================================

/// A single pack entry belonging to a trip.
///
/// `trip_id` is a foreign reference, not an ownership edge: deleting a trip
/// does not cascade to its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingItem {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub text: String,
    pub category: String,
    pub is_completed: bool,
    pub note: Option<String>,
    /// Attribution of the creator, when known.
    pub added_by_email: Option<String>,
    pub added_by_name: Option<String>,
    /// Server-assigned creation time. Missing timestamps sort smallest.
    pub created_at_utc: Option<DateTime<Utc>>,
    /// Rendered display string at the fixed UTC+5:30 offset. Presentation
    /// only; the raw timestamp above is authoritative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_display: Option<String>,
}

/// Render a UTC timestamp into the fixed-offset display string.
pub fn display_timestamp(ts: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(defaults::DISPLAY_OFFSET_SECS)
        .expect("display offset is within range");
    ts.with_timezone(&offset)
        .format(defaults::DISPLAY_TIME_FORMAT)
        .to_string()
}

// =============================================================================
// PRIVATE NOTE TYPES
// =============================================================================

/// One entry in a user's private note list for a trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteEntry {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// The per-(trip, user) private note document: an ordered, append-only list
/// of entries. Invisible to other collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrivateNote {
    pub entries: Vec<NoteEntry>,
}

// =============================================================================
// ASSISTANT TYPES
// =============================================================================

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of an assistant conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Ordered conversation history, capped at the most recent
/// [`defaults::HISTORY_CAP`] turns to bound prompt size.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationHistory {
    turns: Vec<ChatTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, discarding the oldest once the cap is exceeded.
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
        if self.turns.len() > defaults::HISTORY_CAP {
            let excess = self.turns.len() - defaults::HISTORY_CAP;
            self.turns.drain(..excess);
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Kind of a proposed assistant action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Add,
    Delete,
}

/// A structured list mutation proposed by the assistant, applied only after
/// explicit user confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Parsed assistant reply: free-text answer plus zero or more proposed
/// actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantReply {
    pub reply: String,
    #[serde(default)]
    pub actions: Vec<AssistantAction>,
}

impl AssistantReply {
    /// The fixed payload substituted for any generation or parse failure.
    pub fn fallback() -> Self {
        Self {
            reply: defaults::FALLBACK_REPLY.to_string(),
            actions: Vec::new(),
        }
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// The identity fields this system consumes from the external provider:
/// a stable subject id, an email, and a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(owner: &str, shared: &[&str]) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            user_id: owner.to_string(),
            owner_email: None,
            name: "Goa".to_string(),
            location: Some("Goa".to_string()),
            start_date: None,
            end_date: None,
            categories: default_categories(),
            shared_with: shared.iter().map(|s| s.to_string()).collect(),
            created_at_utc: Utc::now(),
        }
    }

    #[test]
    fn test_owner_visibility() {
        let t = trip("sub-1", &[]);
        assert!(t.is_owned_by("sub-1"));
        assert!(t.is_visible_to("sub-1", None));
        assert!(!t.is_visible_to("sub-2", None));
    }

    #[test]
    fn test_collaborator_visibility() {
        let t = trip("sub-1", &["friend@example.com"]);
        assert!(t.is_visible_to("sub-2", Some("friend@example.com")));
        assert!(!t.is_visible_to("sub-2", Some("stranger@example.com")));
        assert!(!t.is_owned_by("sub-2"));
    }

    #[test]
    fn test_default_categories_seed() {
        let cats = default_categories();
        assert_eq!(
            cats,
            vec!["General", "Clothing", "Toiletries", "Electronics", "Documents"]
        );
    }

    #[test]
    fn test_history_cap_drops_oldest_first() {
        let mut history = ConversationHistory::new();
        for i in 0..30 {
            history.push(ChatTurn::user(format!("msg {}", i)));
        }
        assert_eq!(history.len(), defaults::HISTORY_CAP);
        assert_eq!(history.turns()[0].text, "msg 10");
        assert_eq!(history.turns()[19].text, "msg 29");
    }

    #[test]
    fn test_history_under_cap_keeps_everything() {
        let mut history = ConversationHistory::new();
        history.push(ChatTurn::user("hello"));
        history.push(ChatTurn::model("hi"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.turns()[0].role, ChatRole::User);
        assert_eq!(history.turns()[1].role, ChatRole::Model);
    }

    #[test]
    fn test_action_serde_uses_type_field() {
        let action: AssistantAction =
            serde_json::from_str(r#"{"type": "add", "item": "Sunscreen", "category": "Toiletries"}"#)
                .unwrap();
        assert_eq!(action.kind, ActionKind::Add);
        assert_eq!(action.item, "Sunscreen");
        assert_eq!(action.category.as_deref(), Some("Toiletries"));
        assert_eq!(action.note, None);

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "add");
    }

    #[test]
    fn test_reply_actions_default_to_empty() {
        let reply: AssistantReply = serde_json::from_str(r#"{"reply": "ok"}"#).unwrap();
        assert!(reply.actions.is_empty());
    }

    #[test]
    fn test_fallback_reply() {
        let fallback = AssistantReply::fallback();
        assert_eq!(fallback.reply, defaults::FALLBACK_REPLY);
        assert!(fallback.actions.is_empty());
    }

    #[test]
    fn test_display_timestamp_fixed_offset() {
        use chrono::TimeZone;
        // 2026-01-15 12:00 UTC is 17:30 IST.
        let ts = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let rendered = display_timestamp(ts);
        assert_eq!(rendered, "15 Jan 2026, 05:30 PM");
    }
}
