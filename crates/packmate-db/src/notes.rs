//! Private note repository implementation.
//!
//! One JSONB document per (trip, user): an ordered, append-only list of note
//! entries. Legacy documents written as a bare `{"content": ...}` object are
//! upgraded to a one-element list at read time without rewriting storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use packmate_core::{new_v7, Error, NoteEntry, PrivateNote, PrivateNoteRepository, Result};

/// PostgreSQL implementation of PrivateNoteRepository.
#[derive(Clone)]
pub struct PgPrivateNoteRepository {
    pool: Pool<Postgres>,
}

impl PgPrivateNoteRepository {
    /// Create a new PgPrivateNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Decode a stored note document, upgrading the legacy single-note shape.
///
/// Legacy documents carry a bare `content` string (and sometimes a
/// `created_at`); they become a one-element list. The synthesized entry id is
/// fresh per read since legacy documents never stored one. Entries that fail
/// to decode are dropped rather than failing the whole read.
pub fn parse_note_document(value: JsonValue) -> PrivateNote {
    match value {
        JsonValue::Array(raw) => PrivateNote {
            entries: raw
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect(),
        },
        JsonValue::Object(map) => {
            let content = map.get("content").and_then(JsonValue::as_str);
            match content {
                Some(text) => {
                    let created_at = map
                        .get("created_at")
                        .and_then(JsonValue::as_str)
                        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                    PrivateNote {
                        entries: vec![NoteEntry {
                            id: new_v7(),
                            text: text.to_string(),
                            created_at,
                        }],
                    }
                }
                None => PrivateNote::default(),
            }
        }
        _ => PrivateNote::default(),
    }
}

#[async_trait]
impl PrivateNoteRepository for PgPrivateNoteRepository {
    async fn get(&self, trip_id: Uuid, user_id: &str) -> Result<PrivateNote> {
        let row = sqlx::query(
            "SELECT entries FROM private_note WHERE trip_id = $1 AND user_id = $2",
        )
        .bind(trip_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(match row {
            Some(row) => parse_note_document(row.get::<JsonValue, _>("entries")),
            None => PrivateNote::default(),
        })
    }

    async fn append(&self, trip_id: Uuid, user_id: &str, text: &str) -> Result<NoteEntry> {
        let entry = NoteEntry {
            id: new_v7(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let entry_json = serde_json::to_value(&entry)?;

        // Single-statement append keeps two collaborating tabs from losing
        // each other's entries. A legacy object document is wrapped into a
        // list on first write.
        sqlx::query(
            "INSERT INTO private_note (trip_id, user_id, entries)
             VALUES ($1, $2, jsonb_build_array($3::jsonb))
             ON CONFLICT (trip_id, user_id) DO UPDATE
             SET entries = CASE
                 WHEN jsonb_typeof(private_note.entries) = 'array' THEN private_note.entries
                 ELSE jsonb_build_array(private_note.entries)
             END || EXCLUDED.entries",
        )
        .bind(trip_id)
        .bind(user_id)
        .bind(&entry_json)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "append",
            trip_id = %trip_id,
            "Appended private note entry"
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_entry_list() {
        let doc = json!([
            {"id": Uuid::nil(), "text": "remember sunscreen", "created_at": "2026-03-01T08:00:00Z"},
            {"id": Uuid::nil(), "text": "buy adapter", "created_at": "2026-03-02T08:00:00Z"}
        ]);
        let note = parse_note_document(doc);
        assert_eq!(note.entries.len(), 2);
        assert_eq!(note.entries[0].text, "remember sunscreen");
        assert_eq!(note.entries[1].text, "buy adapter");
    }

    #[test]
    fn test_legacy_single_note_upgrades_to_one_element_list() {
        let doc = json!({"content": "old style note"});
        let note = parse_note_document(doc);
        assert_eq!(note.entries.len(), 1);
        assert_eq!(note.entries[0].text, "old style note");
        assert_eq!(note.entries[0].created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_legacy_note_keeps_its_timestamp() {
        let doc = json!({"content": "dated", "created_at": "2026-03-01T08:00:00Z"});
        let note = parse_note_document(doc);
        assert_eq!(
            note.entries[0].created_at,
            "2026-03-01T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_unrecognized_document_reads_empty() {
        assert_eq!(parse_note_document(json!("just a string")), PrivateNote::default());
        assert_eq!(parse_note_document(json!({"other": 1})), PrivateNote::default());
    }

    #[test]
    fn test_undecodable_entries_are_dropped() {
        let doc = json!([
            {"id": Uuid::nil(), "text": "good", "created_at": "2026-03-01T08:00:00Z"},
            {"text": "missing fields"}
        ]);
        let note = parse_note_document(doc);
        assert_eq!(note.entries.len(), 1);
        assert_eq!(note.entries[0].text, "good");
    }
}
