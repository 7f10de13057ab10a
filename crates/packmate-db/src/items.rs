//! Packing item repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use packmate_core::{
    defaults, display_timestamp, new_v7, CreateItemRequest, Error, PackingItem,
    PackingItemRepository, Result,
};

/// PostgreSQL implementation of PackingItemRepository.
#[derive(Clone)]
pub struct PgPackingItemRepository {
    pool: Pool<Postgres>,
}

impl PgPackingItemRepository {
    /// Create a new PgPackingItemRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const ITEM_COLUMNS: &str = "id, trip_id, text, category, is_completed, note, \
                            added_by_email, added_by_name, created_at_utc";

fn row_to_item(row: &PgRow) -> PackingItem {
    let created_at_utc = row.get("created_at_utc");
    PackingItem {
        id: row.get("id"),
        trip_id: row.get("trip_id"),
        text: row.get("text"),
        category: row.get("category"),
        is_completed: row.get("is_completed"),
        note: row.get("note"),
        added_by_email: row.get("added_by_email"),
        added_by_name: row.get("added_by_name"),
        created_at_utc,
        created_at_display: created_at_utc.map(display_timestamp),
    }
}

/// In-process fallback ordering: stable sort by creation time, missing
/// timestamps first. `Option<DateTime>` orders `None` before any `Some`.
pub fn sort_items_by_created(items: &mut [PackingItem]) {
    items.sort_by_key(|item| item.created_at_utc);
}

/// Split a bulk submission block into item labels: one per non-blank line,
/// trimmed, order preserved.
pub fn split_block(block: &str) -> Vec<&str> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

#[async_trait]
impl PackingItemRepository for PgPackingItemRepository {
    async fn list(&self, trip_id: Uuid) -> Result<Vec<PackingItem>> {
        let ordered = sqlx::query(&format!(
            "SELECT {} FROM packing_item WHERE trip_id = $1
             ORDER BY created_at_utc ASC NULLS FIRST, id ASC",
            ITEM_COLUMNS
        ))
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await;

        let items = match ordered {
            Ok(rows) => rows.iter().map(row_to_item).collect(),
            Err(e) => {
                // Fall back to an unordered fetch plus an in-process stable
                // sort, mirroring stores where the ordered query needs an
                // index that may be absent.
                warn!(
                    subsystem = "db",
                    component = "items",
                    op = "list",
                    trip_id = %trip_id,
                    error = %e,
                    "Ordered item query failed, falling back to unordered fetch"
                );
                let rows = sqlx::query(&format!(
                    "SELECT {} FROM packing_item WHERE trip_id = $1",
                    ITEM_COLUMNS
                ))
                .bind(trip_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

                let mut items: Vec<PackingItem> = rows.iter().map(row_to_item).collect();
                sort_items_by_created(&mut items);
                items
            }
        };

        debug!(
            subsystem = "db",
            component = "items",
            op = "list",
            trip_id = %trip_id,
            result_count = items.len(),
            "Listed packing items"
        );
        Ok(items)
    }

    async fn insert(&self, req: CreateItemRequest) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();
        let category = req
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(defaults::DEFAULT_ITEM_CATEGORY);

        sqlx::query(
            "INSERT INTO packing_item (id, trip_id, text, category, is_completed, note,
                                       added_by_email, added_by_name, created_at_utc)
             VALUES ($1, $2, $3, $4, FALSE, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(req.trip_id)
        .bind(&req.text)
        .bind(category)
        .bind(&req.note)
        .bind(&req.added_by_email)
        .bind(&req.added_by_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn insert_bulk(
        &self,
        trip_id: Uuid,
        block: &str,
        category: Option<&str>,
        added_by_email: Option<&str>,
        added_by_name: Option<&str>,
    ) -> Result<Vec<Uuid>> {
        let lines = split_block(block);
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let category = category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(defaults::DEFAULT_ITEM_CATEGORY);
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut ids = Vec::with_capacity(lines.len());

        for text in lines {
            let id = new_v7();
            sqlx::query(
                "INSERT INTO packing_item (id, trip_id, text, category, is_completed, note,
                                           added_by_email, added_by_name, created_at_utc)
                 VALUES ($1, $2, $3, $4, FALSE, NULL, $5, $6, $7)",
            )
            .bind(id)
            .bind(trip_id)
            .bind(text)
            .bind(category)
            .bind(added_by_email)
            .bind(added_by_name)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
            ids.push(id);
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "items",
            op = "insert_bulk",
            trip_id = %trip_id,
            result_count = ids.len(),
            "Bulk-inserted packing items"
        );
        Ok(ids)
    }

    async fn toggle(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE packing_item SET is_completed = NOT is_completed WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ItemNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM packing_item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ItemNotFound(id));
        }
        Ok(())
    }

    async fn delete_by_text(&self, trip_id: Uuid, text: &str) -> Result<bool> {
        // At most one row: the oldest exact match. Ordering by id as a
        // tiebreak keeps repeated labels deterministic.
        let result = sqlx::query(
            "DELETE FROM packing_item
             WHERE id = (
                 SELECT id FROM packing_item
                 WHERE trip_id = $1 AND text = $2
                 ORDER BY created_at_utc ASC NULLS FIRST, id ASC
                 LIMIT 1
             )",
        )
        .bind(trip_id)
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
