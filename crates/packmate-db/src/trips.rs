//! Trip repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use packmate_core::{
    default_categories, new_v7, CreateTripRequest, Error, Result, Trip, TripRepository,
    TripSummary,
};

/// PostgreSQL implementation of TripRepository.
#[derive(Clone)]
pub struct PgTripRepository {
    pool: Pool<Postgres>,
}

impl PgTripRepository {
    /// Create a new PgTripRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM trip WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.is_some())
    }
}

const TRIP_COLUMNS: &str = "id, user_id, owner_email, name, location, start_date, end_date, \
                            categories, shared_with, created_at_utc";

/// Map a trip row, backfilling a missing category list with the defaults.
/// The stored row is never rewritten by a read. An empty list is a real
/// state (the user removed every category), not a missing one.
fn row_to_trip(row: &PgRow) -> Trip {
    let categories: Option<Vec<String>> = row.get("categories");
    let categories = categories.unwrap_or_else(default_categories);

    Trip {
        id: row.get("id"),
        user_id: row.get("user_id"),
        owner_email: row.get("owner_email"),
        name: row.get("name"),
        location: row.get("location"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        categories,
        shared_with: row.get("shared_with"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn list_for_user(&self, user_id: &str, email: Option<&str>) -> Result<Vec<TripSummary>> {
        // Two scans unioned in process, owner rows winning on id collisions.
        let owned = sqlx::query(&format!(
            "SELECT {} FROM trip WHERE user_id = $1",
            TRIP_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_id: HashMap<Uuid, TripSummary> = HashMap::new();
        for row in &owned {
            let trip = row_to_trip(row);
            by_id.insert(
                trip.id,
                TripSummary {
                    trip,
                    is_owner: true,
                },
            );
        }

        if let Some(email) = email {
            let shared = sqlx::query(&format!(
                "SELECT {} FROM trip WHERE $1 = ANY(shared_with)",
                TRIP_COLUMNS
            ))
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

            for row in &shared {
                let trip = row_to_trip(row);
                by_id.entry(trip.id).or_insert(TripSummary {
                    trip,
                    is_owner: false,
                });
            }
        }

        let mut trips: Vec<TripSummary> = by_id.into_values().collect();
        trips.sort_by(|a, b| b.trip.created_at_utc.cmp(&a.trip.created_at_utc));

        debug!(
            subsystem = "db",
            component = "trips",
            op = "list_for_user",
            result_count = trips.len(),
            "Listed trips"
        );
        Ok(trips)
    }

    async fn get(&self, id: Uuid) -> Result<Trip> {
        let row = sqlx::query(&format!("SELECT {} FROM trip WHERE id = $1", TRIP_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(|r| row_to_trip(&r)).ok_or(Error::TripNotFound(id))
    }

    async fn create(&self, req: CreateTripRequest) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO trip (id, user_id, owner_email, name, location, start_date, end_date,
                               categories, shared_with, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '{}', $9)",
        )
        .bind(id)
        .bind(&req.user_id)
        .bind(&req.owner_email)
        .bind(&req.name)
        .bind(&req.location)
        .bind(&req.start_date)
        .bind(&req.end_date)
        .bind(default_categories())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Deliberately no cascade: packing items and private notes outlive
        // the trip.
        let result = sqlx::query("DELETE FROM trip WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TripNotFound(id));
        }
        Ok(())
    }

    async fn add_category(&self, id: Uuid, category: &str) -> Result<()> {
        // Atomic set union: appending an existing name matches zero rows.
        let result = sqlx::query(
            "UPDATE trip
             SET categories = array_append(COALESCE(categories, '{}'), $2)
             WHERE id = $1 AND NOT ($2 = ANY(COALESCE(categories, '{}')))",
        )
        .bind(id)
        .bind(category)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 && !self.exists(id).await? {
            return Err(Error::TripNotFound(id));
        }
        Ok(())
    }

    async fn remove_category(&self, id: Uuid, category: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE trip SET categories = array_remove(categories, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(category)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TripNotFound(id));
        }
        Ok(())
    }

    async fn share(&self, id: Uuid, email: &str) -> Result<()> {
        // Idempotent: a second share with the same email matches zero rows
        // and leaves exactly one instance in the set.
        let result = sqlx::query(
            "UPDATE trip
             SET shared_with = array_append(shared_with, $2)
             WHERE id = $1 AND NOT ($2 = ANY(shared_with))",
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 && !self.exists(id).await? {
            return Err(Error::TripNotFound(id));
        }

        debug!(
            subsystem = "db",
            component = "trips",
            op = "share",
            trip_id = %id,
            "Share recorded"
        );
        Ok(())
    }
}
