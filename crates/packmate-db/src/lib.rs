//! # packmate-db
//!
//! PostgreSQL database layer for packmate.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for trips, packing items, and private notes
//!
//! The repositories are plain structs over a shared pool, aggregated into
//! [`Database`] and injected into whatever needs them. There is no global
//! store handle; a failed connection surfaces as an error from
//! [`Database::connect`] instead of a silent disabled flag.
//!
//! ## Example
//!
//! ```rust,ignore
//! use packmate_core::{CreateTripRequest, TripRepository};
//! use packmate_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/packmate").await?;
//!
//!     let trip_id = db.trips.create(CreateTripRequest {
//!         user_id: "google-oauth2|1234".to_string(),
//!         owner_email: Some("me@example.com".to_string()),
//!         name: "Goa, March".to_string(),
//!         location: Some("Goa".to_string()),
//!         start_date: None,
//!         end_date: None,
//!     }).await?;
//!
//!     println!("Created trip: {}", trip_id);
//!     Ok(())
//! }
//! ```

pub mod items;
pub mod notes;
pub mod pool;
pub mod trips;

// Re-export core types
pub use packmate_core::*;

// Re-export repository implementations
pub use items::{sort_items_by_created, split_block, PgPackingItemRepository};
pub use notes::{parse_note_document, PgPrivateNoteRepository};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use trips::PgTripRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Trip repository for CRUD and sharing.
    pub trips: PgTripRepository,
    /// Packing item repository.
    pub items: PgPackingItemRepository,
    /// Per-user private note repository.
    pub private_notes: PgPrivateNoteRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            trips: PgTripRepository::new(pool.clone()),
            items: PgPackingItemRepository::new(pool.clone()),
            private_notes: PgPrivateNoteRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
