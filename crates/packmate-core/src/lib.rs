//! # packmate-core
//!
//! Core types, traits, and abstractions for the packmate library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other packmate crates depend on: the trip/item/note models, the
//! collaboration rules, the repository traits, and the shared error type.

pub mod collaboration;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use collaboration::{category_options, filter_by_contributor, group_by_category};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;

/// Generate a time-ordered UUIDv7 for new store documents.
pub fn new_v7() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}
