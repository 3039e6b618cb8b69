//! Database operations for the marketplace `PostgreSQL`.
//!
//! # Schema: `marketplace`
//!
//! ## Tables
//!
//! - `user` - Sellers and administrators (roles as a `TEXT[]`, favorites as a `UUID[]`)
//! - `item` - Listings with moderation status, images, and a generated search vector
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p tradepost-cli -- migrate
//! ```
//!
//! Queries use the runtime sqlx API (`query_as`/`QueryBuilder`) so the
//! workspace builds without a live database; rows are converted into domain
//! models with `TryFrom`, where stored enums and role strings are parsed.

pub mod items;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use items::{ItemChanges, ItemFilter, ItemRepository, QueryScope, TextQuery, TransitionError};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
