//! Database migration command.
//!
//! Migration files live in `crates/api/migrations/` and are embedded at
//! compile time, so the binary carries everything it needs.
//!
//! # Environment Variables
//!
//! - `TRADEPOST_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use secrecy::SecretString;

use super::CliError;
use crate::commands::database_url;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = tradepost_api::db::create_pool(&SecretString::from(url)).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
