//! CLI command implementations.

pub mod migrate;
pub mod super_admin;

use thiserror::Error;
use tradepost_api::config::ConfigError;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] tradepost_api::config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("bootstrap error: {0}")]
    Bootstrap(#[from] tradepost_api::error::AppError),
}

/// Resolve the database URL, preferring the service-specific variable.
///
/// Loads `.env` if present, matching the server's behavior.
pub(crate) fn database_url() -> Result<String, CliError> {
    let _ = dotenvy::dotenv();

    std::env::var("TRADEPOST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| ConfigError::MissingEnvVar("TRADEPOST_DATABASE_URL".to_owned()).into())
}
