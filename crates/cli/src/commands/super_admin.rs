//! Super-admin management command.
//!
//! Runs the same idempotent bootstrap routine the server executes at
//! startup, for operators who want the account in place before first deploy.
//!
//! # Environment Variables
//!
//! - `TRADEPOST_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SUPER_ADMIN_EMAIL` - Email of the super-admin account
//! - `SUPER_ADMIN_PASSWORD` - Password for the super-admin account

use secrecy::SecretString;
use tradepost_api::config::ConfigError;

use super::CliError;
use crate::commands::database_url;

/// Idempotently create the configured super-admin account.
///
/// # Errors
///
/// Returns an error if required variables are missing or the database is
/// unreachable.
pub async fn ensure() -> Result<(), CliError> {
    let url = database_url()?;

    let email = std::env::var("SUPER_ADMIN_EMAIL")
        .map_err(|_| ConfigError::MissingEnvVar("SUPER_ADMIN_EMAIL".to_owned()))?;
    let password = std::env::var("SUPER_ADMIN_PASSWORD")
        .map_err(|_| ConfigError::MissingEnvVar("SUPER_ADMIN_PASSWORD".to_owned()))?;

    let pool = tradepost_api::db::create_pool(&SecretString::from(url)).await?;

    tradepost_api::bootstrap::ensure_super_admin(
        &pool,
        &email,
        &SecretString::from(password),
    )
    .await?;

    tracing::info!("Super admin ensured");
    Ok(())
}
