//! One-shot startup bootstrap: ensure the super-admin account exists.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use tradepost_core::{Email, Role, RoleSet};

use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::models::NewUser;
use crate::services::hash_password;

/// Idempotently ensure exactly one super-admin account exists, keyed by the
/// configured email. A no-op when the account is already present; a
/// unique-violation race between concurrently starting processes is treated
/// as success, so running this twice never yields two accounts.
///
/// # Errors
///
/// Returns an error when the configured email is invalid or the database is
/// unreachable.
pub async fn ensure_super_admin(
    pool: &PgPool,
    super_admin_email: &str,
    super_admin_password: &SecretString,
) -> Result<(), AppError> {
    let email = Email::parse(super_admin_email)
        .map_err(|e| AppError::Validation(format!("SUPER_ADMIN_EMAIL: {e}")))?;

    let users = UserRepository::new(pool);

    if users.get_by_email(&email).await?.is_some() {
        tracing::info!("super admin already exists");
        return Ok(());
    }

    let password_hash = hash_password(super_admin_password.expose_secret())?;

    let roles = RoleSet::from_roles([Role::SuperAdmin, Role::Admin])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let new_user = NewUser {
        first_name: "Super".to_owned(),
        last_name: "Admin".to_owned(),
        address: None,
        phone: "0000000000".to_owned(),
        email,
        roles,
    };

    match users.create(&new_user, &password_hash).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "super admin created");
            Ok(())
        }
        // Lost a concurrent-startup race to another process: account exists
        Err(RepositoryError::Conflict(_)) => {
            tracing::info!("super admin already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
