//! User repository for database operations.
//!
//! Role and favorite mutations are single-statement atomic updates; there is
//! no load-mutate-save window for concurrent requests to race through.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tradepost_core::{Email, ItemId, PageParams, Role, RoleSet, UserId};

use super::RepositoryError;
use crate::models::{NewUser, User};

// =============================================================================
// Internal Row Types
// =============================================================================

const USER_COLUMNS: &str =
    "id, first_name, last_name, address, phone, email, roles, favorite_items, \
     created_at, updated_at";

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    address: Option<String>,
    phone: String,
    email: String,
    roles: Vec<String>,
    favorite_items: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let roles = RoleSet::parse(&row.roles).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role set in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            address: row.address,
            phone: row.phone,
            email,
            roles,
            favorite_items: row.favorite_items.into_iter().map(ItemId::new).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user with the given password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        new: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO marketplace.user \
             (first_name, last_name, address, phone, email, password_hash, roles) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.address)
            .bind(&new.phone)
            .bind(new.email.as_str())
            .bind(password_hash)
            .bind(new.roles.to_strings())
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("email already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.try_into()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM marketplace.user WHERE id = $1");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM marketplace.user WHERE email = $1");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash, for login verification.
    ///
    /// Returns `None` if no account matches the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct WithPassword {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM marketplace.user WHERE email = $1"
        );

        let row = sqlx::query_as::<_, WithPassword>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// List users newest-first with a total count (admin dump).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(&self, page: PageParams) -> Result<(Vec<User>, u64), RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM marketplace.user \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM marketplace.user")
            .fetch_one(self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((users, total.max(0).unsigned_abs()))
    }

    /// Grant a role to a user, atomically and idempotently.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn grant_role(&self, id: UserId, role: Role) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE marketplace.user \
             SET roles = CASE WHEN roles @> ARRAY[$2::text] THEN roles \
                              ELSE array_append(roles, $2::text) END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Revoke a role from a user, atomically; a no-op if the role is absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist, or
    /// `RepositoryError::Conflict` if removal would leave the user roleless.
    pub async fn revoke_role(&self, id: UserId, role: Role) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE marketplace.user \
             SET roles = array_remove(roles, $2::text), updated_at = now() \
             WHERE id = $1 AND cardinality(array_remove(roles, $2::text)) >= 1 \
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => r.try_into(),
            // The guard rejects both a missing user and an emptying removal;
            // a second lookup tells them apart.
            None => match self.get_by_id(id).await? {
                Some(_) => Err(RepositoryError::Conflict(
                    "user must retain at least one role".to_owned(),
                )),
                None => Err(RepositoryError::NotFound),
            },
        }
    }

    /// Add an item to a user's favorites, atomically and idempotently.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn add_favorite(
        &self,
        id: UserId,
        item_id: ItemId,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE marketplace.user \
             SET favorite_items = CASE WHEN favorite_items @> ARRAY[$2::uuid] THEN favorite_items \
                                       ELSE array_append(favorite_items, $2::uuid) END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(item_id)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Remove an item from a user's favorites; a no-op if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn remove_favorite(
        &self,
        id: UserId,
        item_id: ItemId,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE marketplace.user \
             SET favorite_items = array_remove(favorite_items, $2::uuid), updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(item_id)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            first_name: "Amal".to_owned(),
            last_name: "Perera".to_owned(),
            address: None,
            phone: "0712345678".to_owned(),
            email: "amal@example.com".to_owned(),
            roles: vec!["SELLER".to_owned(), "ADMIN".to_owned()],
            favorite_items: vec![Uuid::new_v4()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let row = sample_row();
        let id = row.id;
        let user: User = row.try_into().unwrap();
        assert_eq!(user.id.as_uuid(), id);
        assert!(user.roles.contains(Role::Seller));
        assert!(user.roles.contains(Role::Admin));
        assert_eq!(user.favorite_items.len(), 1);
    }

    #[test]
    fn test_row_conversion_rejects_unknown_role() {
        let mut row = sample_row();
        row.roles = vec!["MODERATOR".to_owned()];
        assert!(matches!(
            User::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_row_conversion_rejects_empty_roles() {
        let mut row = sample_row();
        row.roles = Vec::new();
        assert!(matches!(
            User::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
