//! Listing repository: CRUD, lifecycle transitions, and catalog queries.
//!
//! Filtered queries are composed with `QueryBuilder`; the page and its total
//! count are two round-trips over the same filter, with no snapshot isolation
//! between them. Lifecycle transitions are single guarded UPDATEs so a
//! concurrent request can never observe a half-applied transition.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use tradepost_core::{Condition, ItemId, ItemStatus, PageParams, Price, UserId};

use super::RepositoryError;
use crate::config::TextSearchMode;
use crate::models::{Item, NewItem};

// =============================================================================
// Internal Row Types
// =============================================================================

const ITEM_COLUMNS: &str =
    "id, seller_id, item_name, item_price, item_description, item_images, \
     item_category, item_sub_category, location, condition, status, views, \
     created_at, updated_at";

/// Internal row type for `PostgreSQL` item queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    seller_id: Uuid,
    item_name: String,
    item_price: Decimal,
    item_description: String,
    item_images: Vec<String>,
    item_category: String,
    item_sub_category: String,
    location: Option<String>,
    condition: Option<String>,
    status: String,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::try_from(row.item_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        let status = row.status.parse::<ItemStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
        })?;

        let condition = row
            .condition
            .map(|c| c.parse::<Condition>())
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid condition in database: {e}"))
            })?;

        Ok(Self {
            id: ItemId::new(row.id),
            seller_id: UserId::new(row.seller_id),
            name: row.item_name,
            price,
            description: row.item_description,
            images: row.item_images,
            category: row.item_category,
            sub_category: row.item_sub_category,
            location: row.location,
            condition,
            status,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Who is asking, and therefore which rows are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// Anonymous catalog browsing: pinned to approved listings. A
    /// caller-supplied status filter cannot widen this.
    Public,
    /// Admin dumps: every row.
    All,
    /// A seller's own listings, any status.
    Seller(UserId),
}

/// A free-text query with the strategy chosen at startup.
#[derive(Debug, Clone)]
pub struct TextQuery {
    pub query: String,
    pub mode: TextSearchMode,
}

/// Composable filter set for catalog queries.
#[derive(Debug, Clone)]
pub struct ItemFilter {
    scope: QueryScope,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub status: Option<ItemStatus>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub condition: Option<Condition>,
    pub text: Option<TextQuery>,
}

impl ItemFilter {
    /// A filter over the given scope with no further restrictions.
    #[must_use]
    pub const fn scoped(scope: QueryScope) -> Self {
        Self {
            scope,
            category: None,
            sub_category: None,
            status: None,
            min_price: None,
            max_price: None,
            condition: None,
            text: None,
        }
    }

    /// The status condition that actually applies.
    ///
    /// Public queries are pinned to `APPROVED` regardless of the
    /// caller-supplied filter.
    fn effective_status(&self) -> Option<ItemStatus> {
        match self.scope {
            QueryScope::Public => Some(ItemStatus::Approved),
            QueryScope::All | QueryScope::Seller(_) => self.status,
        }
    }

    /// Append the WHERE clause for this filter.
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let QueryScope::Seller(seller_id) = self.scope {
            qb.push(" AND seller_id = ").push_bind(seller_id);
        }

        if let Some(status) = self.effective_status() {
            qb.push(" AND status = ").push_bind(status.as_str());
        }

        if let Some(category) = &self.category {
            qb.push(" AND item_category = ").push_bind(category.clone());
        }

        if let Some(sub_category) = &self.sub_category {
            qb.push(" AND item_sub_category = ")
                .push_bind(sub_category.clone());
        }

        if let Some(min_price) = self.min_price {
            qb.push(" AND item_price >= ").push_bind(min_price);
        }

        if let Some(max_price) = self.max_price {
            qb.push(" AND item_price <= ").push_bind(max_price);
        }

        if let Some(condition) = self.condition {
            qb.push(" AND condition = ").push_bind(condition.as_str());
        }

        if let Some(text) = &self.text {
            match text.mode {
                TextSearchMode::Ranked => {
                    qb.push(" AND search_tsv @@ websearch_to_tsquery('english', ")
                        .push_bind(text.query.clone())
                        .push(")");
                }
                TextSearchMode::Substring => {
                    let pattern = like_pattern(&text.query);
                    qb.push(" AND (item_name ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR item_description ILIKE ")
                        .push_bind(pattern)
                        .push(")");
                }
            }
        }
    }

    /// Append the ORDER BY clause: relevance for ranked text queries,
    /// recency otherwise.
    fn push_order(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match &self.text {
            Some(text) if text.mode == TextSearchMode::Ranked => {
                qb.push(" ORDER BY ts_rank(search_tsv, websearch_to_tsquery('english', ")
                    .push_bind(text.query.clone())
                    .push(")) DESC, created_at DESC");
            }
            _ => {
                qb.push(" ORDER BY created_at DESC");
            }
        }
    }
}

/// Escape LIKE metacharacters and wrap in wildcards.
fn like_pattern(query: &str) -> String {
    let escaped: String = query
        .chars()
        .flat_map(|c| match c {
            '%' | '_' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect();
    format!("%{escaped}%")
}

// =============================================================================
// Lifecycle transitions
// =============================================================================

/// Errors from a lifecycle transition attempt.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("item not found")]
    NotFound,

    /// The item exists but its current state does not permit the transition.
    #[error("cannot transition a {current} item to {target}")]
    InvalidState {
        current: ItemStatus,
        target: ItemStatus,
    },
}

/// Mutable listing fields for an edit.
///
/// `images` is `None` when the request supplied no image changes at all, in
/// which case the stored list is kept.
#[derive(Debug, Clone)]
pub struct ItemChanges {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub sub_category: String,
    pub location: Option<String>,
    pub condition: Option<Condition>,
    pub images: Option<Vec<String>>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for listing database operations.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a listing. Status always starts at `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including the
    /// image-count CHECK, which the handlers validate beforehand).
    pub async fn create(&self, new: &NewItem) -> Result<Item, RepositoryError> {
        let sql = format!(
            "INSERT INTO marketplace.item \
             (seller_id, item_name, item_price, item_description, item_images, \
              item_category, item_sub_category, location, condition, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ITEM_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(new.seller_id)
            .bind(&new.name)
            .bind(new.price)
            .bind(&new.description)
            .bind(&new.images)
            .bind(&new.category)
            .bind(&new.sub_category)
            .bind(&new.location)
            .bind(new.condition.map(Condition::as_str))
            .bind(ItemStatus::Pending.as_str())
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Get a listing by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM marketplace.item WHERE id = $1");

        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get several listings by ID, newest first (favorites resolution).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM marketplace.item \
             WHERE id = ANY($1) ORDER BY created_at DESC"
        );

        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(uuids)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Update a listing's mutable fields. Never touches `status` or `views`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing doesn't exist.
    pub async fn update(&self, id: ItemId, changes: &ItemChanges) -> Result<Item, RepositoryError> {
        let sql = format!(
            "UPDATE marketplace.item SET \
             item_name = $2, item_price = $3, item_description = $4, \
             item_category = $5, item_sub_category = $6, location = $7, \
             condition = $8, item_images = COALESCE($9, item_images), \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {ITEM_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(changes.price)
            .bind(&changes.description)
            .bind(&changes.category)
            .bind(&changes.sub_category)
            .bind(&changes.location)
            .bind(changes.condition.map(Condition::as_str))
            .bind(&changes.images)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a listing. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM marketplace.item WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Perform a lifecycle transition as one guarded UPDATE.
    ///
    /// The row is only touched when its current status is a legal source for
    /// `target` under the state machine, so the status can never be observed
    /// half-transitioned and an illegal call leaves the item unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotFound`] if the listing doesn't exist and
    /// [`TransitionError::InvalidState`] if its current state does not permit
    /// the transition.
    pub async fn transition(
        &self,
        id: ItemId,
        target: ItemStatus,
    ) -> Result<Item, TransitionError> {
        let sources: Vec<String> = ItemStatus::ALL
            .iter()
            .filter(|source| source.can_transition_to(target))
            .map(|source| source.as_str().to_owned())
            .collect();

        let sql = format!(
            "UPDATE marketplace.item SET status = $2, updated_at = now() \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING {ITEM_COLUMNS}"
        );

        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .bind(target.as_str())
            .bind(sources)
            .fetch_optional(self.pool)
            .await
            .map_err(RepositoryError::from)?;

        if let Some(row) = row {
            return Ok(row.try_into()?);
        }

        // Guarded update matched nothing: absent row or illegal source state.
        match self.get(id).await? {
            Some(item) => Err(TransitionError::InvalidState {
                current: item.status,
                target,
            }),
            None => Err(TransitionError::NotFound),
        }
    }

    /// Fire-and-forget view counter bump; lost updates are acceptable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn increment_views(&self, id: ItemId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE marketplace.item SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Run a filtered, paginated catalog query; returns the page and the
    /// total count over the same filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        filter: &ItemFilter,
        page: PageParams,
    ) -> Result<(Vec<Item>, u64), RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM marketplace.item"));
        filter.push_conditions(&mut qb);
        filter.push_order(&mut qb);
        qb.push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM marketplace.item");
        filter.push_conditions(&mut count_qb);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total.max(0).unsigned_abs()))
    }

    /// Store the embedding vector for a listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing doesn't exist.
    pub async fn set_embedding(
        &self,
        id: ItemId,
        embedding: &[f32],
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE marketplace.item SET embedding = $2 WHERE id = $1")
            .bind(id)
            .bind(embedding)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Listings that have no embedding yet, oldest first (backfill order).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn missing_embedding(&self, limit: i64) -> Result<Vec<Item>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM marketplace.item \
             WHERE embedding IS NULL ORDER BY created_at ASC LIMIT $1"
        );

        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Approved listings together with their embeddings (AI search corpus).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn approved_with_embeddings(
        &self,
        limit: i64,
    ) -> Result<Vec<(Item, Vec<f32>)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct WithEmbedding {
            #[sqlx(flatten)]
            item: ItemRow,
            embedding: Vec<f32>,
        }

        let sql = format!(
            "SELECT {ITEM_COLUMNS}, embedding FROM marketplace.item \
             WHERE status = $1 AND embedding IS NOT NULL \
             ORDER BY created_at DESC LIMIT $2"
        );

        let rows = sqlx::query_as::<_, WithEmbedding>(&sql)
            .bind(ItemStatus::Approved.as_str())
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter()
            .map(|r| Ok((r.item.try_into()?, r.embedding)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn built_sql(filter: &ItemFilter) -> String {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 FROM marketplace.item");
        filter.push_conditions(&mut qb);
        filter.push_order(&mut qb);
        qb.sql().to_owned()
    }

    #[test]
    fn test_public_scope_pins_approved() {
        let filter = ItemFilter::scoped(QueryScope::Public);
        assert!(built_sql(&filter).contains("status = "));
    }

    #[test]
    fn test_public_scope_ignores_caller_status() {
        // A caller-supplied status cannot widen the public restriction:
        // exactly one status condition is emitted.
        let mut filter = ItemFilter::scoped(QueryScope::Public);
        filter.status = Some(ItemStatus::Pending);
        assert_eq!(filter.effective_status(), Some(ItemStatus::Approved));
        assert_eq!(built_sql(&filter).matches("status = ").count(), 1);
    }

    #[test]
    fn test_admin_scope_has_no_status_pin() {
        let filter = ItemFilter::scoped(QueryScope::All);
        assert_eq!(filter.effective_status(), None);
        assert!(!built_sql(&filter).contains("status = "));
    }

    #[test]
    fn test_seller_scope_filters_by_seller() {
        let filter = ItemFilter::scoped(QueryScope::Seller(UserId::generate()));
        let sql = built_sql(&filter);
        assert!(sql.contains("seller_id = "));
        assert!(!sql.contains("status = "));
    }

    #[test]
    fn test_price_range_conditions() {
        let mut filter = ItemFilter::scoped(QueryScope::Public);
        filter.min_price = Some("10".parse().unwrap());
        filter.max_price = Some("20".parse().unwrap());
        let sql = built_sql(&filter);
        assert!(sql.contains("item_price >= "));
        assert!(sql.contains("item_price <= "));
    }

    #[test]
    fn test_ranked_text_orders_by_rank() {
        let mut filter = ItemFilter::scoped(QueryScope::Public);
        filter.text = Some(TextQuery {
            query: "mountain bike".to_owned(),
            mode: TextSearchMode::Ranked,
        });
        let sql = built_sql(&filter);
        assert!(sql.contains("websearch_to_tsquery"));
        assert!(sql.contains("ORDER BY ts_rank"));
    }

    #[test]
    fn test_substring_text_orders_by_recency() {
        let mut filter = ItemFilter::scoped(QueryScope::Public);
        filter.text = Some(TextQuery {
            query: "bike".to_owned(),
            mode: TextSearchMode::Substring,
        });
        let sql = built_sql(&filter);
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("ORDER BY created_at DESC"));
        assert!(!sql.contains("ts_rank"));
    }

    #[test]
    fn test_no_text_orders_by_recency() {
        let filter = ItemFilter::scoped(QueryScope::All);
        assert!(built_sql(&filter).ends_with("ORDER BY created_at DESC"));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern("bike"), "%bike%");
    }

    #[test]
    fn test_row_conversion_rejects_bad_status() {
        let row = ItemRow {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            item_name: "x".to_owned(),
            item_price: Decimal::ONE,
            item_description: "y".to_owned(),
            item_images: vec!["u".to_owned()],
            item_category: "Vehicles".to_owned(),
            item_sub_category: "Cars".to_owned(),
            location: None,
            condition: None,
            status: "LIMBO".to_owned(),
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(
            Item::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
