//! Listing route handlers: creation, browsing, search, and lifecycle.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use tradepost_core::{
    Condition, ItemId, ItemStatus, PageParams, Pagination, Price, Role,
};

use crate::authz::{require_any_role, require_owner_or_admin};
use crate::db::{ItemChanges, ItemFilter, ItemRepository, QueryScope, TextQuery};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Item, ItemPayload, NewItem};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Roles admitted to the listing-mutation routes.
const LISTING_ROLES: &[Role] = &[Role::Seller, Role::Admin, Role::SuperAdmin];

/// Image list bounds on every listing.
const MAX_IMAGES: usize = 10;

// =============================================================================
// Query Types
// =============================================================================

/// Browse filters; pagination values are coerced, never rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub status: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub condition: Option<String>,
}

impl BrowseQuery {
    fn page_params(&self) -> PageParams {
        PageParams::from_raw(self.page.as_deref(), self.limit.as_deref())
    }

    /// Build the public filter. Unparseable optional filters are dropped
    /// rather than failing the request; the approved-only restriction comes
    /// from the scope, not from caller input.
    fn into_filter(self) -> ItemFilter {
        let mut filter = ItemFilter::scoped(QueryScope::Public);
        filter.category = self.category;
        filter.sub_category = self.sub_category;
        filter.status = self.status.and_then(|s| s.parse::<ItemStatus>().ok());
        filter.min_price = self.min_price.and_then(|p| p.parse::<Price>().ok());
        filter.max_price = self.max_price.and_then(|p| p.parse::<Price>().ok());
        filter.condition = self.condition.and_then(|c| c.parse::<Condition>().ok());
        filter
    }
}

/// Free-text search parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Bare pagination parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub(crate) fn page_params(&self) -> PageParams {
        PageParams::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

// =============================================================================
// Multipart form
// =============================================================================

/// Fields read from the multipart listing form (create and edit share it).
#[derive(Debug, Default)]
struct ListingForm {
    name: Option<String>,
    price: Option<String>,
    description: Option<String>,
    category: Option<String>,
    sub_category: Option<String>,
    location: Option<String>,
    condition: Option<String>,
    /// Existing image URLs the editor wants to keep, in order.
    existing_images: Vec<String>,
    /// Newly uploaded files as (name, bytes), in field order.
    files: Vec<(String, Vec<u8>)>,
}

async fn read_listing_form(mut multipart: Multipart) -> Result<ListingForm> {
    let mut form = ListingForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match name.as_str() {
            "images" => {
                let file_name = field
                    .file_name()
                    .map_or_else(|| "image".to_owned(), ToOwned::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
                form.files.push((file_name, bytes.to_vec()));
            }
            "existingImages" => {
                let url = read_text(field).await?;
                if !url.is_empty() {
                    form.existing_images.push(url);
                }
            }
            "itemName" => form.name = Some(read_text(field).await?),
            "itemPrice" => form.price = Some(read_text(field).await?),
            "itemDescription" => form.description = Some(read_text(field).await?),
            "itemCategory" => form.category = Some(read_text(field).await?),
            "itemSubCategory" => form.sub_category = Some(read_text(field).await?),
            "location" => form.location = Some(read_text(field).await?),
            "condition" => form.condition = Some(read_text(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map(|s| s.trim().to_owned())
        .map_err(|e| AppError::Validation(format!("Malformed form field: {e}")))
}

/// Validated non-image listing fields shared by create and edit.
struct ListingFields {
    name: String,
    price: Price,
    description: String,
    category: String,
    sub_category: String,
    location: Option<String>,
    condition: Option<Condition>,
}

fn validate_fields(state: &AppState, form: &ListingForm) -> Result<ListingFields> {
    let name = required(form.name.as_deref(), "itemName")?;
    let description = required(form.description.as_deref(), "itemDescription")?;
    let category = required(form.category.as_deref(), "itemCategory")?;
    let sub_category = required(form.sub_category.as_deref(), "itemSubCategory")?;

    let price = required(form.price.as_deref(), "itemPrice")?
        .parse::<Price>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .catalog()
        .validate(&category, &sub_category)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let condition = form
        .condition
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(str::parse::<Condition>)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(ListingFields {
        name,
        price,
        description,
        category,
        sub_category,
        location: form.location.clone().filter(|l| !l.is_empty()),
        condition,
    })
}

fn required(value: Option<&str>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(AppError::Validation(format!("{name} is required"))),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a listing. Always starts at `PENDING`, never approved.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    require_any_role(&user, LISTING_ROLES)?;

    let form = read_listing_form(multipart).await?;
    let fields = validate_fields(&state, &form)?;

    if form.files.is_empty() {
        return Err(AppError::Validation(
            "At least one image is required".to_owned(),
        ));
    }
    if form.files.len() > MAX_IMAGES {
        return Err(AppError::Validation(
            "Maximum 10 images allowed".to_owned(),
        ));
    }

    // Sequential uploads: the stored list order must match the input order.
    let images = state.storage().upload_all(form.files).await?;

    let new_item = NewItem {
        seller_id: user.id,
        name: fields.name,
        price: fields.price,
        description: fields.description,
        images,
        category: fields.category,
        sub_category: fields.sub_category,
        location: fields.location,
        condition: fields.condition,
    };

    let item = ItemRepository::new(state.pool()).create(&new_item).await?;

    tracing::info!(item_id = %item.id, seller_id = %user.id, "listing created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(
            "Item created successfully",
            ItemPayload::from(item),
        )),
    ))
}

/// Browse approved listings with filters and pagination.
pub async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page_params();
    let filter = query.into_filter();

    let (items, total) = ItemRepository::new(state.pool()).list(&filter, page).await?;

    Ok(Json(ApiResponse::paginated(
        "Items fetched successfully",
        payloads(items),
        Pagination::new(page, total),
    )))
}

/// Free-text search over approved listings.
///
/// The ranked/substring strategy is fixed at startup by configuration, so
/// the behavior is deterministic rather than fallback-driven.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let text = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query parameter is required".to_owned()))?
        .to_owned();

    let page = PageParams::from_raw(query.page.as_deref(), query.limit.as_deref());

    let mut filter = ItemFilter::scoped(QueryScope::Public);
    filter.text = Some(TextQuery {
        query: text,
        mode: state.config().text_search_mode,
    });

    let (items, total) = ItemRepository::new(state.pool()).list(&filter, page).await?;

    Ok(Json(ApiResponse::paginated(
        "Search results",
        payloads(items),
        Pagination::new(page, total),
    )))
}

/// Browse approved listings in one category/sub-category.
pub async fn by_category(
    State(state): State<AppState>,
    Path((category, sub_category)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page_params();

    let mut filter = ItemFilter::scoped(QueryScope::Public);
    filter.category = Some(category);
    filter.sub_category = Some(sub_category);

    let (items, total) = ItemRepository::new(state.pool()).list(&filter, page).await?;

    Ok(Json(ApiResponse::paginated(
        "Items fetched successfully",
        payloads(items),
        Pagination::new(page, total),
    )))
}

/// Fetch one listing and bump its view counter.
///
/// The increment is spawned fire-and-forget; a lost bump under concurrent
/// reads is acceptable and never delays the response.
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ItemId>,
) -> Result<impl IntoResponse> {
    require_any_role(&user, LISTING_ROLES)?;

    let item = ItemRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_owned()))?;

    let pool = state.pool().clone();
    tokio::spawn(async move {
        if let Err(e) = ItemRepository::new(&pool).increment_views(id).await {
            tracing::warn!(item_id = %id, error = %e, "view increment failed");
        }
    });

    Ok(Json(ApiResponse::with_data(
        "Item fetched successfully",
        ItemPayload::from(item),
    )))
}

/// Edit a listing. Never touches its status.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ItemId>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    require_any_role(&user, LISTING_ROLES)?;

    let repo = ItemRepository::new(state.pool());
    let item = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_owned()))?;

    require_owner_or_admin(&user, item.seller_id)?;

    let form = read_listing_form(multipart).await?;
    let fields = validate_fields(&state, &form)?;

    let images = merge_images(&form)?;
    if let Some(urls) = &images {
        let mut merged = urls.clone();
        if !form.files.is_empty() {
            let uploaded = state.storage().upload_all(form.files).await?;
            merged.extend(uploaded);
        }
        let changes = build_changes(fields, Some(merged));
        let updated = repo.update(id, &changes).await?;
        return Ok(Json(ApiResponse::with_data(
            "Item updated successfully",
            ItemPayload::from(updated),
        )));
    }

    let changes = build_changes(fields, None);
    let updated = repo.update(id, &changes).await?;

    Ok(Json(ApiResponse::with_data(
        "Item updated successfully",
        ItemPayload::from(updated),
    )))
}

/// Decide the kept-image list for an edit.
///
/// `None` means the request did not touch images at all; `Some(kept)` is the
/// kept list still awaiting any new uploads. The combined total is bounded
/// here so nothing is uploaded for a request that would fail anyway.
fn merge_images(form: &ListingForm) -> Result<Option<Vec<String>>> {
    if form.existing_images.is_empty() && form.files.is_empty() {
        return Ok(None);
    }

    let total = form.existing_images.len() + form.files.len();
    if total > MAX_IMAGES {
        return Err(AppError::Validation(
            "Maximum 10 images allowed".to_owned(),
        ));
    }

    Ok(Some(form.existing_images.clone()))
}

fn build_changes(fields: ListingFields, images: Option<Vec<String>>) -> ItemChanges {
    ItemChanges {
        name: fields.name,
        price: fields.price,
        description: fields.description,
        category: fields.category,
        sub_category: fields.sub_category,
        location: fields.location,
        condition: fields.condition,
        images,
    }
}

/// Delete a listing.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ItemId>,
) -> Result<impl IntoResponse> {
    require_any_role(&user, LISTING_ROLES)?;

    let repo = ItemRepository::new(state.pool());
    let item = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_owned()))?;

    require_owner_or_admin(&user, item.seller_id)?;

    repo.delete(id).await?;

    tracing::info!(item_id = %id, "listing deleted");

    Ok(Json(ApiResponse::message("Item deleted successfully")))
}

/// Approve a pending listing (moderation).
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ItemId>,
) -> Result<impl IntoResponse> {
    let item = ItemRepository::new(state.pool())
        .transition(id, ItemStatus::Approved)
        .await?;

    Ok(Json(ApiResponse::with_data(
        "Item approved successfully",
        ItemPayload::from(item),
    )))
}

/// Reject a pending listing (moderation). REJECTED is terminal.
pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ItemId>,
) -> Result<impl IntoResponse> {
    let item = ItemRepository::new(state.pool())
        .transition(id, ItemStatus::Rejected)
        .await?;

    Ok(Json(ApiResponse::with_data(
        "Item rejected",
        ItemPayload::from(item),
    )))
}

/// Complete a sale: APPROVED -> SOLD, anything else is an invalid state.
pub async fn sold(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ItemId>,
) -> Result<impl IntoResponse> {
    require_any_role(&user, LISTING_ROLES)?;

    let repo = ItemRepository::new(state.pool());
    let item = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_owned()))?;

    require_owner_or_admin(&user, item.seller_id)?;

    let updated = repo.transition(id, ItemStatus::Sold).await?;

    Ok(Json(ApiResponse::with_data(
        "Item marked as sold",
        ItemPayload::from(updated),
    )))
}

/// Dump the static category catalog.
pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(ApiResponse::with_data(
        "Categories fetched successfully",
        state.catalog().categories(),
    )))
}

fn payloads(items: Vec<Item>) -> Vec<ItemPayload> {
    items.into_iter().map(ItemPayload::from).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_query_coercion() {
        let query = BrowseQuery {
            page: Some("abc".to_owned()),
            limit: Some("0".to_owned()),
            ..BrowseQuery::default()
        };
        assert_eq!(query.page_params(), PageParams::default());
    }

    #[test]
    fn test_browse_filter_drops_unparseable_values() {
        let query = BrowseQuery {
            min_price: Some("cheap".to_owned()),
            max_price: Some("100".to_owned()),
            condition: Some("Slightly Scuffed".to_owned()),
            ..BrowseQuery::default()
        };
        let filter = query.into_filter();
        assert!(filter.min_price.is_none());
        assert_eq!(filter.max_price, Some("100".parse().unwrap()));
        assert!(filter.condition.is_none());
    }

    #[test]
    fn test_required_rejects_missing_and_blank() {
        assert!(required(None, "itemName").is_err());
        assert!(required(Some("   "), "itemName").is_err());
        assert_eq!(required(Some(" Bike "), "itemName").unwrap(), "Bike");
    }

    #[test]
    fn test_merge_images_untouched() {
        let form = ListingForm::default();
        assert_eq!(merge_images(&form).unwrap(), None);
    }

    #[test]
    fn test_merge_images_kept_only() {
        let form = ListingForm {
            existing_images: vec!["a".to_owned(), "b".to_owned()],
            ..ListingForm::default()
        };
        assert_eq!(
            merge_images(&form).unwrap(),
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
    }

    #[test]
    fn test_merge_images_over_limit() {
        let form = ListingForm {
            existing_images: (0..8).map(|i| i.to_string()).collect(),
            files: (0..3).map(|i| (i.to_string(), Vec::new())).collect(),
            ..ListingForm::default()
        };
        let err = merge_images(&form).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_merge_images_at_limit_passes() {
        let form = ListingForm {
            existing_images: (0..7).map(|i| i.to_string()).collect(),
            files: (0..3).map(|i| (i.to_string(), Vec::new())).collect(),
            ..ListingForm::default()
        };
        assert!(merge_images(&form).unwrap().is_some());
    }
}
