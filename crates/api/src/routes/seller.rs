//! Seller route handlers: own listings and favorites.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use tradepost_core::{ItemId, Pagination, Role};

use crate::authz::require_any_role;
use crate::db::{ItemFilter, ItemRepository, QueryScope, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::ItemPayload;
use crate::response::ApiResponse;
use crate::routes::items::PageQuery;
use crate::state::AppState;

/// The caller's own listings, any status, newest first.
pub async fn my_items(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    require_any_role(&user, &[Role::Seller])?;

    let page = query.page_params();
    let filter = ItemFilter::scoped(QueryScope::Seller(user.id));

    let (items, total) = ItemRepository::new(state.pool()).list(&filter, page).await?;

    let payloads: Vec<ItemPayload> = items.into_iter().map(ItemPayload::from).collect();

    Ok(Json(ApiResponse::paginated(
        "Your items fetched successfully",
        payloads,
        Pagination::new(page, total),
    )))
}

/// Resolve the caller's favorite references to listings.
pub async fn favorite_items(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    require_any_role(&user, &[Role::Seller])?;

    let account = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    let items = ItemRepository::new(state.pool())
        .get_many(&account.favorite_items)
        .await?;

    let payloads: Vec<ItemPayload> = items.into_iter().map(ItemPayload::from).collect();

    Ok(Json(ApiResponse::with_data(
        "Favorite items fetched successfully",
        payloads,
    )))
}

/// Add a listing to the caller's favorites (idempotent).
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<ItemId>,
) -> Result<impl IntoResponse> {
    require_any_role(&user, &[Role::Seller])?;

    // Favoriting a nonexistent listing is a caller error, not a silent no-op
    ItemRepository::new(state.pool())
        .get(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_owned()))?;

    UserRepository::new(state.pool())
        .add_favorite(user.id, item_id)
        .await?;

    Ok(Json(ApiResponse::message("Item added to favorites")))
}

/// Remove a listing from the caller's favorites (no-op when absent).
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<ItemId>,
) -> Result<impl IntoResponse> {
    require_any_role(&user, &[Role::Seller])?;

    UserRepository::new(state.pool())
        .remove_favorite(user.id, item_id)
        .await?;

    Ok(Json(ApiResponse::message("Item removed from favorites")))
}
