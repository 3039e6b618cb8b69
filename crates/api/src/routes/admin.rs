//! Admin route handlers: unfiltered dumps and role mutation.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use tradepost_core::{Pagination, Role, UserId};

use crate::db::{ItemFilter, ItemRepository, QueryScope, UserRepository};
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireSuperAdmin};
use crate::models::{ItemPayload, UserPayload};
use crate::response::ApiResponse;
use crate::routes::items::PageQuery;
use crate::state::AppState;

/// Every listing regardless of status, newest first.
pub async fn all_items(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page_params();
    let filter = ItemFilter::scoped(QueryScope::All);

    let (items, total) = ItemRepository::new(state.pool()).list(&filter, page).await?;

    let payloads: Vec<ItemPayload> = items.into_iter().map(ItemPayload::from).collect();

    Ok(Json(ApiResponse::paginated(
        "All items fetched successfully",
        payloads,
        Pagination::new(page, total),
    )))
}

/// Every user, newest first. Payloads never include credential material.
pub async fn all_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page_params();

    let (users, total) = UserRepository::new(state.pool()).list(page).await?;

    let payloads: Vec<UserPayload> = users.into_iter().map(UserPayload::from).collect();

    Ok(Json(ApiResponse::paginated(
        "All users fetched successfully",
        payloads,
        Pagination::new(page, total),
    )))
}

/// Grant the ADMIN role (idempotent set insert).
pub async fn make_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse> {
    UserRepository::new(state.pool())
        .grant_role(id, Role::Admin)
        .await?;

    tracing::info!(user_id = %id, granted_by = %admin.id, "admin role granted");

    Ok(Json(ApiResponse::message(
        "User role updated to admin successfully",
    )))
}

/// Revoke the ADMIN role; refuses to leave the user roleless.
pub async fn remove_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse> {
    UserRepository::new(state.pool())
        .revoke_role(id, Role::Admin)
        .await?;

    tracing::info!(user_id = %id, revoked_by = %admin.id, "admin role revoked");

    Ok(Json(ApiResponse::message(
        "User admin role removed successfully",
    )))
}
