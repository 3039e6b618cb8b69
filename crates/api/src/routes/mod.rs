//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check (in main.rs)
//! GET  /health/ready                    - Readiness check (in main.rs)
//!
//! # Auth (public)
//! POST /api/v1/auth/register            - Create SELLER account
//! POST /api/v1/auth/login               - Issue access + refresh tokens
//!
//! # Items
//! POST   /api/v1/item/add               - Create listing (multipart, <=10 images) [SELLER/ADMIN/SUPER_ADMIN]
//! GET    /api/v1/item/all               - Browse approved listings, filtered + paginated
//! GET    /api/v1/item/categories        - Static category catalog
//! GET    /api/v1/item/                  - Free-text search (?q=) over approved listings
//! GET    /api/v1/item/{id}              - Fetch one listing, bump view counter [authenticated]
//! GET    /api/v1/item/{category}/{subCategory} - Approved listings for a category
//! PUT    /api/v1/item/update/{id}       - Edit listing [owner or admin]
//! DELETE /api/v1/item/delete/{id}       - Delete listing [owner or admin]
//! PUT    /api/v1/item/approve/{id}      - PENDING -> APPROVED [ADMIN/SUPER_ADMIN]
//! PUT    /api/v1/item/reject/{id}       - PENDING -> REJECTED [ADMIN/SUPER_ADMIN]
//! PUT    /api/v1/item/sold/{id}         - APPROVED -> SOLD [owner or admin]
//!
//! # Seller (requires SELLER)
//! GET    /api/v1/seller/my-items        - Caller's listings, any status
//! GET    /api/v1/seller/favorite-items  - Resolve favorites to listings
//! POST   /api/v1/seller/favorite-item/{itemId} - Add favorite
//! DELETE /api/v1/seller/favorite-item/{itemId} - Remove favorite
//!
//! # Admin
//! GET /api/v1/admin/items               - Unfiltered listing dump [ADMIN]
//! GET /api/v1/admin/users               - Unfiltered user dump [ADMIN]
//! PUT /api/v1/admin/make-admin/{id}     - Grant ADMIN [SUPER_ADMIN]
//! PUT /api/v1/admin/remove-admin/{id}   - Revoke ADMIN [SUPER_ADMIN]
//!
//! # AI search
//! POST /api/v1/ask/search               - Natural-language search over approved listings
//! GET  /api/v1/ask/generate-item-embedding - Backfill listing embeddings [ADMIN]
//! ```

pub mod admin;
pub mod ask;
pub mod auth;
pub mod items;
pub mod seller;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(items::add))
        .route("/all", get(items::browse))
        .route("/categories", get(items::categories))
        .route("/update/{id}", put(items::update))
        .route("/delete/{id}", delete(items::remove))
        .route("/approve/{id}", put(items::approve))
        .route("/reject/{id}", put(items::reject))
        .route("/sold/{id}", put(items::sold))
        .route("/", get(items::search))
        .route("/{id}", get(items::get_by_id))
        .route("/{category}/{sub_category}", get(items::by_category))
}

/// Create the seller routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/my-items", get(seller::my_items))
        .route("/favorite-items", get(seller::favorite_items))
        .route(
            "/favorite-item/{item_id}",
            post(seller::add_favorite).delete(seller::remove_favorite),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(admin::all_items))
        .route("/users", get(admin::all_users))
        .route("/make-admin/{id}", put(admin::make_admin))
        .route("/remove-admin/{id}", put(admin::remove_admin))
}

/// Create the AI search routes router.
pub fn ask_routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(ask::search))
        .route("/generate-item-embedding", get(ask::generate_embeddings))
}

/// Create all routes for the marketplace API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/auth", auth_routes())
        .nest("/api/v1/item", item_routes())
        .nest("/api/v1/seller", seller_routes())
        .nest("/api/v1/admin", admin_routes())
        .nest("/api/v1/ask", ask_routes())
}
