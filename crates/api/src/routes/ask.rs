//! Natural-language search over the catalog.
//!
//! The embedding service is an external collaborator consumed as
//! "text in, fixed-length float vector out". Query vectors are ranked
//! against stored listing vectors by cosine similarity; listings without an
//! embedding are skipped until the backfill endpoint has visited them.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::db::ItemRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::ItemPayload;
use crate::response::ApiResponse;
use crate::services::cosine_similarity;
use crate::state::AppState;

/// Default and maximum result counts for AI search.
const DEFAULT_RESULTS: usize = 10;
const MAX_RESULTS: usize = 50;

/// How many approved listings are considered per query.
const CORPUS_LIMIT: i64 = 500;

/// How many listings one backfill call embeds.
const BACKFILL_BATCH: i64 = 100;

/// AI search request body.
#[derive(Debug, Deserialize)]
pub struct AiSearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

/// Embed the query and rank approved listings by cosine similarity.
pub async fn search(
    State(state): State<AppState>,
    Json(body): Json<AiSearchRequest>,
) -> Result<impl IntoResponse> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query is required".to_owned()));
    }

    let client = state.embeddings().ok_or(AppError::EmbeddingsUnavailable)?;
    let query_vector = client.embed(query).await?;

    let corpus = ItemRepository::new(state.pool())
        .approved_with_embeddings(CORPUS_LIMIT)
        .await?;

    let limit = body.limit.unwrap_or(DEFAULT_RESULTS).clamp(1, MAX_RESULTS);

    let mut scored: Vec<(f32, ItemPayload)> = corpus
        .into_iter()
        .map(|(item, embedding)| {
            (
                cosine_similarity(&query_vector, &embedding),
                ItemPayload::from(item),
            )
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let results: Vec<ItemPayload> = scored
        .into_iter()
        .take(limit)
        .map(|(_, payload)| payload)
        .collect();

    Ok(Json(ApiResponse::with_data("Search results", results)))
}

/// Backfill embeddings for listings that have none yet.
pub async fn generate_embeddings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let client = state.embeddings().ok_or(AppError::EmbeddingsUnavailable)?;

    let repo = ItemRepository::new(state.pool());
    let pending = repo.missing_embedding(BACKFILL_BATCH).await?;

    let mut embedded = 0_usize;
    for item in pending {
        let text = format!("{} {}", item.name, item.description);
        let vector = client.embed(&text).await?;
        repo.set_embedding(item.id, &vector).await?;
        embedded += 1;
    }

    tracing::info!(count = embedded, "listing embeddings generated");

    Ok(Json(ApiResponse::message(format!(
        "Generated embeddings for {embedded} items"
    ))))
}
