//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use tradepost_core::Catalog;

use crate::config::TradepostConfig;
use crate::services::{EmbeddingsClient, EmbeddingsError, StorageClient, StorageError, TokenService};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
    #[error("embeddings client: {0}")]
    Embeddings(#[from] EmbeddingsError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: TradepostConfig,
    pool: PgPool,
    tokens: TokenService,
    storage: StorageClient,
    embeddings: Option<EmbeddingsClient>,
    catalog: &'static Catalog,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if one of the external-service clients fails to build.
    pub fn new(config: TradepostConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(
            &config.token_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        );
        let storage = StorageClient::new(&config.storage)?;
        let embeddings = config
            .embeddings
            .as_ref()
            .map(EmbeddingsClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                storage,
                embeddings,
                catalog: Catalog::builtin(),
            }),
        })
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &TradepostConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token issuer/verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the image object-store client.
    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.inner.storage
    }

    /// Get the embedding-service client, if configured.
    #[must_use]
    pub fn embeddings(&self) -> Option<&EmbeddingsClient> {
        self.inner.embeddings.as_ref()
    }

    /// Get the category catalog.
    #[must_use]
    pub fn catalog(&self) -> &'static Catalog {
        self.inner.catalog
    }
}
