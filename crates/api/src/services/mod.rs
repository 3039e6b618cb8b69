//! Service clients and credential primitives.

pub mod embeddings;
pub mod password;
pub mod storage;
pub mod tokens;

pub use embeddings::{EmbeddingsClient, EmbeddingsError, cosine_similarity};
pub use password::{PasswordError, hash_password, verify_password};
pub use storage::{StorageClient, StorageError};
pub use tokens::{Claims, TokenError, TokenKind, TokenService};
