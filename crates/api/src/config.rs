//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TRADEPOST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `TRADEPOST_TOKEN_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `SUPER_ADMIN_EMAIL` - Email of the bootstrapped super-admin account
//! - `SUPER_ADMIN_PASSWORD` - Password for the bootstrapped super-admin account
//! - `STORAGE_ENDPOINT` - Image object-store upload endpoint
//! - `STORAGE_API_KEY` - Image object-store API key
//!
//! ## Optional
//! - `TRADEPOST_HOST` - Bind address (default: 127.0.0.1)
//! - `TRADEPOST_PORT` - Listen port (default: 3000)
//! - `ACCESS_TOKEN_TTL_SECS` - Access token lifetime (default: 900)
//! - `REFRESH_TOKEN_TTL_SECS` - Refresh token lifetime (default: 1209600)
//! - `STORAGE_FOLDER` - Object-store folder for listing images (default: items)
//! - `EMBEDDINGS_ENDPOINT` / `EMBEDDINGS_API_KEY` - Embedding service (AI search
//!   endpoints answer 503 when unset)
//! - `TEXT_SEARCH_MODE` - `ranked` (default) or `substring`
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// How the catalog answers free-text queries.
///
/// The choice is made once at startup; there is no exception-driven fallback
/// between the two at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSearchMode {
    /// Full-text search over name+description, ordered by relevance rank.
    #[default]
    Ranked,
    /// Case-insensitive substring match, ordered by recency.
    Substring,
}

impl TextSearchMode {
    fn from_env_value(value: &str) -> Result<Self, ConfigError> {
        match value {
            "ranked" => Ok(Self::Ranked),
            "substring" => Ok(Self::Substring),
            other => Err(ConfigError::InvalidEnvVar(
                "TEXT_SEARCH_MODE".to_owned(),
                format!("expected 'ranked' or 'substring', got {other:?}"),
            )),
        }
    }
}

/// Tradepost application configuration.
#[derive(Debug, Clone)]
pub struct TradepostConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing secret
    pub token_secret: SecretString,
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Bootstrapped super-admin account
    pub super_admin_email: String,
    /// Bootstrapped super-admin password
    pub super_admin_password: SecretString,
    /// Image object-store configuration
    pub storage: StorageConfig,
    /// Embedding service configuration (AI search is disabled when absent)
    pub embeddings: Option<EmbeddingsConfig>,
    /// Free-text search strategy
    pub text_search_mode: TextSearchMode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Image object-store configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct StorageConfig {
    /// Upload endpoint base URL
    pub endpoint: String,
    /// API key sent on every upload
    pub api_key: SecretString,
    /// Folder/prefix for listing images
    pub folder: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("folder", &self.folder)
            .finish()
    }
}

/// Embedding service configuration.
#[derive(Clone)]
pub struct EmbeddingsConfig {
    /// Embedding endpoint URL
    pub endpoint: String,
    /// API key sent on every request
    pub api_key: SecretString,
}

impl std::fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl TradepostConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("TRADEPOST_DATABASE_URL")?;
        let host = get_env_or_default("TRADEPOST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRADEPOST_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("TRADEPOST_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRADEPOST_PORT".to_owned(), e.to_string()))?;

        let token_secret = get_validated_secret("TRADEPOST_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "TRADEPOST_TOKEN_SECRET")?;

        let access_token_ttl = get_duration_secs("ACCESS_TOKEN_TTL_SECS", 900)?;
        let refresh_token_ttl = get_duration_secs("REFRESH_TOKEN_TTL_SECS", 14 * 24 * 60 * 60)?;

        let super_admin_email = get_required_env("SUPER_ADMIN_EMAIL")?;
        let super_admin_password = get_required_secret("SUPER_ADMIN_PASSWORD")?;

        let storage = StorageConfig::from_env()?;
        let embeddings = EmbeddingsConfig::from_env()?;

        let text_search_mode = match get_optional_env("TEXT_SEARCH_MODE") {
            Some(value) => TextSearchMode::from_env_value(&value)?,
            None => TextSearchMode::default(),
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            token_secret,
            access_token_ttl,
            refresh_token_ttl,
            super_admin_email,
            super_admin_password,
            storage,
            embeddings,
            text_search_mode,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: get_required_env("STORAGE_ENDPOINT")?,
            api_key: get_required_secret("STORAGE_API_KEY")?,
            folder: get_env_or_default("STORAGE_FOLDER", "items"),
        })
    }
}

impl EmbeddingsConfig {
    /// Both variables or neither: a lone endpoint or key is a config mistake.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("EMBEDDINGS_ENDPOINT"),
            get_optional_env("EMBEDDINGS_API_KEY"),
        ) {
            (Some(endpoint), Some(api_key)) => Ok(Some(Self {
                endpoint,
                api_key: SecretString::from(api_key),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar("EMBEDDINGS_API_KEY".to_owned())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("EMBEDDINGS_ENDPOINT".to_owned())),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a duration in whole seconds with a default.
fn get_duration_secs(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

/// Validate that the token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_token_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_token_secret(&secret, "TEST_TOKEN").is_err());
    }

    #[test]
    fn test_validate_token_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_token_secret(&secret, "TEST_TOKEN").is_ok());
    }

    #[test]
    fn test_text_search_mode_parsing() {
        assert_eq!(
            TextSearchMode::from_env_value("ranked").unwrap(),
            TextSearchMode::Ranked
        );
        assert_eq!(
            TextSearchMode::from_env_value("substring").unwrap(),
            TextSearchMode::Substring
        );
        assert!(TextSearchMode::from_env_value("fuzzy").is_err());
    }

    #[test]
    fn test_storage_config_debug_redacts_key() {
        let config = StorageConfig {
            endpoint: "https://store.example.com/upload".to_owned(),
            api_key: SecretString::from("super_secret_api_key"),
            folder: "items".to_owned(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("store.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_key"));
    }
}
