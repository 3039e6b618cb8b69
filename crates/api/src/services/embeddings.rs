//! Embedding-service client for natural-language search.
//!
//! Consumed strictly as "text in, fixed-length float vector out"; ranking
//! against stored item vectors happens here with plain cosine similarity.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::EmbeddingsConfig;

/// Errors that can occur when talking to the embedding service.
#[derive(Debug, Error)]
pub enum EmbeddingsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the embedding response.
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedding-service client.
#[derive(Clone)]
pub struct EmbeddingsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl EmbeddingsClient {
    /// Create a new embedding-service client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &EmbeddingsConfig) -> Result<Self, EmbeddingsError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| EmbeddingsError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Embed a text into a fixed-length float vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a
    /// success with a parsable body.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingsError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "input": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingsError::Parse(e.to_string()))?;

        Ok(body.embedding)
    }
}

/// Cosine similarity between two vectors; 0.0 when lengths differ or either
/// vector is all zeros.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_response_shape() {
        let body = r#"{"embedding": [0.1, -0.2, 0.3], "model": "embed-v2"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embedding.len(), 3);
    }

    #[test]
    fn test_cosine_identical() {
        let v = [0.5_f32, 0.5, 0.7];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
