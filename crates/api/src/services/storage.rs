//! Object-store client for listing images.
//!
//! Uploads return a durable URL; the store itself is an external
//! collaborator. Multi-image uploads run sequentially, one file at a time,
//! so the stored URL list always matches the input file order.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::StorageConfig;

/// Errors that can occur when interacting with the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the upload response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Upload response from the object store.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    /// Durable, publicly servable URL of the stored blob.
    secure_url: String,
}

/// Object-store client for listing images.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    endpoint: String,
    folder: String,
}

impl StorageClient {
    /// Create a new object-store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| StorageError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            folder: config.folder.clone(),
        })
    }

    /// Upload one image; returns its durable URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a
    /// success with a parsable body.
    pub async fn upload_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_owned());
        let form = reqwest::multipart::Form::new()
            .text("folder", self.folder.clone())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/upload", self.endpoint))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Parse(e.to_string()))?;

        Ok(body.secure_url)
    }

    /// Upload several images sequentially, preserving input order.
    ///
    /// The first failure aborts the batch; already-uploaded blobs are left in
    /// the store (uploads are not retried or rolled back).
    ///
    /// # Errors
    ///
    /// Returns the first upload error encountered.
    pub async fn upload_all(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Vec<String>, StorageError> {
        let mut urls = Vec::with_capacity(files.len());
        for (file_name, bytes) in files {
            let url = self.upload_image(&file_name, bytes).await?;
            urls.push(url);
        }
        Ok(urls)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_shape() {
        let body = r#"{"secure_url": "https://img.example.com/items/abc.jpg", "bytes": 1024}"#;
        let parsed: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.secure_url, "https://img.example.com/items/abc.jpg");
    }
}
