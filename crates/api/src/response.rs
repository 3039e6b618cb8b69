//! The uniform JSON response envelope: `{message, data?, pagination?}`.

use serde::Serialize;

use tradepost_core::Pagination;

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl ApiResponse<()> {
    /// A message-only envelope.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            pagination: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// An envelope with a data payload.
    #[must_use]
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    /// An envelope with a data payload and a pagination block.
    #[must_use]
    pub fn paginated(message: impl Into<String>, data: T, pagination: Pagination) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            pagination: Some(pagination),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tradepost_core::PageParams;

    #[test]
    fn test_message_only_omits_optional_fields() {
        let json = serde_json::to_value(ApiResponse::message("Item deleted successfully")).unwrap();
        assert_eq!(json["message"], "Item deleted successfully");
        assert!(json.get("data").is_none());
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_with_data() {
        let json = serde_json::to_value(ApiResponse::with_data("ok", vec![1, 2, 3])).unwrap();
        assert_eq!(json["data"][2], 3);
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_paginated() {
        let pagination = Pagination::new(PageParams::default(), 12);
        let json =
            serde_json::to_value(ApiResponse::paginated("ok", vec!["a"], pagination)).unwrap();
        assert_eq!(json["pagination"]["totalCount"], 12);
        assert_eq!(json["pagination"]["currentPage"], 1);
    }
}
