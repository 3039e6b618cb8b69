//! Pagination: request coercion and response math.
//!
//! Page and limit arrive as free-form query strings and are coerced with
//! parse-or-default semantics — bad pagination input never fails a request.

use serde::{Deserialize, Serialize};

/// Default page when none (or garbage) is supplied.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when none (or garbage) is supplied.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on the page size a caller can request.
pub const MAX_LIMIT: u32 = 100;

/// Coerced pagination request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Coerce raw query-string values into valid parameters.
    ///
    /// Missing, non-numeric, zero, or negative values fall back to the
    /// defaults; the limit is capped at [`MAX_LIMIT`]. This never fails.
    #[must_use]
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: coerce(page, DEFAULT_PAGE, u32::MAX),
            limit: coerce(limit, DEFAULT_LIMIT, MAX_LIMIT),
        }
    }

    /// The number of rows to skip for this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

fn coerce(raw: Option<&str>, default: u32, max: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .map_or(default, |n| n.min(max))
}

/// Pagination block returned alongside a page of results.
///
/// `total_pages`/`total_count` come from a separate count query over the same
/// filter; page and count are not snapshot-consistent under concurrent
/// writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Compute the pagination block for a result set of `total_count` rows.
    #[must_use]
    pub fn new(params: PageParams, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(params.limit));
        Self {
            current_page: params.page,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total_count,
            items_per_page: params.limit,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let params = PageParams::from_raw(None, None);
        assert_eq!(params, PageParams { page: 1, limit: 10 });
    }

    #[test]
    fn test_valid_values_pass_through() {
        let params = PageParams::from_raw(Some("3"), Some("25"));
        assert_eq!(params, PageParams { page: 3, limit: 25 });
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let params = PageParams::from_raw(Some("abc"), Some("-5"));
        assert_eq!(params, PageParams { page: 1, limit: 10 });

        let params = PageParams::from_raw(Some("0"), Some("0"));
        assert_eq!(params, PageParams { page: 1, limit: 10 });
    }

    #[test]
    fn test_limit_is_capped() {
        let params = PageParams::from_raw(None, Some("5000"));
        assert_eq!(params.limit, MAX_LIMIT);
    }

    #[test]
    fn test_offset() {
        let params = PageParams::from_raw(Some("2"), Some("5"));
        assert_eq!(params.offset(), 5);
        assert_eq!(PageParams::default().offset(), 0);
    }

    #[test]
    fn test_pagination_math() {
        // 12 items at limit 5 => 3 pages
        let params = PageParams::from_raw(Some("2"), Some("5"));
        let pagination = Pagination::new(params, 12);
        assert_eq!(pagination.current_page, 2);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total_count, 12);
        assert_eq!(pagination.items_per_page, 5);
    }

    #[test]
    fn test_pagination_empty_result() {
        let pagination = Pagination::new(PageParams::default(), 0);
        assert_eq!(pagination.total_pages, 0);
        assert_eq!(pagination.total_count, 0);
    }

    #[test]
    fn test_pagination_exact_multiple() {
        let params = PageParams::from_raw(Some("1"), Some("10"));
        assert_eq!(Pagination::new(params, 20).total_pages, 2);
    }

    #[test]
    fn test_serde_camel_case() {
        let pagination = Pagination::new(PageParams::default(), 12);
        let json = serde_json::to_value(pagination).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["totalCount"], 12);
        assert_eq!(json["itemsPerPage"], 10);
    }
}
