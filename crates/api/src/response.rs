//! Shared API response types.

use serde::Serialize;

/// Pagination metadata attached to list responses.
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Total matching rows.
    pub total: u64,
    /// Total pages.
    pub pages: u64,
}

impl Pagination {
    /// Build pagination metadata for a page of `total` rows. A zero `limit`
    /// is treated as 1.
    #[must_use]
    pub const fn new(page: u64, limit: u64, total: u64) -> Self {
        let limit = if limit == 0 { 1 } else { limit };
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Plain `{message}` response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Build a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_rounds_up() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.pages, 3);

        let p = Pagination::new(1, 10, 30);
        assert_eq!(p.pages, 3);

        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.pages, 0);
    }

    #[test]
    fn test_pagination_zero_limit_does_not_panic() {
        let p = Pagination::new(1, 0, 5);
        assert_eq!(p.limit, 1);
        assert_eq!(p.pages, 5);
    }
}
