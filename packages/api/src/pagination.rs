// ABOUTME: Page/limit query parameters for list endpoints
// ABOUTME: Normalizes paging input to SQL limit/offset and wraps pages with metadata

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
const MIN_PAGE: i64 = 1;

/// `?page=&limit=`, 1-indexed
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    MIN_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn with_page_and_limit(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page.max(MIN_PAGE)
    }

    /// Limit clamped to 1..=MAX_PAGE_SIZE
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::with_page_and_limit(MIN_PAGE, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total_items: i64) -> Self {
        let page = params.page();
        let page_size = params.limit();
        let total_pages = (total_items + page_size - 1) / page_size;

        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > MIN_PAGE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, params: &PaginationParams, total_items: i64) -> Self {
        Self {
            items,
            pagination: PaginationMeta::new(params, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 20, 20, 0)]
    #[case(3, 10, 10, 20)]
    #[case(0, 10, 10, 0)]
    #[case(-4, 10, 10, 0)]
    #[case(1, 500, MAX_PAGE_SIZE, 0)]
    #[case(2, -5, 1, 1)]
    fn test_limit_and_offset(
        #[case] page: i64,
        #[case] limit: i64,
        #[case] expected_limit: i64,
        #[case] expected_offset: i64,
    ) {
        let params = PaginationParams::with_page_and_limit(page, limit);
        assert_eq!(params.limit(), expected_limit);
        assert_eq!(params.offset(), expected_offset);
    }

    #[test]
    fn test_meta_partial_last_page() {
        let params = PaginationParams::with_page_and_limit(3, 20);
        let meta = PaginationMeta::new(&params, 45);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }

    #[test]
    fn test_meta_empty() {
        let meta = PaginationMeta::new(&PaginationParams::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }
}
