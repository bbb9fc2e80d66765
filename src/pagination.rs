//! Pagination utilities for list responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed).
    #[param(minimum = 1, default = 1)]
    #[serde(default = "default_page")]
    pub page: usize,

    /// Items per page, capped at 100.
    #[param(minimum = 1, maximum = 100, default = 20)]
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PaginationParams {
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// Applies the window to an already-materialized collection, as the
    /// in-memory store returns full result sets.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let offset = (self.page() - 1) * self.per_page();
        items
            .iter()
            .skip(offset)
            .take(self.per_page())
            .cloned()
            .collect()
    }

    pub fn into_metadata(self, total_count: usize) -> PaginationMeta {
        PaginationMeta::new(self.page(), self.per_page(), total_count)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, per_page: usize, total_count: usize) -> Self {
        let total_pages = if total_count == 0 {
            1
        } else {
            total_count.div_ceil(per_page)
        };

        Self {
            page,
            per_page,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_clamping() {
        let params = PaginationParams { page: 0, per_page: 500 };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), MAX_PER_PAGE);

        let params = PaginationParams { page: 3, per_page: 0 };
        assert_eq!(params.page(), 3);
        assert_eq!(params.per_page(), 1);
    }

    #[test]
    fn test_slice_windows() {
        let items: Vec<i32> = (0..25).collect();

        let first = PaginationParams { page: 1, per_page: 10 };
        assert_eq!(first.slice(&items), (0..10).collect::<Vec<_>>());

        let last = PaginationParams { page: 3, per_page: 10 };
        assert_eq!(last.slice(&items), (20..25).collect::<Vec<_>>());

        let beyond = PaginationParams { page: 5, per_page: 10 };
        assert!(beyond.slice(&items).is_empty());
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(1, 20, 100);
        assert_eq!(meta.total_pages, 5);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let meta = PaginationMeta::new(5, 20, 100);
        assert!(!meta.has_next);
        assert!(meta.has_prev);

        let meta = PaginationMeta::new(1, 20, 0);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next);

        let meta = PaginationMeta::new(1, 20, 95);
        assert_eq!(meta.total_pages, 5);
    }
}
