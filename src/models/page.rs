// src/models/page.rs
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    /// Page number (from 1) and a page size clamped to `1..=max_limit`.
    pub fn resolve(self, max_limit: usize) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max_limit);
        (page, limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> (Vec<T>, Pagination) {
    let total = items.len();
    let total_pages = total.div_ceil(limit);
    let slice = items
        .into_iter()
        .skip(page.saturating_sub(1).saturating_mul(limit))
        .take(limit)
        .collect();
    let pagination = Pagination {
        current_page: page,
        total_pages,
        total,
        has_next: page < total_pages,
        has_prev: page > 1,
    };
    (slice, pagination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_the_requested_page() {
        let (items, page) = paginate((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_prev);

        assert_eq!(PageQuery { page: Some(0), limit: Some(500) }.resolve(50), (1, 50));
    }

    #[test]
    fn huge_page_numbers_are_just_empty() {
        let (page, limit) = PageQuery { page: Some(usize::MAX), limit: Some(50) }.resolve(50);
        let (items, pagination) = paginate((1..=10).collect::<Vec<_>>(), page, limit);
        assert!(items.is_empty());
        assert_eq!(pagination.total, 10);
        assert!(!pagination.has_next);
        assert!(pagination.has_prev);
    }
}
