//! Offset pagination.
//!
//! Listing endpoints take a page number and page size, run one COUNT query
//! sharing the listing's filter predicates, and window the result with
//! LIMIT/OFFSET derived here.

use serde::{Deserialize, Serialize};

/// Raw query-string parameters, before clamping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    pub fn page_size_or(&self, default_size: i64, max_size: i64) -> i64 {
        self.page_size.unwrap_or(default_size).clamp(1, max_size)
    }

    pub fn page_or_first(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

/// A computed result window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub offset: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub total_records: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
}

impl Page {
    /// Compute the window for `requested_page` over `total_records` rows.
    ///
    /// `total_pages` floors at 1 so that an empty result set still has a
    /// well-defined first page, and `current_page` is clamped into
    /// `[1, total_pages]`.
    pub fn compute(total_records: i64, page_size: i64, requested_page: i64) -> Self {
        let page_size = page_size.max(1);
        let total_records = total_records.max(0);
        let total_pages = ((total_records + page_size - 1) / page_size).max(1);
        let current_page = requested_page.clamp(1, total_pages);
        let offset = (current_page - 1) * page_size;
        let has_prev = current_page > 1;
        let has_next = current_page < total_pages;

        Self {
            offset,
            current_page,
            page_size,
            total_records,
            total_pages,
            has_prev,
            has_next,
            prev_page: has_prev.then(|| current_page - 1),
            next_page: has_next.then(|| current_page + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_partial_page() {
        let page = Page::compute(47, 20, 3);
        assert_eq!(page.offset, 40);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev);
        assert!(!page.has_next);
        assert_eq!(page.prev_page, Some(2));
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn empty_result_set_clamps_to_first_page() {
        let page = Page::compute(0, 20, 5);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.offset, 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn requested_page_below_one_clamps_up() {
        let page = Page::compute(100, 20, -3);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.offset, 0);
        assert_eq!(page.next_page, Some(2));
    }

    #[test]
    fn exact_multiple_has_no_phantom_page() {
        let page = Page::compute(40, 20, 2);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next);
    }

    #[test]
    fn params_clamp_page_size() {
        let params = PageParams {
            page: Some(2),
            page_size: Some(500),
        };
        assert_eq!(params.page_size_or(20, 100), 100);
        assert_eq!(params.page_or_first(), 2);

        let defaults = PageParams::default();
        assert_eq!(defaults.page_size_or(20, 100), 20);
        assert_eq!(defaults.page_or_first(), 1);
    }
}
