//! Page-based pagination shared by the listing endpoints.

use serde::Serialize;

/// Upper bound on any page size a client can request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to `[1, max]`, defaulting to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// A resolved 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Resolve optional query values against the configured default size.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: clamp_limit(per_page, default_per_page, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of results with the total across all pages.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let total_pages = if total == 0 {
            0
        } else {
            (total + request.per_page - 1) / request.per_page
        };
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages,
            has_next: request.page < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_uses_default_when_none() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
    }

    #[test]
    fn clamp_limit_respects_bounds() {
        assert_eq!(clamp_limit(Some(200), 20, 100), 100);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
        assert_eq!(clamp_limit(Some(-5), 20, 100), 1);
    }

    #[test]
    fn page_request_offsets() {
        let req = PageRequest::new(Some(3), None, 5);
        assert_eq!((req.limit(), req.offset()), (5, 10));
        let req = PageRequest::new(Some(0), Some(500), 5);
        assert_eq!((req.page, req.per_page, req.offset()), (1, MAX_PAGE_SIZE, 0));
    }

    #[test]
    fn total_pages_rounds_up() {
        let req = PageRequest::new(Some(1), Some(5), 5);
        assert_eq!(Page::new(vec![1; 5], req, 11).total_pages, 3);
        assert_eq!(Page::<i32>::new(vec![], req, 0).total_pages, 0);
    }

    #[test]
    fn has_next_until_last_page() {
        let first = PageRequest::new(Some(1), Some(5), 5);
        let last = PageRequest::new(Some(2), Some(5), 5);
        assert!(Page::new(vec![1; 5], first, 6).has_next);
        assert!(!Page::new(vec![1], last, 6).has_next);
        assert!(!Page::<i32>::new(vec![], first, 0).has_next);

        let json = serde_json::to_value(Page::new(vec![1; 5], first, 6)).unwrap();
        assert_eq!(json["has_next"], true);
    }
}
