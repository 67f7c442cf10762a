// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Page arithmetic and the result envelope.

use serde::Serialize;

use super::request::{FieldIssue, ValidationError};

/// Page size used when the request does not name one
pub const DEFAULT_PAGE_SIZE: u32 = 12;
/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated (page, page size) pair. Page is ≥ 1, size is in `[1, MAX_PAGE_SIZE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Out-of-range values are rejected, never clamped.
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        if page < 1 {
            issues.push(FieldIssue::new("page", "must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            issues.push(FieldIssue::new(
                "pageSize",
                format!("must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
        if issues.is_empty() {
            Ok(Self { page, page_size })
        } else {
            Err(ValidationError::new(issues))
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `(page - 1) * page_size`
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn window(&self) -> Window {
        Window {
            offset: self.offset(),
            limit: u64::from(self.page_size),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Row window handed to stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    /// Everything, for unpaginated reads
    pub const UNBOUNDED: Window = Window {
        offset: 0,
        limit: u64::MAX,
    };
}

/// `ceil(total / page_size)`; zero results means zero pages.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}

/// One page of results plus what the pager needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> SearchResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: PageRequest) -> Self {
        Self {
            items,
            total_count,
            page_number: page.page(),
            page_size: page.page_size(),
            total_pages: total_pages(total_count, page.page_size()),
        }
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page_number) < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_for_first_page_is_zero() {
        let page = PageRequest::new(1, 12).unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.window(), Window { offset: 0, limit: 12 });
    }

    #[test]
    fn test_offset_for_later_page() {
        let page = PageRequest::new(4, 25).unwrap();
        assert_eq!(page.offset(), 75);
    }

    #[test]
    fn test_offset_does_not_overflow() {
        let page = PageRequest::new(u32::MAX, MAX_PAGE_SIZE).unwrap();
        assert_eq!(page.offset(), u64::from(u32::MAX - 1) * 100);
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(PageRequest::new(1, 100).is_ok());
        assert!(PageRequest::new(1, 1).is_ok());
        assert!(PageRequest::new(1, 101).is_err());
        assert!(PageRequest::new(1, 0).is_err());
    }

    #[test]
    fn test_page_zero_rejected() {
        let err = PageRequest::new(0, 12).unwrap_err();
        assert_eq!(err.issues[0].field, "page");
    }

    #[test]
    fn test_both_issues_reported() {
        let err = PageRequest::new(0, 500).unwrap_err();
        assert_eq!(err.issues.len(), 2);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 12), 0);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
        assert_eq!(total_pages(100, 1), 100);
    }

    #[test]
    fn test_result_envelope_serializes_camel_case() {
        let result = SearchResult::new(vec!["a"], 30, PageRequest::new(2, 10).unwrap());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalCount"], 30);
        assert_eq!(json["pageNumber"], 2);
        assert_eq!(json["totalPages"], 3);
        assert!(result.has_next_page());
    }
}
