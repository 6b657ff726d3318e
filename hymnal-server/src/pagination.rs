//! Pagination for the song list

use hymnal_common::models::PageInfo;

/// Page size when the client sends none
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size honored
pub const MAX_PAGE_SIZE: i64 = 100;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page
    pub limit: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

impl Pagination {
    pub fn page_info(&self, total: i64) -> PageInfo {
        PageInfo {
            total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// Calculate pagination metadata from total results and the requested page
///
/// Page numbers below 1 become 1 and the limit is clamped to
/// `1..=MAX_PAGE_SIZE`. Pages past the end are kept as requested and simply
/// yield no rows; the offset saturates instead of overflowing.
///
/// # Examples
/// ```
/// use hymnal_server::pagination::calculate_pagination;
///
/// // 25 songs at 10 per page = 3 pages
/// let p = calculate_pagination(25, Some(2), None);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 10);
/// ```
pub fn calculate_pagination(
    total_results: i64,
    requested_page: Option<i64>,
    requested_limit: Option<i64>,
) -> Pagination {
    let limit = requested_limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = requested_page.unwrap_or(1).max(1);
    let total_pages = (total_results.max(0) + limit - 1) / limit;
    let offset = (page - 1).saturating_mul(limit);

    Pagination {
        page,
        limit,
        total_pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = calculate_pagination(0, None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_last_partial_page() {
        let p = calculate_pagination(21, Some(3), Some(10));
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 20);
    }

    #[test]
    fn test_limits_clamped() {
        assert_eq!(calculate_pagination(5, None, Some(0)).limit, 1);
        assert_eq!(calculate_pagination(5, None, Some(1000)).limit, MAX_PAGE_SIZE);
        assert_eq!(calculate_pagination(5, Some(-4), None).page, 1);
    }

    #[test]
    fn test_page_past_end_kept() {
        let p = calculate_pagination(5, Some(9), Some(10));
        assert_eq!(p.page, 9);
        assert_eq!(p.offset, 80);
        assert_eq!(p.page_info(5).total_pages, 1);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let p = calculate_pagination(5, Some(i64::MAX), Some(10));
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.offset, i64::MAX);
        assert_eq!(p.total_pages, 1);
    }
}
