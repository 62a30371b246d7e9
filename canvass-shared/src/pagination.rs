/// Pagination shared by every list endpoint
///
/// Pages are 1-based. A page number below 1 is treated as the first page and
/// a page past the end is clamped to the last non-empty page, so a stale
/// page link after deletions still returns data instead of an empty list.

use serde::Serialize;

/// One page of results plus the page math the client needs to render
/// pagination controls.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// 1-based page number actually served (after clamping)
    pub page: i64,

    /// Page size
    pub per_page: i64,

    /// Total matching rows across all pages
    pub total_count: i64,

    /// Total number of pages (at least 1)
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Assembles a page from already-fetched items
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total_count: i64) -> Self {
        Self {
            items,
            page,
            per_page,
            total_count,
            total_pages: total_pages(total_count, per_page),
        }
    }
}

/// Number of pages needed for `total_count` rows, never less than 1
pub fn total_pages(total_count: i64, per_page: i64) -> i64 {
    if total_count <= 0 {
        return 1;
    }
    (total_count + per_page - 1) / per_page
}

/// Clamps a requested page into range and returns `(page, offset)`
///
/// The offset is ready to feed into `LIMIT $n OFFSET $m`.
pub fn clamp_page(requested: i64, per_page: i64, total_count: i64) -> (i64, i64) {
    let last = total_pages(total_count, per_page);
    let page = requested.clamp(1, last);
    (page, (page - 1) * per_page)
}
