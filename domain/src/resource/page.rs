use serde::{Deserialize, Serialize};

/// Page number used when none is requested
pub const DEFAULT_PAGE: usize = 1;

/// Page size used when none is requested
pub const DEFAULT_LIMIT: usize = 10;

/// Subset of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Resources on the requested page
    pub items: Vec<T>,
    /// Number of resources across all pages
    pub total: usize,
    /// One-based page number
    pub page: usize,
    /// Maximum number of items per page
    pub limit: usize,
}

impl<T> Page<T> {
    /// Cuts a page out of a full listing
    ///
    /// Missing parameters fall back to [`DEFAULT_PAGE`] and [`DEFAULT_LIMIT`], a page of zero is
    /// treated as the first one. Pages beyond the end are empty.
    pub fn paginate(items: Vec<T>, page: Option<usize>, limit: Option<usize>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let total = items.len();
        let skip = (page - 1).saturating_mul(limit);

        Self {
            items: items.into_iter().skip(skip).take(limit).collect(),
            total,
            page,
            limit,
        }
    }
}
