//! Page-based pagination for ledger queries.

use serde::{Deserialize, Serialize};

use crate::error::{CustomerError, Result};

/// Page size used when the caller does not pass one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A validated request for one page of results (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    /// Validate raw page parameters.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Validation` if `page < 1` or `size < 1`.
    pub fn new(page: i64, size: i64) -> Result<Self> {
        let page = u64::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| CustomerError::Validation("page must be at least 1".into()))?;
        let size = u64::try_from(size)
            .ok()
            .filter(|s| *s >= 1)
            .ok_or_else(|| CustomerError::Validation("size must be at least 1".into()))?;

        Ok(Self { page, size })
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Number of pages needed for `total_items`.
    #[must_use]
    pub const fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.size)
    }

    /// Check that this page exists for `total_items`.
    ///
    /// An empty collection has zero pages; asking for page 1 of it is allowed
    /// and yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::InvalidPage` when the page is past the last one.
    pub fn ensure_within(&self, total_items: u64) -> Result<()> {
        let total_pages = self.total_pages(total_items);
        if total_pages > 0 && self.page > total_pages {
            return Err(CustomerError::InvalidPage {
                page: self.page,
                total_pages,
            });
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results with paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The 1-based page number.
    pub page: u64,
    /// Requested page size.
    pub size: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Items on this page.
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page from its request, the total count and its items.
    #[must_use]
    pub fn new(request: PageRequest, total_items: u64, items: Vec<T>) -> Self {
        Self {
            page: request.page,
            size: request.size,
            total_items,
            total_pages: request.total_pages(total_items),
            items,
        }
    }

    /// Convert the items, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
