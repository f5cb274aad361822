//! Pagination types for list operations.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Maximum allowed items per page to prevent excessive queries
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination query parameters (reusable across all list endpoints)
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams), into_params(parameter_in = Query))]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    /// Validate the raw parameters into a page request.
    pub fn to_request(&self) -> AppResult<PageRequest> {
        PageRequest::new(self.page, self.page_size)
    }
}

/// A validated page request: `page >= 1`, `1 <= page_size <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Create a page request. Zero values are rejected; oversized pages are capped.
    pub fn new(page: u64, page_size: u64) -> AppResult<Self> {
        if page == 0 {
            return Err(AppError::validation("Page number must be at least 1"));
        }
        if page_size == 0 {
            return Err(AppError::validation("Page size must be at least 1"));
        }

        Ok(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Zero-based index of the first row on this page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Inclusive row range covered by this page
    pub fn range(&self) -> RowRange {
        let from = self.offset();
        RowRange {
            from,
            to: from.saturating_add(self.page_size - 1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Zero-based inclusive row range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

impl RowRange {
    /// Number of rows the range can hold
    pub fn limit(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Paginated response wrapper (reusable for all list responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(
    feature = "openapi",
    derive(utoipa::ToSchema),
    aliases(
        StudentPage = Paginated<domain::Student>,
        GradePage = Paginated<domain::Grade>,
        ArchivePage = Paginated<domain::Archive>,
        LoginRecordPage = Paginated<domain::LoginRecord>
    )
)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Create a page from fetched rows and the exact total count.
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta {
                page: request.page(),
                page_size: request.page_size(),
                total,
                total_pages: total.div_ceil(request.page_size()),
            },
        }
    }

    /// Check whether a page exists after this one
    pub fn has_next(&self) -> bool {
        self.pagination.page < self.pagination.total_pages
    }
}
