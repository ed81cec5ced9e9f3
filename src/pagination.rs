//! # Pagination
//!
//! Offset pagination shared by every listing endpoint. A [`Pagination`] is
//! validated once at the edge and then carried through repositories, cache
//! keys and the [`Page`] envelope returned to clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

/// Page number used when the query string omits `page`.
pub const DEFAULT_PAGE: i64 = 1;

/// Largest value the SQL layer can bind for `LIMIT` and `OFFSET`.
const MAX_BOUND: u64 = i64::MAX as u64;

/// Errors raised while validating pagination input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("limit must be a non-zero integer")]
    InvalidLimit,
    #[error("page must be greater than or equal to 1, got {0}")]
    InvalidPage(i64),
    #[error("limit must fit in a signed 64-bit integer")]
    LimitTooLarge,
    #[error("page {0} is beyond the last addressable row")]
    PageOutOfRange(i64),
}

/// Validated page/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pagination {
    page: u64,
    limit: u64,
}

impl Pagination {
    /// Validates raw input. Negative limits are normalized to their absolute value.
    pub fn new(page: i64, limit: i64) -> Result<Self, PaginationError> {
        let limit = limit.unsigned_abs();
        if limit == 0 {
            return Err(PaginationError::InvalidLimit);
        }
        if limit > MAX_BOUND {
            return Err(PaginationError::LimitTooLarge);
        }
        if page < 1 {
            return Err(PaginationError::InvalidPage(page));
        }

        let pagination = Self {
            page: page.unsigned_abs(),
            limit,
        };
        match pagination.checked_offset() {
            Some(offset) if offset <= MAX_BOUND => Ok(pagination),
            _ => Err(PaginationError::PageOutOfRange(page)),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of rows to skip before the first row of this page.
    ///
    /// Always fits in an `i64`; [`Pagination::new`] rejects anything larger.
    pub fn offset(&self) -> u64 {
        self.checked_offset().unwrap_or(MAX_BOUND)
    }

    fn checked_offset(&self) -> Option<u64> {
        (self.page - 1).checked_mul(self.limit)
    }

    /// Number of pages needed to hold `total` rows.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Raw `page`/`limit` query parameters as sent by clients.
#[derive(Debug, Default, Clone, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Items per page; negative values are taken as absolute (default: 3)
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Applies defaults and validates the result.
    pub fn resolve(&self, default_limit: i64) -> Result<Pagination, PaginationError> {
        Pagination::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.limit.unwrap_or(default_limit),
        )
    }
}

/// Paginated listing envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    /// Items of the current page (never more than `limit`)
    pub data: Vec<T>,
    /// Total number of pages for the current limit
    pub pages: u64,
    /// Current page number
    pub page: u64,
    /// Page size used for this listing
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            data,
            pages: pagination.total_pages(total),
            page: pagination.page(),
            limit: pagination.limit(),
        }
    }

    /// Converts every item while keeping the envelope.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pages: self.pages,
            page: self.page,
            limit: self.limit,
        }
    }
}
