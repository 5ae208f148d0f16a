//! Page requests, sort direction and the paged-result envelope shared by the
//! category and expense listings.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

pub const X_PAGINATION: HeaderName = HeaderName::from_static("x-pagination");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than "desc" (any case) is ascending; `None` takes the
    /// listing's default.
    pub fn parse_or(raw: Option<&str>, default: SortOrder) -> Self {
        match raw.map(str::trim) {
            None | Some("") => default,
            Some(s) if s.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            Some(_) => SortOrder::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A validated, clamped page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Page is 1-indexed. Oversized page sizes are clamped, not rejected.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::validation("page must be greater than or equal to 1"));
        }
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size < 1 {
            return Err(AppError::validation("pageSize must be greater than or equal to 1"));
        }
        Ok(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    /// Saturates for pages far past the end; such a page is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub current_page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationMetadata {
    pub fn new(req: PageRequest, total_count: i64) -> Self {
        let total_pages = (total_count + req.page_size - 1) / req.page_size;
        Self {
            current_page: req.page,
            page_size: req.page_size,
            total_count,
            total_pages,
            has_previous: req.page > 1,
            has_next: req.page < total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMetadata,
}

impl<T> PagedResult<T> {
    pub fn new(data: Vec<T>, req: PageRequest, total_count: i64) -> Self {
        Self {
            data,
            pagination: PaginationMetadata::new(req, total_count),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }

    /// `X-Pagination` header carrying the metadata as JSON.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(json) = serde_json::to_string(&self.pagination) {
            if let Ok(value) = HeaderValue::from_str(&json) {
                headers.insert(X_PAGINATION, value);
            }
        }
        headers
    }
}

/// Escapes LIKE wildcards so a search term matches literally.
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
