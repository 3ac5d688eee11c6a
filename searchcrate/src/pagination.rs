//! # Pagination
//!
//! Offset/limit slicing of a filtered and ordered query, plus the
//! [`PagedResult`] envelope returned to API clients.
//!
//! Pagination is always the last step of composition: the total record count
//! must be taken on the narrowed query *before* [`paginate`] adds its
//! `OFFSET`/`LIMIT`, and the query must already carry a deterministic ordering.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, header::CONTENT_RANGE},
    response::{IntoResponse, Response},
};
use sea_orm::QuerySelect;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::SearchError;
use crate::sort::SortRequest;

/// Page coordinates sent by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PageRequest {
    /// Zero-based page index, `0` when absent
    pub page_index: Option<u64>,
    pub page_size: Option<u64>,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page_index: u64, page_size: u64) -> Self {
        Self {
            page_index: Some(page_index),
            page_size: Some(page_size),
        }
    }

    #[must_use]
    pub fn index(&self) -> u64 {
        self.page_index.unwrap_or(0)
    }
}

/// Check a page size: it must be present and at least 1.
///
/// # Errors
///
/// `InvalidArgument` for a missing or zero page size.
pub fn validate_page_size(page_size: Option<u64>) -> Result<u64, SearchError> {
    match page_size {
        Some(size) if size >= 1 => Ok(size),
        Some(size) => Err(SearchError::invalid_argument(
            "page_size",
            "Page size must be at least 1",
        )
        .with_detail("page_size", size)),
        None => Err(SearchError::invalid_argument(
            "page_size",
            "Page size is required",
        )),
    }
}

/// Slice `query` to page `page_index` (default `0`) of `page_size` rows.
///
/// SQL drivers bind `LIMIT`/`OFFSET` as signed 64-bit integers, so both the
/// page size and the resulting offset must fit in an `i64`.
///
/// # Errors
///
/// `InvalidArgument` for a missing or zero page size (see
/// [`validate_page_size`]), a page size above `i64::MAX`, or a page index
/// whose offset does not fit.
pub fn paginate<Q: QuerySelect>(
    query: Q,
    page_index: Option<u64>,
    page_size: Option<u64>,
) -> Result<Q, SearchError> {
    let page_size = validate_page_size(page_size)?;
    if i64::try_from(page_size).is_err() {
        return Err(
            SearchError::invalid_argument("page_size", "Page size is too large")
                .with_detail("page_size", page_size),
        );
    }

    let page_index = page_index.unwrap_or(0);
    let offset = page_index
        .checked_mul(page_size)
        .filter(|offset| i64::try_from(*offset).is_ok())
        .ok_or_else(|| {
            SearchError::invalid_argument("page_index", "Page index is out of range")
                .with_detail("page_index", page_index)
                .with_detail("page_size", page_size)
        })?;

    tracing::trace!(page_index, page_size, offset, "Paginating query");

    Ok(query.offset(offset).limit(page_size))
}

/// Number of pages needed to hold `total` records.
///
/// An unknown total (`None`) or an empty result both give `0`.
#[must_use]
pub fn total_pages(total: Option<u64>, page_size: u64) -> u64 {
    match total {
        Some(total) if total > 0 && page_size > 0 => total.div_ceil(page_size),
        _ => 0,
    }
}

/// Strip characters that are not allowed in a header value
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Build a `Content-Range` header such as `airports 0-9/25`.
///
/// `returned` is the number of rows actually on the page. An unknown total is
/// rendered as `*`, an empty page as `*/total`.
#[must_use]
pub fn content_range(resource: &str, offset: u64, returned: u64, total: Option<u64>) -> HeaderMap {
    let name = sanitize_resource_name(resource);
    let name = if name.trim().is_empty() { "items" } else { name.trim() };
    let total = total.map_or_else(|| "*".to_string(), |total| total.to_string());

    let range = if returned == 0 {
        format!("{name} */{total}")
    } else {
        let last = offset.saturating_add(returned - 1);
        format!("{name} {offset}-{last}/{total}")
    };

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&range)
        .unwrap_or_else(|_| HeaderValue::from_static("items */*"));
    headers.insert(CONTENT_RANGE, value);
    headers
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Sort requests that produced this ordering, echoed back to the client
    pub sortings: Vec<SortRequest>,
    pub current_page_index: u64,
    pub current_page_size: u64,
    /// `None` when the total was not computed
    pub total_records_without_pagination: Option<u64>,
    pub total_pages: u64,
    #[serde(skip)]
    resource: &'static str,
}

impl<T> PagedResult<T> {
    #[must_use]
    pub fn new(
        items: Vec<T>,
        sortings: Vec<SortRequest>,
        page_index: u64,
        page_size: u64,
        total: Option<u64>,
    ) -> Self {
        Self {
            items,
            sortings,
            current_page_index: page_index,
            current_page_size: page_size,
            total_records_without_pagination: total,
            total_pages: total_pages(total, page_size),
            resource: "items",
        }
    }

    /// Name used in the `Content-Range` header.
    #[must_use]
    pub const fn with_resource(mut self, resource: &'static str) -> Self {
        self.resource = resource;
        self
    }

    /// Convert every item, keeping the envelope.
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            sortings: self.sortings,
            current_page_index: self.current_page_index,
            current_page_size: self.current_page_size,
            total_records_without_pagination: self.total_records_without_pagination,
            total_pages: self.total_pages,
            resource: self.resource,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn content_range(&self) -> HeaderMap {
        content_range(
            self.resource,
            self.current_page_index.saturating_mul(self.current_page_size),
            self.items.len() as u64,
            self.total_records_without_pagination,
        )
    }
}

impl<T: Serialize> IntoResponse for PagedResult<T> {
    fn into_response(self) -> Response {
        let headers = self.content_range();
        (headers, Json(self)).into_response()
    }
}
