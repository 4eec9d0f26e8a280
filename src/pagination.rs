//! Bounded, page-at-a-time listing shared by every catalog entity.
//!
//! A [`PageRequest`] is parsed from the raw `pageIndex` / `pageSize` query
//! values; [`paginate`] runs the page query and the count query for any row
//! type and wraps the result in a [`Page`] envelope:
//!
//! ```json
//! { "rows": [...], "pagination": { "pageIndex": 0, "pageSize": 20, "pageCount": 3 } }
//! ```

use futures::future::try_join;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::catalog::CatalogError;

/// Raw query-string values, kept as text so that parsing failures are ours to report.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_index: Option<String>,
    pub page_size: Option<String>,
}

/// A validated page window: `page_index` is zero-based, `page_size` at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_index: i64,
    page_size: i64,
}

impl PageRequest {
    /// Parse both values; neither has a default. `max_page_size` caps oversized requests.
    pub fn parse(
        page_index: Option<&str>,
        page_size: Option<&str>,
        max_page_size: i64,
    ) -> Result<Self, CatalogError> {
        let page_index = parse_number("pageIndex", page_index)?;
        let page_size = parse_number("pageSize", page_size)?;
        Self::new(page_index, page_size, max_page_size)
    }

    pub fn from_query(query: &PageQuery, max_page_size: i64) -> Result<Self, CatalogError> {
        Self::parse(
            query.page_index.as_deref(),
            query.page_size.as_deref(),
            max_page_size,
        )
    }

    pub fn new(page_index: i64, page_size: i64, max_page_size: i64) -> Result<Self, CatalogError> {
        if page_index < 0 {
            return Err(CatalogError::invalid_pagination(
                "pageIndex must not be negative",
            ));
        }
        if page_size < 1 {
            return Err(CatalogError::invalid_pagination(
                "pageSize must be at least 1",
            ));
        }

        let page_size = if page_size > max_page_size {
            tracing::warn!("pageSize {} exceeds max {}, capping to max", page_size, max_page_size);
            max_page_size
        } else {
            page_size
        };

        if page_index.checked_mul(page_size).is_none() {
            return Err(CatalogError::invalid_pagination("pageIndex is out of range"));
        }

        Ok(Self {
            page_index,
            page_size,
        })
    }

    pub fn page_index(&self) -> i64 {
        self.page_index
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Rows to return, i.e. the SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Rows to skip, i.e. the SQL `OFFSET`. Overflow is rejected at construction.
    pub fn offset(&self) -> i64 {
        self.page_index * self.page_size
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<i64, CatalogError> {
    let raw = raw.ok_or_else(|| CatalogError::invalid_pagination(format!("{} is required", name)))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CatalogError::invalid_pagination(format!("{} must be an integer, got '{}'", name, raw)))
}

/// Page metadata returned next to the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_index: i64,
    pub page_size: i64,
    pub page_count: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            page_index: request.page_index,
            page_size: request.page_size,
            page_count: page_count(total, request.page_size),
        }
    }
}

/// `ceil(total / page_size)` in integer arithmetic. `page_size` is at least one
/// for any constructed [`PageRequest`].
pub fn page_count(total: i64, page_size: i64) -> i64 {
    let total = total.max(0);
    total / page_size + i64::from(total % page_size != 0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(mut rows: Vec<T>, total: i64, request: PageRequest) -> Self {
        rows.truncate(request.limit() as usize);
        Self {
            rows,
            pagination: Pagination::new(request, total),
        }
    }
}

/// Run the page query and the count query together and assemble the envelope.
/// Works for any row shape: the caller supplies both futures.
pub async fn paginate<T, L, C>(request: PageRequest, rows: L, count: C) -> Result<Page<T>, CatalogError>
where
    L: Future<Output = Result<Vec<T>, CatalogError>>,
    C: Future<Output = Result<i64, CatalogError>>,
{
    let (rows, total) = try_join(rows, count).await?;
    Ok(Page::new(rows, total, request))
}
