use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::types::Document;

/// Page window derived from `page` and `limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Records before this page, clamped to what Postgres accepts as an OFFSET.
    pub fn skip(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }

    /// Neighbouring page links for a collection of `total` records.
    pub fn pagination(&self, total: u64) -> Pagination {
        let end = self.page.saturating_mul(self.limit);
        Pagination {
            next: (end < total).then(|| PageLink { page: self.page.saturating_add(1), limit: self.limit }),
            prev: (self.skip() > 0).then(|| PageLink { page: self.page - 1, limit: self.limit }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

/// Paginated list response
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Document>,
}

impl ResultEnvelope {
    pub fn new(data: Vec<Document>, pagination: Pagination) -> Self {
        Self { success: true, count: data.len(), pagination, data }
    }
}

impl IntoResponse for ResultEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Unpaginated list response, used for the children of one bootcamp
#[derive(Debug, Clone, Serialize)]
pub struct ListEnvelope {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Document>,
}

impl ListEnvelope {
    pub fn new(data: Vec<Document>) -> Self {
        Self { success: true, count: data.len(), data }
    }
}

impl IntoResponse for ListEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
