//! Quote catalog endpoints, gated by API key

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::quote::{Quote, QuoteFilter, QuoteId};

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Quote in response format
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub id: String,
    pub text: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Quote> for QuoteResponse {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id().as_str().to_string(),
            text: quote.text().to_string(),
            author: quote.author().to_string(),
            source: quote.source().map(String::from),
            tags: quote.tags().to_vec(),
            is_published: quote.is_published(),
            created_at: quote.created_at().to_rfc3339(),
            updated_at: quote.updated_at().to_rfc3339(),
        }
    }
}

/// Pagination info echoed with every listing
#[derive(Debug, Clone, Serialize)]
pub struct PaginationInfo {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

impl PaginationInfo {
    pub fn new(total: usize, page: usize, limit: usize) -> Self {
        Self {
            total,
            page,
            limit,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

/// Paginated list response
#[derive(Debug, Clone, Serialize)]
pub struct ListQuotesResponse {
    pub quotes: Vec<QuoteResponse>,
    pub pagination: PaginationInfo,
}

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PaginationParams {
    /// Resolve to a 1-based page and a bounded page size
    pub fn resolve(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

pub fn create_quotes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotes))
        .route("/random", get(random_quote))
        .route("/{quote_id}", get(get_quote))
}

/// GET /api/quotes/random
pub async fn random_quote(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
) -> Result<Json<QuoteResponse>, ApiError> {
    let quote = state
        .quote_service
        .random_published()
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("No quotes found"))?;

    Ok(Json(QuoteResponse::from(&quote)))
}

/// GET /api/quotes
pub async fn list_quotes(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ListQuotesResponse>, ApiError> {
    let (page, limit) = params.resolve();

    let result = state
        .quote_service
        .list(&QuoteFilter::published(), (page - 1) * limit, limit)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ListQuotesResponse {
        quotes: result.quotes.iter().map(QuoteResponse::from).collect(),
        pagination: PaginationInfo::new(result.total, page, limit),
    }))
}

/// GET /api/quotes/{quote_id}
pub async fn get_quote(
    State(state): State<AppState>,
    RequireApiKey(_): RequireApiKey,
    Path(quote_id): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let id = QuoteId::new(quote_id).map_err(ApiError::from)?;

    let quote = state
        .quote_service
        .get_published(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    Ok(Json(QuoteResponse::from(&quote)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_resolution() {
        let params = PaginationParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.resolve(), (1, DEFAULT_PAGE_SIZE));

        let params = PaginationParams {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(params.resolve(), (1, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_pagination_page_count() {
        assert_eq!(PaginationInfo::new(21, 1, 10).pages, 3);
        assert_eq!(PaginationInfo::new(20, 1, 10).pages, 2);
        assert_eq!(PaginationInfo::new(0, 1, 10).pages, 0);
    }
}
