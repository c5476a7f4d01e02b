//! Quote catalog administration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::quotes::{ListQuotesResponse, PaginationInfo, QuoteResponse};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::quote::{QuoteFilter, QuoteId};
use crate::infrastructure::quote::{CreateQuote, QuoteUpdate};

fn default_published() -> bool {
    true
}

/// Request to create a quote
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

/// Request to update a quote
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuoteRequest {
    pub text: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// Listing query: pagination plus filters
#[derive(Debug, Clone, Deserialize)]
pub struct AdminListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub is_published: Option<bool>,
    pub tag: Option<String>,
}

/// Delete acknowledgement
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeleteQuoteResponse {
    pub deleted: bool,
}

/// Distinct tags response
#[derive(Debug, Clone, serde::Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

pub fn create_admin_quotes_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quote))
        .route("/", get(list_quotes))
        .route("/tags/all", get(list_tags))
        .route("/{quote_id}", get(get_quote))
        .route("/{quote_id}", put(update_quote))
        .route("/{quote_id}", delete(delete_quote))
}

/// POST /api/admin/quotes
pub async fn create_quote(
    State(state): State<AppState>,
    _: RequireAdmin,
    Json(request): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<QuoteResponse>), ApiError> {
    debug!(author = %request.author, "Admin creating quote");

    let quote = state
        .quote_service
        .create(CreateQuote {
            text: request.text,
            author: request.author,
            source: request.source,
            tags: request.tags,
            is_published: request.is_published,
        })
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(QuoteResponse::from(&quote))))
}

/// GET /api/admin/quotes
pub async fn list_quotes(
    State(state): State<AppState>,
    _: RequireAdmin,
    Query(params): Query<AdminListParams>,
) -> Result<Json<ListQuotesResponse>, ApiError> {
    let pagination = crate::api::quotes::PaginationParams {
        page: params.page,
        limit: params.limit,
    };
    let (page, limit) = pagination.resolve();

    let filter = QuoteFilter {
        is_published: params.is_published,
        tag: params.tag,
    };

    let result = state
        .quote_service
        .list(&filter, (page - 1) * limit, limit)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ListQuotesResponse {
        quotes: result.quotes.iter().map(QuoteResponse::from).collect(),
        pagination: PaginationInfo::new(result.total, page, limit),
    }))
}

/// GET /api/admin/quotes/{quote_id}
pub async fn get_quote(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(quote_id): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let id = QuoteId::new(quote_id).map_err(ApiError::from)?;

    // admins see unpublished quotes too
    let quote = state
        .quote_service
        .get(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    Ok(Json(QuoteResponse::from(&quote)))
}

/// PUT /api/admin/quotes/{quote_id}
pub async fn update_quote(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(quote_id): Path<String>,
    Json(request): Json<UpdateQuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    debug!(quote_id = %quote_id, "Admin updating quote");

    let id = QuoteId::new(quote_id).map_err(ApiError::from)?;
    let update = QuoteUpdate {
        text: request.text,
        author: request.author,
        source: request.source,
        tags: request.tags,
        is_published: request.is_published,
    };

    let updated = state
        .quote_service
        .update(&id, update)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(QuoteResponse::from(&updated)))
}

/// DELETE /api/admin/quotes/{quote_id}
pub async fn delete_quote(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(quote_id): Path<String>,
) -> Result<Json<DeleteQuoteResponse>, ApiError> {
    debug!(quote_id = %quote_id, "Admin deleting quote");

    let id = QuoteId::new(quote_id).map_err(ApiError::from)?;
    let deleted = state
        .quote_service
        .delete(&id)
        .await
        .map_err(ApiError::from)?;

    if !deleted {
        return Err(ApiError::not_found("Quote not found"));
    }

    Ok(Json(DeleteQuoteResponse { deleted }))
}

/// GET /api/admin/quotes/tags/all
pub async fn list_tags(
    State(state): State<AppState>,
    _: RequireAdmin,
) -> Result<Json<TagsResponse>, ApiError> {
    let tags = state
        .quote_service
        .distinct_tags()
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TagsResponse { tags }))
}
