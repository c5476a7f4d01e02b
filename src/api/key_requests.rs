//! Key request endpoints
//!
//! Submission is public; everything else is operator only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::key_request::{KeyRequest, KeyRequestId};
use crate::infrastructure::approval::NewKeyRequest;

/// Request to submit a key application
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitKeyRequestRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub usage: String,
}

/// Key request in response format
#[derive(Debug, Clone, Serialize)]
pub struct KeyRequestResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub usage: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
    pub created_at: String,
}

impl From<&KeyRequest> for KeyRequestResponse {
    fn from(request: &KeyRequest) -> Self {
        Self {
            id: request.id().as_str().to_string(),
            name: request.name().to_string(),
            email: request.email().to_string(),
            usage: request.usage().to_string(),
            status: request.status().as_str().to_string(),
            api_key_id: request.api_key_id().map(|id| id.as_str().to_string()),
            created_at: request.created_at().to_rfc3339(),
        }
    }
}

/// Submission acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct SubmitKeyRequestResponse {
    pub id: String,
    pub status: String,
}

/// List response
#[derive(Debug, Clone, Serialize)]
pub struct ListKeyRequestsResponse {
    pub key_requests: Vec<KeyRequestResponse>,
    pub total: usize,
}

/// Approval result: the approval is definitive, `email_sent` reports the
/// best-effort delivery separately
#[derive(Debug, Clone, Serialize)]
pub struct ApproveKeyRequestResponse {
    pub request_id: String,
    pub api_key_id: String,
    pub email_sent: bool,
}

/// Rejection result
#[derive(Debug, Clone, Serialize)]
pub struct RejectKeyRequestResponse {
    pub request_id: String,
    pub email_sent: bool,
}

pub fn create_key_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_key_request))
        .route("/", get(list_key_requests))
        .route("/{request_id}/approve", patch(approve_key_request))
        .route("/{request_id}/reject", patch(reject_key_request))
}

/// POST /api/key-requests
pub async fn submit_key_request(
    State(state): State<AppState>,
    Json(request): Json<SubmitKeyRequestRequest>,
) -> Result<(StatusCode, Json<SubmitKeyRequestResponse>), ApiError> {
    let outcome = state
        .approval_service
        .submit(NewKeyRequest {
            name: request.name,
            email: request.email,
            usage: request.usage,
        })
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitKeyRequestResponse {
            id: outcome.request.id().as_str().to_string(),
            status: outcome.request.status().as_str().to_string(),
        }),
    ))
}

/// GET /api/key-requests
pub async fn list_key_requests(
    State(state): State<AppState>,
    _: RequireAdmin,
) -> Result<Json<ListKeyRequestsResponse>, ApiError> {
    debug!("Admin listing key requests");

    let requests = state.approval_service.list().await.map_err(ApiError::from)?;

    let responses: Vec<KeyRequestResponse> =
        requests.iter().map(KeyRequestResponse::from).collect();
    let total = responses.len();

    Ok(Json(ListKeyRequestsResponse {
        key_requests: responses,
        total,
    }))
}

/// PATCH /api/key-requests/{request_id}/approve
pub async fn approve_key_request(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(request_id): Path<String>,
) -> Result<Json<ApproveKeyRequestResponse>, ApiError> {
    debug!(request_id = %request_id, "Admin approving key request");

    let id = KeyRequestId::new(request_id).map_err(ApiError::from)?;
    let outcome = state
        .approval_service
        .approve(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApproveKeyRequestResponse {
        request_id: outcome.request.id().as_str().to_string(),
        api_key_id: outcome.api_key_id.as_str().to_string(),
        email_sent: outcome.notification.was_sent(),
    }))
}

/// PATCH /api/key-requests/{request_id}/reject
pub async fn reject_key_request(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(request_id): Path<String>,
) -> Result<Json<RejectKeyRequestResponse>, ApiError> {
    debug!(request_id = %request_id, "Admin rejecting key request");

    let id = KeyRequestId::new(request_id).map_err(ApiError::from)?;
    let outcome = state
        .approval_service
        .reject(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(RejectKeyRequestResponse {
        request_id: outcome.request.id().as_str().to_string(),
        email_sent: outcome.notification.was_sent(),
    }))
}
