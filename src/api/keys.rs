//! API key management endpoints (operator only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::api_key::{ApiKey, ApiKeyId};
use crate::infrastructure::api_key::KeyUpdate;

/// Request to create a new API key
#[derive(Debug, Clone, Deserialize)]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to update an API key
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateKeyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// API key response; the secret is never part of it
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub key_prefix: String,
    pub active: bool,
    pub permissions: Vec<String>,
    pub usage: KeyUsageResponse,
    pub created_at: String,
    pub updated_at: String,
}

/// Usage accounting in response format
#[derive(Debug, Clone, Serialize)]
pub struct KeyUsageResponse {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
}

impl From<&ApiKey> for ApiKeyResponse {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id().as_str().to_string(),
            name: key.name().to_string(),
            description: key.description().map(String::from),
            key_prefix: key.key_prefix().to_string(),
            active: key.is_active(),
            permissions: key
                .permissions()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            usage: KeyUsageResponse {
                count: key.usage().count,
                last_used: key.usage().last_used.map(|dt: DateTime<Utc>| dt.to_rfc3339()),
            },
            created_at: key.created_at().to_rfc3339(),
            updated_at: key.updated_at().to_rfc3339(),
        }
    }
}

/// Creation response: the only place the raw secret ever appears
#[derive(Debug, Clone, Serialize)]
pub struct KeyCreatedResponse {
    pub id: String,
    pub key: String,
    pub name: String,
    pub created_at: String,
}

/// List keys response
#[derive(Debug, Clone, Serialize)]
pub struct ListKeysResponse {
    pub keys: Vec<ApiKeyResponse>,
    pub total: usize,
}

/// Delete acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct DeleteKeyResponse {
    pub deleted: bool,
}

pub fn create_keys_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_key))
        .route("/", get(list_keys))
        .route("/{key_id}", patch(update_key))
        .route("/{key_id}", delete(delete_key))
}

/// POST /api/keys
pub async fn create_key(
    State(state): State<AppState>,
    _: RequireAdmin,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<KeyCreatedResponse>), ApiError> {
    debug!(name = %request.name, "Admin creating API key");

    let issued = state
        .api_key_service
        .create(&request.name, request.description)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(KeyCreatedResponse {
            id: issued.api_key.id().as_str().to_string(),
            key: issued.secret,
            name: issued.api_key.name().to_string(),
            created_at: issued.api_key.created_at().to_rfc3339(),
        }),
    ))
}

/// GET /api/keys
pub async fn list_keys(
    State(state): State<AppState>,
    _: RequireAdmin,
) -> Result<Json<ListKeysResponse>, ApiError> {
    debug!("Admin listing API keys");

    let keys = state.api_key_service.list().await.map_err(ApiError::from)?;

    let responses: Vec<ApiKeyResponse> = keys.iter().map(ApiKeyResponse::from).collect();
    let total = responses.len();

    Ok(Json(ListKeysResponse {
        keys: responses,
        total,
    }))
}

/// PATCH /api/keys/{key_id}
pub async fn update_key(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(key_id): Path<String>,
    Json(request): Json<UpdateKeyRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    debug!(key_id = %key_id, "Admin updating API key");

    let id = ApiKeyId::new(key_id).map_err(ApiError::from)?;
    let update = KeyUpdate {
        name: request.name,
        description: request.description,
        active: request.active,
    };

    let updated = state
        .api_key_service
        .update(&id, update)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiKeyResponse::from(&updated)))
}

/// DELETE /api/keys/{key_id}
pub async fn delete_key(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(key_id): Path<String>,
) -> Result<Json<DeleteKeyResponse>, ApiError> {
    debug!(key_id = %key_id, "Admin deleting API key");

    let id = ApiKeyId::new(key_id).map_err(ApiError::from)?;
    let deleted = state
        .api_key_service
        .delete(&id)
        .await
        .map_err(ApiError::from)?;

    if !deleted {
        return Err(ApiError::not_found("API key not found"));
    }

    Ok(Json(DeleteKeyResponse { deleted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::ApiKeyId;

    #[test]
    fn test_response_omits_secret_material() {
        let key = ApiKey::new(
            ApiKeyId::generate(),
            "Test Key",
            "sha256$digest",
            "qk_abcd1234",
        );

        let response = ApiKeyResponse::from(&key);
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.contains("sha256$digest"));
        assert!(json.contains("qk_abcd1234"));
        assert!(json.contains("\"permissions\":[\"read\"]"));
    }
}
