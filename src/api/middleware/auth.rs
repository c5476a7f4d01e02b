//! API key authentication middleware

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::api_key::ApiKey;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor that requires a valid, active API key
///
/// The resolved key is the request's auth context; handlers take it as an
/// explicit argument. Each successful extraction counts as one use of the
/// key.
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub ApiKey);

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_api_key_from_headers(&parts.headers)?;

        debug!(
            key_prefix = %token.chars().take(11).collect::<String>(),
            "Validating API key"
        );

        // A missing key and an inactive key answer identically.
        let api_key = state
            .api_key_service
            .authenticate(&token)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthorized("Invalid or inactive API key"))?;

        // Usage accounting is best-effort: a failed counter write never
        // fails an otherwise authenticated request.
        if let Err(e) = state.api_key_service.record_usage(api_key.id()).await {
            warn!(key_id = %api_key.id(), error = %e, "Failed to record key usage");
        }

        Ok(RequireApiKey(api_key))
    }
}

fn extract_api_key_from_headers(headers: &axum::http::HeaderMap) -> Result<String, ApiError> {
    match headers.get(API_KEY_HEADER) {
        Some(value) => {
            let token = value
                .to_str()
                .map_err(|_| ApiError::bad_request("Invalid X-API-Key header encoding"))?;
            Ok(token.trim().to_string())
        }
        None => Err(ApiError::unauthorized("API key is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};

    #[test]
    fn test_extract_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, "qk_test12345".parse().unwrap());

        let result = extract_api_key_from_headers(&headers);
        assert_eq!(result.unwrap(), "qk_test12345");
    }

    #[test]
    fn test_missing_key_is_unauthorized() {
        let headers = HeaderMap::new();

        let err = extract_api_key_from_headers(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_token_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, "  qk_spaced  ".parse().unwrap());

        let result = extract_api_key_from_headers(&headers);
        assert_eq!(result.unwrap(), "qk_spaced");
    }
}
