//! Operator authorization middleware
//!
//! A single process-wide secret authorizes all administrative actions; there
//! is no per-operator identity.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::infrastructure::api_key::constant_time_compare;

/// Header carrying the operator secret
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Extractor that requires the operator secret
#[derive(Debug, Clone)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if is_authorized(&parts.headers, &state.admin_secret) {
            Ok(RequireAdmin)
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

fn is_authorized(headers: &axum::http::HeaderMap, admin_secret: &str) -> bool {
    headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|provided| constant_time_compare(provided, admin_secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn test_matching_secret_is_authorized() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_SECRET_HEADER, "s3cret".parse().unwrap());

        assert!(is_authorized(&headers, "s3cret"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_SECRET_HEADER, "guess".parse().unwrap());

        assert!(!is_authorized(&headers, "s3cret"));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        assert!(!is_authorized(&HeaderMap::new(), "s3cret"));
    }
}
