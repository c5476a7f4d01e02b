//! Quotevault API
//!
//! A quotation catalog served behind an API-key gate, with a workflow for
//! requesting, approving, and issuing those keys:
//! - key requests move one-way from pending to approved or rejected
//! - approval issues a key and emails it to the requester
//! - catalog access authenticates per request and counts usage
//! - a single operator secret gates all administrative endpoints

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::{info, warn};

use api::state::{ApiKeyServiceTrait, ApprovalServiceTrait, AppState, QuoteServiceTrait};
use config::StorageBackend;
use domain::notifier::Notifier;
use domain::quote::{Quote, QuoteId};
use infrastructure::api_key::{
    ApiKeyService, InMemoryApiKeyRepository, KeyGenerator, PostgresApiKeyRepository,
};
use infrastructure::approval::ApprovalService;
use infrastructure::key_request::{InMemoryKeyRequestRepository, PostgresKeyRequestRepository};
use infrastructure::notifier::{EmailConfig, EmailNotifier, LogNotifier};
use infrastructure::postgres::{self, PostgresConfig};
use infrastructure::quote::{InMemoryQuoteRepository, PostgresQuoteRepository, QuoteService};

/// Create the application state with all services initialized
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::load().unwrap_or_default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    // Required configuration is checked here, at startup, not on first use.
    let admin_secret = config
        .auth
        .admin_secret
        .clone()
        .or_else(|| std::env::var("ADMIN_SECRET").ok())
        .filter(|secret| !secret.trim().is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("ADMIN_SECRET (or auth.admin_secret) must be configured")
        })?;

    let notifier = create_notifier(config);
    let generator = KeyGenerator::new(&config.keys.prefix);

    let (api_key_service, approval_service, quote_service): (
        Arc<dyn ApiKeyServiceTrait>,
        Arc<dyn ApprovalServiceTrait>,
        Arc<dyn QuoteServiceTrait>,
    ) = match config.storage.backend {
        StorageBackend::Postgres => {
            let database_url = std::env::var("DATABASE_URL")
                .ok()
                .or_else(|| config.storage.database_url.clone())
                .ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL is required for the postgres backend")
                })?;

            info!("Connecting to PostgreSQL...");
            let pool = postgres::connect(&PostgresConfig::new(database_url)).await?;
            info!("PostgreSQL connection established");

            let key_repository = Arc::new(PostgresApiKeyRepository::new(pool.clone()));
            key_repository.ensure_schema().await?;
            let request_repository = Arc::new(PostgresKeyRequestRepository::new(pool.clone()));
            request_repository.ensure_schema().await?;
            let quote_repository = Arc::new(PostgresQuoteRepository::new(pool));
            quote_repository.ensure_schema().await?;

            let keys = Arc::new(ApiKeyService::new(key_repository).with_generator(generator));
            let approvals = Arc::new(
                ApprovalService::new(request_repository, keys.clone(), notifier)
                    .with_auto_approve(config.keys.auto_approve),
            );
            let quotes = Arc::new(QuoteService::new(quote_repository));

            let keys: Arc<dyn ApiKeyServiceTrait> = keys;
            let approvals: Arc<dyn ApprovalServiceTrait> = approvals;
            let quotes: Arc<dyn QuoteServiceTrait> = quotes;
            (keys, approvals, quotes)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage");

            let key_repository = Arc::new(InMemoryApiKeyRepository::new());
            let request_repository = Arc::new(InMemoryKeyRequestRepository::new());
            let quote_repository =
                Arc::new(InMemoryQuoteRepository::with_quotes(default_quotes()).await);

            let keys = Arc::new(ApiKeyService::new(key_repository).with_generator(generator));
            let approvals = Arc::new(
                ApprovalService::new(request_repository, keys.clone(), notifier)
                    .with_auto_approve(config.keys.auto_approve),
            );
            let quotes = Arc::new(QuoteService::new(quote_repository));

            let keys: Arc<dyn ApiKeyServiceTrait> = keys;
            let approvals: Arc<dyn ApprovalServiceTrait> = approvals;
            let quotes: Arc<dyn QuoteServiceTrait> = quotes;
            (keys, approvals, quotes)
        }
    };

    if config.keys.auto_approve {
        info!("Auto-approval enabled: submitted key requests are approved immediately");
    }

    Ok(AppState::new(
        api_key_service,
        approval_service,
        quote_service,
        admin_secret,
    ))
}

fn create_notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    let api_key = config
        .email
        .api_key
        .clone()
        .or_else(|| std::env::var("EMAIL_API_KEY").ok());

    match api_key {
        Some(api_key) => {
            info!("Email notifications enabled");
            Arc::new(EmailNotifier::new(EmailConfig {
                endpoint: config.email.endpoint.clone(),
                api_key,
                from: config.email.from.clone(),
                admin_email: config.email.admin_email.clone(),
                base_url: config.email.base_url.clone(),
            }))
        }
        None => {
            warn!("No email credentials configured; notifications will only be logged");
            Arc::new(LogNotifier::new())
        }
    }
}

// ============================================================================
// Default Entities
// ============================================================================

fn default_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            QuoteId::generate(),
            "The only way to do great work is to love what you do.",
            "Steve Jobs",
        )
        .with_tags(vec!["work".to_string(), "passion".to_string()]),
        Quote::new(
            QuoteId::generate(),
            "Know thyself.",
            "Socrates",
        )
        .with_tags(vec!["wisdom".to_string()]),
        Quote::new(
            QuoteId::generate(),
            "Whether you think you can, or you think you can't - you're right.",
            "Henry Ford",
        )
        .with_tags(vec!["mindset".to_string()]),
        Quote::new(
            QuoteId::generate(),
            "It always seems impossible until it's done.",
            "Nelson Mandela",
        )
        .with_tags(vec!["perseverance".to_string()]),
        Quote::new(
            QuoteId::generate(),
            "The unexamined life is not worth living.",
            "Socrates",
        )
        .with_source("Apology")
        .with_tags(vec!["wisdom".to_string(), "philosophy".to_string()]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key_request::KeyRequestStatus;
    use crate::domain::quote::QuoteFilter;
    use crate::domain::DomainError;
    use crate::infrastructure::api_key::KeyUpdate;
    use crate::infrastructure::approval::NewKeyRequest;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.admin_secret = Some("test-admin-secret".to_string());
        config
    }

    #[tokio::test]
    async fn test_startup_requires_admin_secret() {
        let mut config = AppConfig::default();
        config.auth.admin_secret = Some("  ".to_string());

        assert!(create_app_state_with_config(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_backend_seeds_catalog() {
        let state = create_app_state_with_config(&test_config()).await.unwrap();

        let page = state
            .quote_service
            .list(&QuoteFilter::published(), 0, 50)
            .await
            .unwrap();
        assert!(!page.quotes.is_empty());
    }

    #[tokio::test]
    async fn test_request_approval_flow() {
        let state = create_app_state_with_config(&test_config()).await.unwrap();

        let submitted = state
            .approval_service
            .submit(NewKeyRequest {
                name: "Ada".to_string(),
                email: "ada@x.com".to_string(),
                usage: "testing".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(submitted.request.status(), KeyRequestStatus::Pending);

        let approval = state
            .approval_service
            .approve(submitted.request.id())
            .await
            .unwrap();
        assert_eq!(approval.request.status(), KeyRequestStatus::Approved);
        assert_eq!(approval.request.api_key_id(), Some(&approval.api_key_id));

        let key = state
            .api_key_service
            .get(&approval.api_key_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(key.name(), "Ada's Key");

        let err = state
            .approval_service
            .approve(submitted.request.id())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyApproved { .. }));
    }

    #[tokio::test]
    async fn test_issued_key_authenticates_until_deactivated() {
        let state = create_app_state_with_config(&test_config()).await.unwrap();

        let issued = state
            .api_key_service
            .create("Integration Key", None)
            .await
            .unwrap();

        let resolved = state
            .api_key_service
            .authenticate(&issued.secret)
            .await
            .unwrap()
            .unwrap();
        state.api_key_service.record_usage(resolved.id()).await.unwrap();

        let stored = state
            .api_key_service
            .get(issued.api_key.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.usage().count, 1);

        state
            .api_key_service
            .update(
                issued.api_key.id(),
                KeyUpdate {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(state
            .api_key_service
            .authenticate(&issued.secret)
            .await
            .unwrap()
            .is_none());
    }
}
