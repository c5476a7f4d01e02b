//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::key_request::{KeyRequest, KeyRequestId, KeyRequestRepository};
use crate::domain::quote::{Quote, QuoteFilter, QuoteId, QuotePage, QuoteRepository};
use crate::domain::DomainError;
use crate::infrastructure::api_key::{ApiKeyService, IssuedKey, KeyUpdate};
use crate::infrastructure::approval::{
    ApprovalOutcome, ApprovalService, NewKeyRequest, RejectionOutcome, SubmissionOutcome,
};
use crate::infrastructure::quote::{CreateQuote, QuoteService, QuoteUpdate};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
    pub approval_service: Arc<dyn ApprovalServiceTrait>,
    pub quote_service: Arc<dyn QuoteServiceTrait>,
    /// Process-wide operator secret; read-only after startup
    pub admin_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        api_key_service: Arc<dyn ApiKeyServiceTrait>,
        approval_service: Arc<dyn ApprovalServiceTrait>,
        quote_service: Arc<dyn QuoteServiceTrait>,
        admin_secret: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            api_key_service,
            approval_service,
            quote_service,
            admin_secret: admin_secret.into(),
        }
    }
}

/// Trait for API key service operations
#[async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Option<ApiKey>, DomainError>;
    async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError>;
    async fn create(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<IssuedKey, DomainError>;
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;
    async fn list(&self) -> Result<Vec<ApiKey>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn update(&self, id: &ApiKeyId, update: KeyUpdate) -> Result<ApiKey, DomainError>;
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;
}

/// Trait for the key request workflow
#[async_trait]
pub trait ApprovalServiceTrait: Send + Sync {
    async fn submit(&self, submission: NewKeyRequest) -> Result<SubmissionOutcome, DomainError>;
    async fn list(&self) -> Result<Vec<KeyRequest>, DomainError>;
    async fn approve(&self, id: &KeyRequestId) -> Result<ApprovalOutcome, DomainError>;
    async fn reject(&self, id: &KeyRequestId) -> Result<RejectionOutcome, DomainError>;
}

/// Trait for quote catalog operations
#[async_trait]
pub trait QuoteServiceTrait: Send + Sync {
    async fn create(&self, payload: CreateQuote) -> Result<Quote, DomainError>;
    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError>;
    async fn get_published(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError>;
    async fn list(
        &self,
        filter: &QuoteFilter,
        offset: usize,
        limit: usize,
    ) -> Result<QuotePage, DomainError>;
    async fn random_published(&self) -> Result<Option<Quote>, DomainError>;
    async fn update(&self, id: &QuoteId, update: QuoteUpdate) -> Result<Quote, DomainError>;
    async fn delete(&self, id: &QuoteId) -> Result<bool, DomainError>;
    async fn distinct_tags(&self) -> Result<Vec<String>, DomainError>;
}

// Implement the traits for the actual services

#[async_trait]
impl<R: ApiKeyRepository> ApiKeyServiceTrait for ApiKeyService<R> {
    async fn authenticate(&self, token: &str) -> Result<Option<ApiKey>, DomainError> {
        ApiKeyService::authenticate(self, token).await
    }

    async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError> {
        ApiKeyService::record_usage(self, id).await
    }

    async fn create(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<IssuedKey, DomainError> {
        ApiKeyService::create(self, name, description).await
    }

    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        ApiKeyService::get(self, id).await
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        ApiKeyService::list(self).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        ApiKeyService::count(self).await
    }

    async fn update(&self, id: &ApiKeyId, update: KeyUpdate) -> Result<ApiKey, DomainError> {
        ApiKeyService::update(self, id, update).await
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        ApiKeyService::delete(self, id).await
    }
}

#[async_trait]
impl<Q, K> ApprovalServiceTrait for ApprovalService<Q, K>
where
    Q: KeyRequestRepository,
    K: ApiKeyRepository,
{
    async fn submit(&self, submission: NewKeyRequest) -> Result<SubmissionOutcome, DomainError> {
        ApprovalService::submit(self, submission).await
    }

    async fn list(&self) -> Result<Vec<KeyRequest>, DomainError> {
        ApprovalService::list(self).await
    }

    async fn approve(&self, id: &KeyRequestId) -> Result<ApprovalOutcome, DomainError> {
        ApprovalService::approve(self, id).await
    }

    async fn reject(&self, id: &KeyRequestId) -> Result<RejectionOutcome, DomainError> {
        ApprovalService::reject(self, id).await
    }
}

#[async_trait]
impl<R: QuoteRepository> QuoteServiceTrait for QuoteService<R> {
    async fn create(&self, payload: CreateQuote) -> Result<Quote, DomainError> {
        QuoteService::create(self, payload).await
    }

    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError> {
        QuoteService::get(self, id).await
    }

    async fn get_published(&self, id: &QuoteId) -> Result<Option<Quote>, DomainError> {
        QuoteService::get_published(self, id).await
    }

    async fn list(
        &self,
        filter: &QuoteFilter,
        offset: usize,
        limit: usize,
    ) -> Result<QuotePage, DomainError> {
        QuoteService::list(self, filter, offset, limit).await
    }

    async fn random_published(&self) -> Result<Option<Quote>, DomainError> {
        QuoteService::random_published(self).await
    }

    async fn update(&self, id: &QuoteId, update: QuoteUpdate) -> Result<Quote, DomainError> {
        QuoteService::update(self, id, update).await
    }

    async fn delete(&self, id: &QuoteId) -> Result<bool, DomainError> {
        QuoteService::delete(self, id).await
    }

    async fn distinct_tags(&self) -> Result<Vec<String>, DomainError> {
        QuoteService::distinct_tags(self).await
    }
}
