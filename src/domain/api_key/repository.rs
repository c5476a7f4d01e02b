//! API key repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{ApiKey, ApiKeyId};
use crate::domain::DomainError;

/// Repository trait for API key storage
///
/// Implementations must enforce uniqueness of the secret digest and perform
/// `record_usage` as a single atomic update, so both hold under concurrent
/// requests without application-level coordination.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Get an API key by its ID
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Look up an active key by its secret digest
    ///
    /// Inactive and nonexistent keys are both `None`.
    async fn find_active_by_hash(&self, secret_hash: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Create a new API key; fails with `Conflict` on a duplicate digest
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    /// Update an existing API key
    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError>;

    /// Delete an API key; returns whether a record was removed
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// List all API keys, newest first
    async fn list(&self) -> Result<Vec<ApiKey>, DomainError>;

    /// Count API keys
    async fn count(&self) -> Result<usize, DomainError>;

    /// Increment the usage counter and stamp the last-used time
    async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError>;
}
