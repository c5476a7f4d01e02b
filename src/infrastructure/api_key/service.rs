//! API key service
//!
//! High-level key operations: issuance, authentication, usage recording,
//! and administrative updates.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

use super::generator::KeyGenerator;

/// Result of issuing a new API key
///
/// `secret` is the raw token. It exists only in this value and in the
/// response built from it; every later read of the key goes through the
/// stored digest.
#[derive(Debug)]
pub struct IssuedKey {
    pub api_key: ApiKey,
    pub secret: String,
}

/// Administrative update to a key's mutable metadata
#[derive(Debug, Clone, Default)]
pub struct KeyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Service for managing API keys
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
    generator: KeyGenerator,
}

impl<R: ApiKeyRepository> ApiKeyService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: KeyGenerator::default(),
        }
    }

    pub fn with_generator(mut self, generator: KeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Issue a new key
    ///
    /// A digest collision is vanishingly unlikely but surfaces as `Conflict`
    /// from the repository; since every token is freshly random, one retry
    /// with a new token is safe and sufficient.
    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<IssuedKey, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("Name is required for API key"));
        }

        let mut attempts = 0;
        loop {
            let generated = self.generator.generate();

            let mut api_key = ApiKey::new(
                ApiKeyId::generate(),
                name.trim(),
                &generated.hash,
                &generated.prefix,
            );
            if let Some(ref description) = description {
                api_key = api_key.with_description(description.clone());
            }

            match self.repository.create(api_key).await {
                Ok(created) => {
                    info!(key_id = %created.id(), name = %created.name(), "API key issued");
                    return Ok(IssuedKey {
                        api_key: created,
                        secret: generated.token,
                    });
                }
                Err(DomainError::Conflict { .. }) if attempts == 0 => {
                    debug!("Generated token collided, retrying with a fresh one");
                    attempts += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Resolve a presented token to an active key
    ///
    /// Nonexistent and inactive keys are indistinguishable: both are `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<ApiKey>, DomainError> {
        let hash = KeyGenerator::hash_token(token);
        self.repository.find_active_by_hash(&hash).await
    }

    /// Record one successful authentication
    pub async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError> {
        self.repository.record_usage(id).await
    }

    pub async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list().await
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Apply an administrative update
    pub async fn update(&self, id: &ApiKeyId, update: KeyUpdate) -> Result<ApiKey, DomainError> {
        let mut api_key = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("Name cannot be empty"));
            }
            api_key.set_name(name.trim());
        }
        if let Some(description) = update.description {
            api_key.set_description(Some(description));
        }
        if let Some(active) = update.active {
            api_key.set_active(active);
        }

        self.repository.update(&api_key).await
    }

    pub async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let deleted = self.repository.delete(id).await?;
        if deleted {
            info!(key_id = %id, "API key deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;

    fn create_service() -> ApiKeyService<InMemoryApiKeyRepository> {
        ApiKeyService::new(Arc::new(InMemoryApiKeyRepository::new()))
    }

    #[tokio::test]
    async fn test_create_returns_secret_once() {
        let service = create_service();

        let issued = service.create("Test Key", None).await.unwrap();

        assert!(issued.secret.starts_with("qk_"));
        assert_eq!(issued.api_key.usage().count, 0);
        assert!(issued.api_key.is_active());
        // the entity carries only the digest
        assert_ne!(issued.api_key.secret_hash(), issued.secret);
        assert!(issued.secret.starts_with(issued.api_key.key_prefix()));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let service = create_service();

        let err = service.create("   ", None).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_round_trip() {
        let service = create_service();
        let issued = service.create("Test Key", None).await.unwrap();

        let resolved = service.authenticate(&issued.secret).await.unwrap().unwrap();
        assert_eq!(resolved.id(), issued.api_key.id());

        assert!(service.authenticate("qk_bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivated_key_fails_like_missing_key() {
        let service = create_service();
        let issued = service.create("Test Key", None).await.unwrap();

        let update = KeyUpdate {
            active: Some(false),
            ..Default::default()
        };
        service.update(issued.api_key.id(), update).await.unwrap();

        assert!(service.authenticate(&issued.secret).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_usage_accounting() {
        let service = create_service();
        let issued = service.create("Test Key", None).await.unwrap();

        for _ in 0..5 {
            let key = service.authenticate(&issued.secret).await.unwrap().unwrap();
            service.record_usage(key.id()).await.unwrap();
        }

        let stored = service.get(issued.api_key.id()).await.unwrap().unwrap();
        assert_eq!(stored.usage().count, 5);
        assert!(stored.usage().last_used.is_some());
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let service = create_service();
        let issued = service.create("Old Name", None).await.unwrap();

        let update = KeyUpdate {
            name: Some("New Name".to_string()),
            description: Some("for the docs team".to_string()),
            active: None,
        };
        let updated = service.update(issued.api_key.id(), update).await.unwrap();

        assert_eq!(updated.name(), "New Name");
        assert_eq!(updated.description(), Some("for the docs team"));
        assert!(updated.is_active());
    }

    #[tokio::test]
    async fn test_update_missing_key() {
        let service = create_service();

        let err = service
            .update(&ApiKeyId::generate(), KeyUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = create_service();
        let issued = service.create("Test Key", None).await.unwrap();

        assert!(service.delete(issued.api_key.id()).await.unwrap());
        assert!(!service.delete(issued.api_key.id()).await.unwrap());
        assert!(service.authenticate(&issued.secret).await.unwrap().is_none());
    }
}
