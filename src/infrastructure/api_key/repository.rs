//! In-memory API key repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

/// In-memory implementation of `ApiKeyRepository`
///
/// A single write lock covers every mutation, so digest uniqueness and the
/// usage increment hold under concurrent callers just as a unique index and
/// an atomic `UPDATE` do for the PostgreSQL backend.
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    keys: Arc<RwLock<HashMap<String, ApiKey>>>,
    hash_index: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(id.as_str()).cloned())
    }

    async fn find_active_by_hash(&self, secret_hash: &str) -> Result<Option<ApiKey>, DomainError> {
        let hash_index = self.hash_index.read().await;

        let Some(key_id) = hash_index.get(secret_hash) else {
            return Ok(None);
        };

        let keys = self.keys.read().await;
        Ok(keys.get(key_id).filter(|k| k.is_active()).cloned())
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;
        let mut hash_index = self.hash_index.write().await;

        let id = api_key.id().as_str().to_string();
        let hash = api_key.secret_hash().to_string();

        if keys.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "API key with ID '{}' already exists",
                id
            )));
        }

        if hash_index.contains_key(&hash) {
            return Err(DomainError::conflict(
                "API key with this secret already exists",
            ));
        }

        keys.insert(id.clone(), api_key.clone());
        hash_index.insert(hash, id);

        Ok(api_key)
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;

        match keys.get_mut(api_key.id().as_str()) {
            Some(stored) => {
                // Usage fields are owned by record_usage; copying only the
                // mutable metadata keeps a concurrent authentication from
                // being overwritten here.
                stored.set_name(api_key.name());
                stored.set_description(api_key.description().map(String::from));
                stored.set_active(api_key.is_active());
                Ok(stored.clone())
            }
            None => Err(DomainError::not_found(format!(
                "API key '{}' not found",
                api_key.id()
            ))),
        }
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let mut keys = self.keys.write().await;
        let mut hash_index = self.hash_index.write().await;

        if let Some(key) = keys.remove(id.as_str()) {
            hash_index.remove(key.secret_hash());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        let keys = self.keys.read().await;

        let mut result: Vec<ApiKey> = keys.values().cloned().collect();
        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(result)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.len())
    }

    async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError> {
        let mut keys = self.keys.write().await;

        match keys.get_mut(id.as_str()) {
            Some(key) => {
                key.record_usage();
                Ok(())
            }
            None => Err(DomainError::not_found(format!(
                "API key '{}' not found",
                id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api_key::KeyGenerator;

    fn create_test_key(name: &str) -> ApiKey {
        let generated = KeyGenerator::default().generate();
        ApiKey::new(ApiKeyId::generate(), name, generated.hash, generated.prefix)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("Test Key");

        repo.create(key.clone()).await.unwrap();

        let retrieved = repo.get(key.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.name(), "Test Key");
    }

    #[tokio::test]
    async fn test_duplicate_hash_conflicts() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("First");
        let clash = ApiKey::new(
            ApiKeyId::generate(),
            "Second",
            key.secret_hash(),
            key.key_prefix(),
        );

        repo.create(key).await.unwrap();

        let err = repo.create(clash).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_active_by_hash() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("Test Key");
        let hash = key.secret_hash().to_string();

        repo.create(key).await.unwrap();

        assert!(repo.find_active_by_hash(&hash).await.unwrap().is_some());
        assert!(repo
            .find_active_by_hash("sha256$nonexistent")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_inactive_key_is_invisible_to_auth_lookup() {
        let repo = InMemoryApiKeyRepository::new();
        let mut key = create_test_key("Test Key");
        let hash = key.secret_hash().to_string();

        repo.create(key.clone()).await.unwrap();

        key.set_active(false);
        repo.update(&key).await.unwrap();

        assert!(repo.find_active_by_hash(&hash).await.unwrap().is_none());
        // still retrievable by id for administration
        assert!(repo.get(key.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_record_usage_increments() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("Test Key");

        repo.create(key.clone()).await.unwrap();

        repo.record_usage(key.id()).await.unwrap();
        repo.record_usage(key.id()).await.unwrap();
        repo.record_usage(key.id()).await.unwrap();

        let retrieved = repo.get(key.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.usage().count, 3);
        assert!(retrieved.usage().last_used.is_some());
    }

    #[tokio::test]
    async fn test_record_usage_concurrent() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let key = create_test_key("Test Key");

        repo.create(key.clone()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let repo = repo.clone();
            let id = key.id().clone();
            handles.push(tokio::spawn(async move {
                repo.record_usage(&id).await.unwrap();
            }));
        }
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        let retrieved = repo.get(key.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.usage().count, 20);
    }

    #[tokio::test]
    async fn test_delete_frees_hash() {
        let repo = InMemoryApiKeyRepository::new();
        let key = create_test_key("Test Key");
        let hash = key.secret_hash().to_string();

        repo.create(key.clone()).await.unwrap();
        assert!(repo.delete(key.id()).await.unwrap());
        assert!(!repo.delete(key.id()).await.unwrap());

        assert!(repo.find_active_by_hash(&hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = InMemoryApiKeyRepository::new();

        repo.create(create_test_key("one")).await.unwrap();
        repo.create(create_test_key("two")).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at() >= listed[1].created_at());
    }
}
