//! In-memory key request repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::api_key::ApiKeyId;
use crate::domain::key_request::{
    KeyRequest, KeyRequestId, KeyRequestRepository, KeyRequestStatus,
};
use crate::domain::DomainError;

/// In-memory implementation of `KeyRequestRepository`
///
/// The decision transitions run under the write lock, which gives them the
/// same single-winner guarantee as the conditional `UPDATE` in the
/// PostgreSQL backend.
#[derive(Debug, Default)]
pub struct InMemoryKeyRequestRepository {
    requests: Arc<RwLock<HashMap<String, KeyRequest>>>,
}

impl InMemoryKeyRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyRequestRepository for InMemoryKeyRequestRepository {
    async fn create(&self, request: KeyRequest) -> Result<KeyRequest, DomainError> {
        let mut requests = self.requests.write().await;
        let id = request.id().as_str().to_string();

        if requests.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "Key request with ID '{}' already exists",
                id
            )));
        }

        requests.insert(id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: &KeyRequestId) -> Result<Option<KeyRequest>, DomainError> {
        let requests = self.requests.read().await;
        Ok(requests.get(id.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<KeyRequest>, DomainError> {
        let requests = self.requests.read().await;

        let mut result: Vec<KeyRequest> = requests.values().cloned().collect();
        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(result)
    }

    async fn mark_approved(
        &self,
        id: &KeyRequestId,
        api_key_id: &ApiKeyId,
    ) -> Result<KeyRequest, DomainError> {
        let mut requests = self.requests.write().await;

        let request = requests.get_mut(id.as_str()).ok_or_else(|| {
            DomainError::not_found(format!("Key request '{}' not found", id))
        })?;

        request.mark_approved(api_key_id.clone())?;
        Ok(request.clone())
    }

    async fn mark_rejected(
        &self,
        id: &KeyRequestId,
    ) -> Result<(KeyRequest, bool), DomainError> {
        let mut requests = self.requests.write().await;

        let request = requests.get_mut(id.as_str()).ok_or_else(|| {
            DomainError::not_found(format!("Key request '{}' not found", id))
        })?;

        match request.status() {
            KeyRequestStatus::Rejected => Ok((request.clone(), false)),
            _ => {
                request.mark_rejected()?;
                Ok((request.clone(), true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_request(name: &str) -> KeyRequest {
        KeyRequest::new(
            KeyRequestId::generate(),
            name,
            format!("{}@example.com", name.to_lowercase()),
            "testing",
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryKeyRequestRepository::new();
        let request = create_test_request("Ada");

        repo.create(request.clone()).await.unwrap();

        let retrieved = repo.get(request.id()).await.unwrap().unwrap();
        assert_eq!(retrieved.name(), "Ada");
        assert!(retrieved.is_pending());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = InMemoryKeyRequestRepository::new();

        repo.create(create_test_request("First")).await.unwrap();
        repo.create(create_test_request("Second")).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at() >= listed[1].created_at());
    }

    #[tokio::test]
    async fn test_mark_approved_exactly_once() {
        let repo = InMemoryKeyRequestRepository::new();
        let request = create_test_request("Ada");
        let key_id = ApiKeyId::generate();

        repo.create(request.clone()).await.unwrap();

        let approved = repo.mark_approved(request.id(), &key_id).await.unwrap();
        assert_eq!(approved.status(), KeyRequestStatus::Approved);
        assert_eq!(approved.api_key_id(), Some(&key_id));

        let err = repo
            .mark_approved(request.id(), &ApiKeyId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyApproved { .. }));

        // the winning key id stands
        let stored = repo.get(request.id()).await.unwrap().unwrap();
        assert_eq!(stored.api_key_id(), Some(&key_id));
    }

    #[tokio::test]
    async fn test_mark_approved_missing() {
        let repo = InMemoryKeyRequestRepository::new();

        let err = repo
            .mark_approved(&KeyRequestId::generate(), &ApiKeyId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_mark_rejected_idempotent() {
        let repo = InMemoryKeyRequestRepository::new();
        let request = create_test_request("Ada");

        repo.create(request.clone()).await.unwrap();

        let (rejected, transitioned) = repo.mark_rejected(request.id()).await.unwrap();
        assert_eq!(rejected.status(), KeyRequestStatus::Rejected);
        assert!(transitioned);

        let (rejected, transitioned) = repo.mark_rejected(request.id()).await.unwrap();
        assert_eq!(rejected.status(), KeyRequestStatus::Rejected);
        assert!(!transitioned);
    }

    #[tokio::test]
    async fn test_reject_approved_request_conflicts() {
        let repo = InMemoryKeyRequestRepository::new();
        let request = create_test_request("Ada");

        repo.create(request.clone()).await.unwrap();
        repo.mark_approved(request.id(), &ApiKeyId::generate())
            .await
            .unwrap();

        let err = repo.mark_rejected(request.id()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_approvals_single_winner() {
        let repo = Arc::new(InMemoryKeyRequestRepository::new());
        let request = create_test_request("Ada");
        repo.create(request.clone()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            let id = request.id().clone();
            handles.push(tokio::spawn(async move {
                repo.mark_approved(&id, &ApiKeyId::generate()).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
