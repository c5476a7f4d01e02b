//! Key request approval workflow
//!
//! Drives a key request from submission to a terminal state. Issuance
//! happens before the status write; the status write is conditional; the
//! email goes out only after the status write commits.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::api_key::{ApiKeyId, ApiKeyRepository};
use crate::domain::key_request::{
    KeyRequest, KeyRequestId, KeyRequestRepository, KeyRequestStatus,
};
use crate::domain::notifier::{NotificationOutcome, Notifier};
use crate::domain::DomainError;
use crate::infrastructure::api_key::ApiKeyService;

/// A submission payload
#[derive(Debug, Clone)]
pub struct NewKeyRequest {
    pub name: String,
    pub email: String,
    pub usage: String,
}

/// Result of submitting a request
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub request: KeyRequest,
    pub notification: NotificationOutcome,
}

/// Result of an approval: the transition is definitive, the notification is
/// best-effort and reported separately
#[derive(Debug)]
pub struct ApprovalOutcome {
    pub request: KeyRequest,
    pub api_key_id: ApiKeyId,
    pub notification: NotificationOutcome,
}

/// Result of a rejection
#[derive(Debug)]
pub struct RejectionOutcome {
    pub request: KeyRequest,
    pub notification: NotificationOutcome,
}

/// Orchestrates request submission, approval, issuance, and notification
#[derive(Debug)]
pub struct ApprovalService<Q, K>
where
    Q: KeyRequestRepository,
    K: ApiKeyRepository,
{
    requests: Arc<Q>,
    keys: Arc<ApiKeyService<K>>,
    notifier: Arc<dyn Notifier>,
    auto_approve: bool,
}

impl<Q, K> ApprovalService<Q, K>
where
    Q: KeyRequestRepository,
    K: ApiKeyRepository,
{
    pub fn new(requests: Arc<Q>, keys: Arc<ApiKeyService<K>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            requests,
            keys,
            notifier,
            auto_approve: false,
        }
    }

    /// When set, every submission is approved immediately
    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    /// Submit a new key request
    ///
    /// With auto-approval on, the request is approved inline and the
    /// submission still succeeds even if that approval (or its email)
    /// fails; the caller gets the request in whatever state it reached.
    pub async fn submit(&self, submission: NewKeyRequest) -> Result<SubmissionOutcome, DomainError> {
        if submission.name.trim().is_empty()
            || submission.email.trim().is_empty()
            || submission.usage.trim().is_empty()
        {
            return Err(DomainError::validation(
                "Name, email, and usage description are required",
            ));
        }

        let request = KeyRequest::new(
            KeyRequestId::generate(),
            submission.name.trim(),
            submission.email.trim().to_lowercase(),
            submission.usage.trim(),
        );
        let request = self.requests.create(request).await?;
        info!(request_id = %request.id(), "Key request submitted");

        if self.auto_approve {
            return match self.approve(request.id()).await {
                Ok(outcome) => Ok(SubmissionOutcome {
                    request: outcome.request,
                    notification: outcome.notification,
                }),
                Err(e) => {
                    warn!(request_id = %request.id(), error = %e, "Auto-approval failed");
                    Ok(SubmissionOutcome {
                        request,
                        notification: NotificationOutcome::Skipped,
                    })
                }
            };
        }

        let notification = match self.notifier.request_received(&request).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                warn!(request_id = %request.id(), error = %e, "Admin notification failed");
                NotificationOutcome::Failed
            }
        };

        Ok(SubmissionOutcome {
            request,
            notification,
        })
    }

    /// List all requests, newest first
    pub async fn list(&self) -> Result<Vec<KeyRequest>, DomainError> {
        self.requests.list().await
    }

    /// Approve a pending request: issue a key, record the transition, then
    /// deliver the key by email
    pub async fn approve(&self, id: &KeyRequestId) -> Result<ApprovalOutcome, DomainError> {
        let request = self
            .requests
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Key request '{}' not found", id)))?;

        match request.status() {
            KeyRequestStatus::Approved => {
                return Err(DomainError::already_approved(id.as_str()));
            }
            KeyRequestStatus::Rejected => {
                return Err(DomainError::conflict(format!(
                    "Key request '{}' was rejected and cannot be approved",
                    id
                )));
            }
            KeyRequestStatus::Pending => {}
        }

        let issued = self
            .keys
            .create(
                &format!("{}'s Key", request.name()),
                Some(format!(
                    "Requested by {} for: {}",
                    request.email(),
                    request.usage()
                )),
            )
            .await?;
        let api_key_id = issued.api_key.id().clone();

        let request = match self.requests.mark_approved(id, &api_key_id).await {
            Ok(request) => request,
            Err(e @ (DomainError::AlreadyApproved { .. } | DomainError::Conflict { .. })) => {
                // Lost the race to a concurrent decision. Remove the key we
                // just issued so exactly one key exists per approval.
                if let Err(delete_err) = self.keys.delete(&api_key_id).await {
                    warn!(
                        key_id = %api_key_id,
                        error = %delete_err,
                        "Failed to clean up key after losing approval race"
                    );
                }
                return Err(e);
            }
            Err(e) => {
                // The key exists but the request is still pending. Surface
                // the inconsistency for an operator instead of retrying.
                error!(
                    request_id = %id,
                    key_id = %api_key_id,
                    error = %e,
                    "Approval status write failed after key issuance; orphaned key left behind"
                );
                return Err(e);
            }
        };

        info!(request_id = %id, key_id = %api_key_id, "Key request approved");

        let notification = match self
            .notifier
            .key_issued(request.email(), request.name(), &issued.secret)
            .await
        {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => {
                warn!(
                    request_id = %id,
                    key_id = %api_key_id,
                    error = %e,
                    "Key delivery email failed; approval stands"
                );
                NotificationOutcome::Failed
            }
        };

        Ok(ApprovalOutcome {
            request,
            api_key_id,
            notification,
        })
    }

    /// Reject a pending request
    ///
    /// Re-rejecting is an idempotent no-op (no second email); rejecting an
    /// approved request is a conflict.
    pub async fn reject(&self, id: &KeyRequestId) -> Result<RejectionOutcome, DomainError> {
        let (request, transitioned) = self.requests.mark_rejected(id).await?;

        let notification = if transitioned {
            info!(request_id = %id, "Key request rejected");
            match self
                .notifier
                .request_rejected(request.email(), request.name())
                .await
            {
                Ok(()) => NotificationOutcome::Sent,
                Err(e) => {
                    warn!(request_id = %id, error = %e, "Rejection email failed");
                    NotificationOutcome::Failed
                }
            }
        } else {
            NotificationOutcome::Skipped
        };

        Ok(RejectionOutcome {
            request,
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key_request::KeyRequestStatus;
    use crate::domain::notifier::mock::RecordingNotifier;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;
    use crate::infrastructure::key_request::InMemoryKeyRequestRepository;

    type TestService = ApprovalService<InMemoryKeyRequestRepository, InMemoryApiKeyRepository>;

    struct Fixture {
        service: Arc<TestService>,
        keys: Arc<ApiKeyService<InMemoryApiKeyRepository>>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture(auto_approve: bool) -> Fixture {
        let keys = Arc::new(ApiKeyService::new(Arc::new(InMemoryApiKeyRepository::new())));
        let notifier = Arc::new(RecordingNotifier::new());
        let service = Arc::new(
            ApprovalService::new(
                Arc::new(InMemoryKeyRequestRepository::new()),
                keys.clone(),
                notifier.clone(),
            )
            .with_auto_approve(auto_approve),
        );

        Fixture {
            service,
            keys,
            notifier,
        }
    }

    fn submission() -> NewKeyRequest {
        NewKeyRequest {
            name: "Ada".to_string(),
            email: "Ada@X.com".to_string(),
            usage: "testing".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_creates_pending_request() {
        let f = fixture(false);

        let outcome = f.service.submit(submission()).await.unwrap();

        assert_eq!(outcome.request.status(), KeyRequestStatus::Pending);
        assert_eq!(outcome.request.email(), "ada@x.com");
        assert!(outcome.request.api_key_id().is_none());
        // admin alert went out
        assert_eq!(f.notifier.sent_count().await, 1);
        assert_eq!(f.keys.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_fields() {
        let f = fixture(false);

        for broken in [
            NewKeyRequest {
                name: "".to_string(),
                ..submission()
            },
            NewKeyRequest {
                email: "  ".to_string(),
                ..submission()
            },
            NewKeyRequest {
                usage: "".to_string(),
                ..submission()
            },
        ] {
            let err = f.service.submit(broken).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation { .. }));
        }
    }

    #[tokio::test]
    async fn test_submit_with_auto_approve() {
        let f = fixture(true);

        let outcome = f.service.submit(submission()).await.unwrap();

        assert_eq!(outcome.request.status(), KeyRequestStatus::Approved);
        assert!(outcome.request.api_key_id().is_some());
        assert!(outcome.notification.was_sent());
        assert_eq!(f.keys.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_approve_issues_key_and_sends_email() {
        let f = fixture(false);
        let submitted = f.service.submit(submission()).await.unwrap();

        let outcome = f.service.approve(submitted.request.id()).await.unwrap();

        assert_eq!(outcome.request.status(), KeyRequestStatus::Approved);
        assert_eq!(outcome.request.api_key_id(), Some(&outcome.api_key_id));
        assert!(outcome.notification.was_sent());

        let key = f.keys.get(&outcome.api_key_id).await.unwrap().unwrap();
        assert_eq!(key.name(), "Ada's Key");
        assert!(key.description().unwrap().contains("ada@x.com"));

        let sent = f.notifier.sent.lock().await;
        assert!(sent.iter().any(|s| s.starts_with("key_issued:ada@x.com:qk_")));
    }

    #[tokio::test]
    async fn test_approve_missing_request() {
        let f = fixture(false);

        let err = f.service.approve(&KeyRequestId::generate()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_approve_twice_is_conflict_without_side_effects() {
        let f = fixture(false);
        let submitted = f.service.submit(submission()).await.unwrap();
        let emails_after_submit = f.notifier.sent_count().await;

        f.service.approve(submitted.request.id()).await.unwrap();
        let err = f.service.approve(submitted.request.id()).await.unwrap_err();

        assert!(matches!(err, DomainError::AlreadyApproved { .. }));
        // no second key, no second delivery email
        assert_eq!(f.keys.count().await.unwrap(), 1);
        assert_eq!(f.notifier.sent_count().await, emails_after_submit + 1);
    }

    #[tokio::test]
    async fn test_approve_rejected_request_conflicts() {
        let f = fixture(false);
        let submitted = f.service.submit(submission()).await.unwrap();

        f.service.reject(submitted.request.id()).await.unwrap();
        let err = f.service.approve(submitted.request.id()).await.unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
        assert_eq!(f.keys.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_approval_survives_email_failure() {
        let f = fixture(false);
        let submitted = f.service.submit(submission()).await.unwrap();

        f.notifier.set_should_fail(true).await;
        let outcome = f.service.approve(submitted.request.id()).await.unwrap();

        assert_eq!(outcome.request.status(), KeyRequestStatus::Approved);
        assert_eq!(outcome.notification, NotificationOutcome::Failed);
        // the key exists even though delivery failed
        assert_eq!(f.keys.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reject_sends_email_once() {
        let f = fixture(false);
        let submitted = f.service.submit(submission()).await.unwrap();
        let emails_after_submit = f.notifier.sent_count().await;

        let outcome = f.service.reject(submitted.request.id()).await.unwrap();
        assert_eq!(outcome.request.status(), KeyRequestStatus::Rejected);
        assert!(outcome.notification.was_sent());

        // idempotent second rejection, no second email
        let outcome = f.service.reject(submitted.request.id()).await.unwrap();
        assert_eq!(outcome.notification, NotificationOutcome::Skipped);
        assert_eq!(f.notifier.sent_count().await, emails_after_submit + 1);
    }

    #[tokio::test]
    async fn test_reject_approved_request_conflicts() {
        let f = fixture(false);
        let submitted = f.service.submit(submission()).await.unwrap();

        f.service.approve(submitted.request.id()).await.unwrap();
        let err = f.service.reject(submitted.request.id()).await.unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_approvals_create_one_key() {
        let f = fixture(false);
        let submitted = f.service.submit(submission()).await.unwrap();
        let request_id = submitted.request.id().clone();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = f.service.clone();
            let id = request_id.clone();
            handles.push(tokio::spawn(async move { service.approve(&id).await }));
        }

        let mut approvals = 0;
        let mut conflicts = 0;
        for result in futures::future::join_all(handles).await {
            match result.unwrap() {
                Ok(_) => approvals += 1,
                Err(DomainError::AlreadyApproved { .. }) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(approvals, 1);
        assert_eq!(conflicts, 3);
        // the losers cleaned up their keys
        assert_eq!(f.keys.count().await.unwrap(), 1);
    }
}
