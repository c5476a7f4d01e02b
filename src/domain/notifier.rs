//! Outbound notification capability
//!
//! Email delivery is an external collaborator. The workflow calls it through
//! this trait strictly after the triggering state change has committed, and a
//! delivery failure never overturns that state change; callers record it as
//! a `NotificationOutcome` instead.

use std::fmt::Debug;

use async_trait::async_trait;

use super::key_request::KeyRequest;
use super::DomainError;

/// Best-effort result of a notification attempt, reported alongside the
/// definitive result of the state transition that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The notifier accepted the message
    Sent,
    /// Delivery failed; the transition stands, the failure is in the logs
    Failed,
    /// No notification was applicable (e.g. no admin address configured)
    Skipped,
}

impl NotificationOutcome {
    pub fn was_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Transactional email sender
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Deliver a freshly issued key to the requester
    async fn key_issued(
        &self,
        email: &str,
        name: &str,
        secret: &str,
    ) -> Result<(), DomainError>;

    /// Tell the requester their request was declined
    async fn request_rejected(&self, email: &str, name: &str) -> Result<(), DomainError>;

    /// Alert the operator that a new request is waiting for a decision
    async fn request_received(&self, request: &KeyRequest) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use super::*;

    /// Records every notification for assertions; can be told to fail
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Arc<Mutex<Vec<String>>>,
        pub should_fail: Arc<Mutex<bool>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set_should_fail(&self, fail: bool) {
            *self.should_fail.lock().await = fail;
        }

        pub async fn sent_count(&self) -> usize {
            self.sent.lock().await.len()
        }

        async fn record(&self, entry: String) -> Result<(), DomainError> {
            if *self.should_fail.lock().await {
                return Err(DomainError::notification("Recording notifier set to fail"));
            }
            self.sent.lock().await.push(entry);
            Ok(())
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn key_issued(
            &self,
            email: &str,
            _name: &str,
            secret: &str,
        ) -> Result<(), DomainError> {
            self.record(format!("key_issued:{}:{}", email, secret)).await
        }

        async fn request_rejected(&self, email: &str, _name: &str) -> Result<(), DomainError> {
            self.record(format!("request_rejected:{}", email)).await
        }

        async fn request_received(&self, request: &KeyRequest) -> Result<(), DomainError> {
            self.record(format!("request_received:{}", request.id())).await
        }
    }
}
