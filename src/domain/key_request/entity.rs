//! Key request entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;
use crate::domain::DomainError;

/// Key request identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyRequestId(String);

impl KeyRequestId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("Key request id cannot be empty"));
        }
        Ok(Self(id))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KeyRequestId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyRequestId> for String {
    fn from(id: KeyRequestId) -> Self {
        id.0
    }
}

impl std::fmt::Display for KeyRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a key request
///
/// A one-way machine: `Pending` may become `Approved` or `Rejected`, each at
/// most once; both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl KeyRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for KeyRequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::internal(format!(
                "Unknown key request status '{}'",
                other
            ))),
        }
    }
}

/// A submitted application for an API key, awaiting a decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRequest {
    id: KeyRequestId,
    /// Requester's display name
    name: String,
    /// Requester's email address
    email: String,
    /// Free-text justification for the request
    usage: String,
    status: KeyRequestStatus,
    /// Set exactly when the request is approved; weak reference to the key
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key_id: Option<ApiKeyId>,
    created_at: DateTime<Utc>,
}

impl KeyRequest {
    pub fn new(
        id: KeyRequestId,
        name: impl Into<String>,
        email: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            usage: usage.into(),
            status: KeyRequestStatus::Pending,
            api_key_id: None,
            created_at: Utc::now(),
        }
    }

    /// Rebuild a request from its stored representation
    pub fn from_storage(
        id: KeyRequestId,
        name: String,
        email: String,
        usage: String,
        status: KeyRequestStatus,
        api_key_id: Option<ApiKeyId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            usage,
            status,
            api_key_id,
            created_at,
        }
    }

    pub fn id(&self) -> &KeyRequestId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn status(&self) -> KeyRequestStatus {
        self.status
    }

    pub fn api_key_id(&self) -> Option<&ApiKeyId> {
        self.api_key_id.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == KeyRequestStatus::Pending
    }

    /// Transition `Pending -> Approved`, recording the issued key
    ///
    /// Fails if the request already reached a terminal state.
    pub fn mark_approved(&mut self, api_key_id: ApiKeyId) -> Result<(), DomainError> {
        match self.status {
            KeyRequestStatus::Pending => {
                self.status = KeyRequestStatus::Approved;
                self.api_key_id = Some(api_key_id);
                Ok(())
            }
            KeyRequestStatus::Approved => Err(DomainError::already_approved(self.id.as_str())),
            KeyRequestStatus::Rejected => Err(DomainError::conflict(format!(
                "Key request '{}' was rejected and cannot be approved",
                self.id
            ))),
        }
    }

    /// Transition `Pending -> Rejected`
    ///
    /// Rejecting an approved request is an error; re-rejecting is an error
    /// here and handled as an idempotent no-op one level up.
    pub fn mark_rejected(&mut self) -> Result<(), DomainError> {
        match self.status {
            KeyRequestStatus::Pending => {
                self.status = KeyRequestStatus::Rejected;
                Ok(())
            }
            KeyRequestStatus::Approved => Err(DomainError::conflict(format!(
                "Key request '{}' is approved and cannot be rejected",
                self.id
            ))),
            KeyRequestStatus::Rejected => Err(DomainError::conflict(format!(
                "Key request '{}' is already rejected",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_request() -> KeyRequest {
        KeyRequest::new(
            KeyRequestId::generate(),
            "Ada",
            "ada@example.com",
            "testing",
        )
    }

    #[test]
    fn test_new_request_is_pending() {
        let request = create_test_request();

        assert!(request.is_pending());
        assert!(request.api_key_id().is_none());
    }

    #[test]
    fn test_approve_records_key_id() {
        let mut request = create_test_request();
        let key_id = ApiKeyId::generate();

        request.mark_approved(key_id.clone()).unwrap();

        assert_eq!(request.status(), KeyRequestStatus::Approved);
        assert_eq!(request.api_key_id(), Some(&key_id));
    }

    #[test]
    fn test_approve_twice_fails() {
        let mut request = create_test_request();
        request.mark_approved(ApiKeyId::generate()).unwrap();

        let err = request.mark_approved(ApiKeyId::generate()).unwrap_err();
        assert!(matches!(err, DomainError::AlreadyApproved { .. }));
    }

    #[test]
    fn test_approve_after_reject_fails() {
        let mut request = create_test_request();
        request.mark_rejected().unwrap();

        let err = request.mark_approved(ApiKeyId::generate()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
        assert_eq!(request.status(), KeyRequestStatus::Rejected);
    }

    #[test]
    fn test_reject_after_approve_fails() {
        let mut request = create_test_request();
        request.mark_approved(ApiKeyId::generate()).unwrap();

        let err = request.mark_rejected().unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
        assert_eq!(request.status(), KeyRequestStatus::Approved);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            KeyRequestStatus::Pending,
            KeyRequestStatus::Approved,
            KeyRequestStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<KeyRequestStatus>().unwrap(), status);
        }
    }
}
